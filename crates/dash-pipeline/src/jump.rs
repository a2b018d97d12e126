use crate::error::PipelineError;

/// A seek schedule expressed in seconds of playback time, e.g.
/// `"40->10,90->120"`: at `at_seconds` of playback, jump to `to_seconds`.
/// Entries are consulted in order; once one fires it is never revisited.
#[derive(Debug, Clone, Default)]
pub struct JumpScenario {
    entries: Vec<(f64, f64)>,
}

impl JumpScenario {
    pub fn entries(&self) -> &[(f64, f64)] {
        &self.entries
    }

    /// Parse `"a->b,c->d,..."`. Entries must already be ordered by
    /// `at_seconds`, matching the CLI contract (the pipeline driver walks
    /// them with a single forward cursor).
    pub fn parse(spec: &str) -> Result<Self, PipelineError> {
        let mut entries = Vec::new();
        let mut previous_at = f64::NEG_INFINITY;

        for raw in spec.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let (at, to) = raw.split_once("->").ok_or_else(|| PipelineError::InvalidJumpScenario {
                input: spec.to_string(),
                reason: format!("entry `{raw}` is missing `->`"),
            })?;
            let at_seconds: f64 = at.trim().parse().map_err(|_| PipelineError::InvalidJumpScenario {
                input: spec.to_string(),
                reason: format!("`{at}` is not a number of seconds"),
            })?;
            let to_seconds: f64 = to.trim().parse().map_err(|_| PipelineError::InvalidJumpScenario {
                input: spec.to_string(),
                reason: format!("`{to}` is not a number of seconds"),
            })?;
            if at_seconds < previous_at {
                return Err(PipelineError::InvalidJumpScenario {
                    input: spec.to_string(),
                    reason: "entries must be ordered by at_seconds".to_string(),
                });
            }
            previous_at = at_seconds;
            entries.push((at_seconds, to_seconds));
        }

        Ok(JumpScenario { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ordered_entries() {
        let scenario = JumpScenario::parse("40->10,80->120").unwrap();
        assert_eq!(scenario.entries(), &[(40.0, 10.0), (80.0, 120.0)]);
    }

    #[test]
    fn rejects_out_of_order_entries() {
        let err = JumpScenario::parse("80->120,40->10").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidJumpScenario { .. }));
    }

    #[test]
    fn rejects_malformed_entry() {
        let err = JumpScenario::parse("40-10").unwrap_err();
        assert!(matches!(err, PipelineError::InvalidJumpScenario { .. }));
    }
}
