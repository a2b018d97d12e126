use std::cmp::Ordering;
use std::path::Path;

use serde::Serialize;

use crate::error::PipelineError;

/// One fetched segment's outcome, as persisted in the run report.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentRecord {
    pub segment_number: u64,
    pub url_basename: String,
    pub bitrate: u64,
    pub bytes: u64,
    pub download_seconds: f64,
}

/// Per-run JSON report: per-segment records plus cumulative shift
/// counters, saved after every segment so a killed run still leaves a
/// readable partial report behind.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub segments: Vec<SegmentRecord>,
    pub up_shifts: u64,
    pub down_shifts: u64,
    #[serde(skip)]
    previous_bitrate: Option<u64>,
}

impl RunReport {
    pub fn new() -> Self {
        RunReport {
            generated_at: chrono::Utc::now(),
            segments: Vec::new(),
            up_shifts: 0,
            down_shifts: 0,
            previous_bitrate: None,
        }
    }

    /// Append a record and update the shift counters by comparing its
    /// bitrate to the previously recorded one.
    pub fn record(&mut self, record: SegmentRecord) {
        if let Some(previous) = self.previous_bitrate {
            match record.bitrate.cmp(&previous) {
                Ordering::Greater => self.up_shifts += 1,
                Ordering::Less => self.down_shifts += 1,
                Ordering::Equal => {}
            }
        }
        self.previous_bitrate = Some(record.bitrate);
        self.segments.push(record);
    }

    pub fn save(&self, path: &Path) -> Result<(), PipelineError> {
        let json = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, json).map_err(|source| PipelineError::ReportWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(bitrate: u64) -> SegmentRecord {
        SegmentRecord {
            segment_number: 1,
            url_basename: "seg.m4s".to_string(),
            bitrate,
            bytes: 1000,
            download_seconds: 1.0,
        }
    }

    #[test]
    fn shift_counters_track_strict_changes_only() {
        let mut report = RunReport::new();
        report.record(record(500_000));
        report.record(record(1_000_000)); // up
        report.record(record(1_000_000)); // flat
        report.record(record(500_000)); // down
        report.record(record(200_000)); // down

        assert_eq!(report.up_shifts, 1);
        assert_eq!(report.down_shifts, 2);
        assert_eq!(report.segments.len(), 5);
    }

    #[test]
    fn save_writes_valid_json() {
        let mut report = RunReport::new();
        report.record(record(500_000));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.save(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed["up_shifts"], 0);
        assert_eq!(parsed["segments"][0]["bitrate"], 500_000);
    }
}
