use crate::constants::{
    NETFLIX_BUFFER_SIZE, NETFLIX_HYSTERESIS_MARGIN, NETFLIX_INITIAL_SAFETY_FACTOR,
    NETFLIX_LOW_WATERMARK_SECONDS,
};
use crate::context::DecisionContext;
use crate::decision::Decision;
use crate::policy::AdaptationPolicy;
use crate::util::index_of;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Initial,
    Steady,
}

/// Buffer-occupancy policy: starts in INITIAL, stepping up one bitrate
/// rung at a time as long as the last measured download rate comfortably
/// clears the next rung's requirement. Once occupancy reaches the low
/// watermark it hands off to STEADY, which maps buffer occupancy onto a
/// bitrate staircase built from the representation's average segment
/// sizes, shifting at most one rung per decision and requiring a rung
/// boundary be cleared by a hysteresis margin before it moves again.
pub struct NetflixPolicy {
    current_bitrate: u64,
    jump_grace: u32,
    mode: Mode,
    last_download: Option<(u64, f64)>,
    low_watermark_seconds: f64,
    /// (minimum occupancy in segments, bitrate) pairs, ascending.
    rate_map: Option<Vec<(usize, u64)>>,
}

impl NetflixPolicy {
    pub fn new(lowest_bitrate: u64) -> Self {
        NetflixPolicy {
            current_bitrate: lowest_bitrate,
            jump_grace: 0,
            mode: Mode::Initial,
            last_download: None,
            low_watermark_seconds: NETFLIX_LOW_WATERMARK_SECONDS,
            rate_map: None,
        }
    }

    fn rate_map(&mut self, ctx: &DecisionContext<'_>) -> &[(usize, u64)] {
        self.rate_map.get_or_insert_with(|| {
            let low = (self.low_watermark_seconds / ctx.segment_duration).ceil() as usize;
            let span = NETFLIX_BUFFER_SIZE.saturating_sub(low).max(1);
            let rungs = ctx.bitrates_sorted_asc.len().max(1);
            ctx.bitrates_sorted_asc
                .iter()
                .enumerate()
                .map(|(i, &bitrate)| (low + (span * i) / rungs, bitrate))
                .collect()
        })
    }

    fn decide_initial(&mut self, ctx: &DecisionContext<'_>) -> u64 {
        let current_index = index_of(ctx.bitrates_sorted_asc, self.current_bitrate);
        let next_index = current_index + 1;

        let stepped_up = if let (Some((bytes, seconds)), Some(&next_bitrate)) =
            (self.last_download, ctx.bitrates_sorted_asc.get(next_index))
        {
            if seconds > 0.0 {
                let measured_bps = bytes as f64 * 8.0 / seconds;
                let avg_size = ctx.average_segment_sizes.get(&next_bitrate).copied().unwrap_or(0);
                let required_bps = avg_size as f64 * 8.0 / ctx.segment_duration;
                measured_bps > required_bps * NETFLIX_INITIAL_SAFETY_FACTOR
            } else {
                false
            }
        } else {
            false
        };

        if stepped_up {
            ctx.bitrates_sorted_asc[next_index]
        } else {
            self.current_bitrate
        }
    }

    fn decide_steady(&mut self, ctx: &DecisionContext<'_>) -> u64 {
        let bitrates = ctx.bitrates_sorted_asc;
        let rate_map = self.rate_map(ctx).to_vec();
        if rate_map.is_empty() {
            return self.current_bitrate;
        }

        let current_index = index_of(bitrates, self.current_bitrate);
        let target_index = rate_map
            .iter()
            .rposition(|&(threshold, _)| ctx.qsize >= threshold)
            .unwrap_or(0);

        let next_index = if target_index > current_index && current_index + 1 < rate_map.len() {
            let up_threshold = rate_map[current_index + 1].0 as isize;
            if ctx.qsize as isize >= up_threshold + NETFLIX_HYSTERESIS_MARGIN {
                current_index + 1
            } else {
                current_index
            }
        } else if target_index < current_index {
            let down_threshold = rate_map[current_index].0 as isize;
            if ctx.qsize as isize <= down_threshold - NETFLIX_HYSTERESIS_MARGIN {
                current_index.saturating_sub(1)
            } else {
                current_index
            }
        } else {
            current_index
        };

        bitrates.get(next_index).copied().unwrap_or(self.current_bitrate)
    }
}

impl AdaptationPolicy for NetflixPolicy {
    fn decide_raw(&mut self, ctx: &DecisionContext<'_>) -> Decision {
        let low_watermark_segments = (self.low_watermark_seconds / ctx.segment_duration).ceil() as usize;
        if self.mode == Mode::Initial && ctx.qsize >= low_watermark_segments {
            self.mode = Mode::Steady;
        }

        let next_bitrate = match self.mode {
            Mode::Initial => self.decide_initial(ctx),
            Mode::Steady => self.decide_steady(ctx),
        };

        let delay_segments = if ctx.qsize >= NETFLIX_BUFFER_SIZE {
            (ctx.qsize - NETFLIX_BUFFER_SIZE + 1) as f64
        } else {
            0.0
        };

        Decision {
            next_bitrate,
            delay_segments,
        }
    }

    fn current_bitrate(&self) -> u64 {
        self.current_bitrate
    }

    fn set_current_bitrate(&mut self, bitrate: u64) {
        self.current_bitrate = bitrate;
    }

    fn jump_grace(&self) -> u32 {
        self.jump_grace
    }

    fn set_jump_grace(&mut self, value: u32) {
        self.jump_grace = value;
    }

    fn record_download(&mut self, bytes: u64, seconds: f64) {
        self.last_download = Some((bytes, seconds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn avg_sizes(bitrates: &[u64], segment_duration: f64) -> BTreeMap<u64, u64> {
        bitrates
            .iter()
            .map(|&b| (b, (b as f64 * segment_duration / 8.0) as u64))
            .collect()
    }

    fn ctx<'a>(
        segment_number: u64,
        qsize: usize,
        bitrates: &'a [u64],
        sizes: &'a BTreeMap<u64, u64>,
        segment_duration: f64,
    ) -> DecisionContext<'a> {
        DecisionContext {
            segment_number,
            index_start: 0,
            bitrates_sorted_asc: bitrates,
            qsize,
            segment_duration,
            next_segment_sizes: sizes,
            average_segment_sizes: sizes,
        }
    }

    #[test]
    fn starts_initial_and_steps_up_on_strong_throughput() {
        let bitrates = [200_000, 500_000, 1_000_000];
        let segment_duration = 2.0;
        let sizes = avg_sizes(&bitrates, segment_duration);
        let mut policy = NetflixPolicy::new(200_000);
        policy.decide(&ctx(0, 0, &bitrates, &sizes, segment_duration));
        policy.decide(&ctx(1, 0, &bitrates, &sizes, segment_duration));

        // Comfortably exceeds what 500 kbps would require.
        policy.record_download((2_000_000.0 * segment_duration / 8.0) as u64, segment_duration);
        let decision = policy.decide(&ctx(2, 1, &bitrates, &sizes, segment_duration));
        assert_eq!(decision.next_bitrate, 500_000);
    }

    #[test]
    fn transitions_to_steady_once_low_watermark_reached() {
        let bitrates = [200_000, 500_000, 1_000_000];
        let segment_duration = 2.0;
        let sizes = avg_sizes(&bitrates, segment_duration);
        let mut policy = NetflixPolicy::new(200_000);
        policy.decide(&ctx(0, 0, &bitrates, &sizes, segment_duration));
        policy.decide(&ctx(1, 0, &bitrates, &sizes, segment_duration));

        let low_watermark_segments =
            (NETFLIX_LOW_WATERMARK_SECONDS / segment_duration).ceil() as usize;
        policy.decide(&ctx(2, low_watermark_segments, &bitrates, &sizes, segment_duration));
        assert_eq!(policy.mode, Mode::Steady);
    }

    #[test]
    fn steady_staircase_moves_at_most_one_rung_per_decision() {
        let bitrates = [200_000, 500_000, 1_000_000, 2_000_000];
        let segment_duration = 2.0;
        let sizes = avg_sizes(&bitrates, segment_duration);
        let mut policy = NetflixPolicy::new(200_000);
        policy.decide(&ctx(0, 0, &bitrates, &sizes, segment_duration));
        policy.decide(&ctx(1, 0, &bitrates, &sizes, segment_duration));
        policy.mode = Mode::Steady;
        policy.set_current_bitrate(200_000);

        let decision = policy.decide(&ctx(2, NETFLIX_BUFFER_SIZE, &bitrates, &sizes, segment_duration));
        let ladder_index_before = index_of(&bitrates, 200_000);
        let ladder_index_after = index_of(&bitrates, decision.next_bitrate);
        assert!(ladder_index_after <= ladder_index_before + 1);
    }

    #[test]
    fn delay_requested_once_buffer_exceeds_ceiling() {
        let bitrates = [200_000];
        let segment_duration = 2.0;
        let sizes = avg_sizes(&bitrates, segment_duration);
        let mut policy = NetflixPolicy::new(200_000);
        policy.decide(&ctx(0, 0, &bitrates, &sizes, segment_duration));
        policy.decide(&ctx(1, 0, &bitrates, &sizes, segment_duration));
        let decision = policy.decide(&ctx(2, NETFLIX_BUFFER_SIZE + 2, &bitrates, &sizes, segment_duration));
        assert_eq!(decision.delay_segments, 3.0);
    }
}
