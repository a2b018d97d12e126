use std::collections::VecDeque;

use crate::constants::{SARA_BUFFER_THRESHOLD, SARA_SAFETY_FLOOR_SECONDS, SARA_SAMPLE_COUNT};
use crate::context::DecisionContext;
use crate::decision::Decision;
use crate::policy::AdaptationPolicy;

/// Segment-size-aware policy: estimates throughput as the weighted
/// harmonic mean of recent segment download rates (weighted by segment
/// size, so a handful of tiny segments can't swing the estimate), then
/// walks the bitrate ladder picking the highest rung whose *predicted*
/// download time for the specific upcoming segment still leaves the
/// buffer above a safety floor.
pub struct SaraPolicy {
    current_bitrate: u64,
    jump_grace: u32,
    window: VecDeque<(u64, f64)>,
}

impl SaraPolicy {
    pub fn new(lowest_bitrate: u64) -> Self {
        SaraPolicy {
            current_bitrate: lowest_bitrate,
            jump_grace: 0,
            window: VecDeque::with_capacity(SARA_SAMPLE_COUNT),
        }
    }

    fn weighted_harmonic_mean_bps(&self) -> Option<f64> {
        let mut weight_sum = 0.0;
        let mut weighted_inverse_sum = 0.0;
        for &(bytes, seconds) in &self.window {
            if seconds <= 0.0 || bytes == 0 {
                continue;
            }
            let rate_bps = bytes as f64 * 8.0 / seconds;
            let weight = bytes as f64;
            weight_sum += weight;
            weighted_inverse_sum += weight / rate_bps;
        }
        if weighted_inverse_sum > 0.0 {
            Some(weight_sum / weighted_inverse_sum)
        } else {
            None
        }
    }
}

impl AdaptationPolicy for SaraPolicy {
    fn decide_raw(&mut self, ctx: &DecisionContext<'_>) -> Decision {
        let lowest = ctx.bitrates_sorted_asc.first().copied().unwrap_or(self.current_bitrate);
        let throughput_bps = self.weighted_harmonic_mean_bps();

        let buffer_seconds = ctx.qsize as f64 * ctx.segment_duration;
        let mut next_bitrate = lowest;

        for &candidate in ctx.bitrates_sorted_asc {
            let size = match ctx.next_segment_sizes.get(&candidate) {
                Some(&size) => size,
                None => continue,
            };
            let predicted_seconds = match throughput_bps {
                Some(bps) if bps > 0.0 => size as f64 * 8.0 / bps,
                _ => f64::INFINITY,
            };
            let drain_during_download = (predicted_seconds - ctx.segment_duration).max(0.0);
            let projected_buffer = buffer_seconds - drain_during_download;
            if projected_buffer >= SARA_SAFETY_FLOOR_SECONDS {
                next_bitrate = candidate;
            } else {
                break;
            }
        }

        let delay_segments = ctx.qsize.saturating_sub(SARA_BUFFER_THRESHOLD) as f64;

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
        if self.window.len() == SARA_SAMPLE_COUNT {
            self.window.pop_front();
        }
        self.window.push_back((bytes, seconds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sizes_for(bitrates: &[u64], segment_duration: f64) -> BTreeMap<u64, u64> {
        bitrates
            .iter()
            .map(|&b| (b, (b as f64 * segment_duration / 8.0) as u64))
            .collect()
    }

    #[test]
    fn picks_highest_bitrate_that_clears_safety_floor() {
        let bitrates = [200_000, 500_000, 1_000_000, 2_000_000];
        let segment_duration = 2.0;
        let sizes = sizes_for(&bitrates, segment_duration);
        let mut policy = SaraPolicy::new(200_000);
        policy.decide(&DecisionContext {
            segment_number: 0,
            index_start: 0,
            bitrates_sorted_asc: &bitrates,
            qsize: 0,
            segment_duration,
            next_segment_sizes: &sizes,
            average_segment_sizes: &sizes,
        });
        policy.decide(&DecisionContext {
            segment_number: 1,
            index_start: 0,
            bitrates_sorted_asc: &bitrates,
            qsize: 0,
            segment_duration,
            next_segment_sizes: &sizes,
            average_segment_sizes: &sizes,
        });

        for _ in 0..SARA_SAMPLE_COUNT {
            policy.record_download(2_000_000 / 8, 1.0); // plenty of headroom
        }
        let decision = policy.decide(&DecisionContext {
            segment_number: 2,
            index_start: 0,
            bitrates_sorted_asc: &bitrates,
            qsize: 8, // well above the safety floor in segments
            segment_duration,
            next_segment_sizes: &sizes,
            average_segment_sizes: &sizes,
        });
        assert_eq!(decision.next_bitrate, 2_000_000);
    }

    #[test]
    fn thin_buffer_forces_lower_bitrate_even_with_good_throughput() {
        let bitrates = [200_000, 500_000, 1_000_000, 2_000_000];
        let segment_duration = 2.0;
        let sizes = sizes_for(&bitrates, segment_duration);
        let mut policy = SaraPolicy::new(200_000);
        policy.decide(&DecisionContext {
            segment_number: 0,
            index_start: 0,
            bitrates_sorted_asc: &bitrates,
            qsize: 0,
            segment_duration,
            next_segment_sizes: &sizes,
            average_segment_sizes: &sizes,
        });
        policy.decide(&DecisionContext {
            segment_number: 1,
            index_start: 0,
            bitrates_sorted_asc: &bitrates,
            qsize: 0,
            segment_duration,
            next_segment_sizes: &sizes,
            average_segment_sizes: &sizes,
        });
        for _ in 0..SARA_SAMPLE_COUNT {
            policy.record_download(2_000_000 / 8, 1.0);
        }
        let decision = policy.decide(&DecisionContext {
            segment_number: 2,
            index_start: 0,
            bitrates_sorted_asc: &bitrates,
            qsize: 1, // barely any buffer
            segment_duration,
            next_segment_sizes: &sizes,
            average_segment_sizes: &sizes,
        });
        assert_eq!(decision.next_bitrate, 200_000);
    }
}
