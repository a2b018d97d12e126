use std::collections::VecDeque;

use crate::constants::{BASIC_THRESHOLD, BASIC_WINDOW};
use crate::context::DecisionContext;
use crate::decision::Decision;
use crate::policy::AdaptationPolicy;
use crate::util::pick_at_or_below;

/// Throughput-reactive policy: picks the highest bitrate that fits inside
/// a running average of recent segment download rates, and asks for a
/// delay once the buffer grows past a fixed threshold.
pub struct BasicPolicy {
    current_bitrate: u64,
    jump_grace: u32,
    recent: VecDeque<(u64, f64)>,
}

impl BasicPolicy {
    pub fn new(lowest_bitrate: u64) -> Self {
        BasicPolicy {
            current_bitrate: lowest_bitrate,
            jump_grace: 0,
            recent: VecDeque::with_capacity(BASIC_WINDOW),
        }
    }

    fn average_throughput_bps(&self) -> Option<f64> {
        if self.recent.is_empty() {
            return None;
        }
        let (bytes_sum, seconds_sum) = self
            .recent
            .iter()
            .fold((0u64, 0.0f64), |(b, s), &(bytes, seconds)| (b + bytes, s + seconds));
        if seconds_sum <= 0.0 {
            None
        } else {
            Some(bytes_sum as f64 * 8.0 / seconds_sum)
        }
    }
}

impl AdaptationPolicy for BasicPolicy {
    fn decide_raw(&mut self, ctx: &DecisionContext<'_>) -> Decision {
        let next_bitrate = self
            .average_throughput_bps()
            .and_then(|bps| pick_at_or_below(ctx.bitrates_sorted_asc, bps))
            .unwrap_or(self.current_bitrate);

        let delay_segments = ctx.qsize.saturating_sub(BASIC_THRESHOLD) as f64;

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
        if self.recent.len() == BASIC_WINDOW {
            self.recent.pop_front();
        }
        self.recent.push_back((bytes, seconds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn ctx<'a>(
        segment_number: u64,
        qsize: usize,
        bitrates: &'a [u64],
        sizes: &'a BTreeMap<u64, u64>,
    ) -> DecisionContext<'a> {
        DecisionContext {
            segment_number,
            index_start: 0,
            bitrates_sorted_asc: bitrates,
            qsize,
            segment_duration: 2.0,
            next_segment_sizes: sizes,
            average_segment_sizes: sizes,
        }
    }

    #[test]
    fn segment_zero_and_one_force_lowest_bitrate() {
        let bitrates = [200_000, 1_000_000];
        let sizes = BTreeMap::new();
        let mut policy = BasicPolicy::new(200_000);
        policy.set_current_bitrate(1_000_000); // pretend we were already high

        let d0 = policy.decide(&ctx(0, 0, &bitrates, &sizes));
        assert_eq!(d0.next_bitrate, 200_000);
        let d1 = policy.decide(&ctx(1, 0, &bitrates, &sizes));
        assert_eq!(d1.next_bitrate, 200_000);
    }

    #[test]
    fn stable_high_throughput_converges_to_highest_bitrate() {
        let bitrates = [200_000, 500_000, 1_000_000, 2_000_000];
        let sizes = BTreeMap::new();
        let mut policy = BasicPolicy::new(200_000);
        policy.decide(&ctx(0, 0, &bitrates, &sizes));
        policy.decide(&ctx(1, 0, &bitrates, &sizes));

        for _ in 0..BASIC_WINDOW {
            policy.record_download(3_000_000 / 8, 1.0); // 3 Mbps samples
        }
        let decision = policy.decide(&ctx(2, 0, &bitrates, &sizes));
        assert_eq!(decision.next_bitrate, 2_000_000);
    }

    #[test]
    fn throughput_collapse_drops_to_lowest_bitrate() {
        let bitrates = [200_000, 500_000, 1_000_000, 2_000_000];
        let sizes = BTreeMap::new();
        let mut policy = BasicPolicy::new(200_000);
        policy.decide(&ctx(0, 0, &bitrates, &sizes));
        policy.decide(&ctx(1, 0, &bitrates, &sizes));
        for _ in 0..BASIC_WINDOW {
            policy.record_download(3_000_000 / 8, 1.0);
        }
        policy.decide(&ctx(2, 0, &bitrates, &sizes));

        for _ in 0..BASIC_WINDOW {
            policy.record_download(50_000 / 8, 1.0); // collapse to 50 kbps
        }
        let decision = policy.decide(&ctx(3, 0, &bitrates, &sizes));
        assert_eq!(decision.next_bitrate, 200_000);
    }

    #[test]
    fn jump_grace_suppresses_one_downshift_then_expires() {
        let bitrates = [200_000, 500_000, 1_000_000];
        let sizes = BTreeMap::new();
        let mut policy = BasicPolicy::new(200_000);
        policy.decide(&ctx(0, 0, &bitrates, &sizes));
        policy.decide(&ctx(1, 0, &bitrates, &sizes));
        for _ in 0..BASIC_WINDOW {
            policy.record_download(2_000_000 / 8, 1.0);
        }
        let high = policy.decide(&ctx(2, 0, &bitrates, &sizes));
        assert_eq!(high.next_bitrate, 1_000_000);

        policy.on_jump();
        for _ in 0..BASIC_WINDOW {
            policy.record_download(50_000 / 8, 1.0);
        }
        let held = policy.decide(&ctx(3, 0, &bitrates, &sizes));
        assert_eq!(held.next_bitrate, 1_000_000, "grace should hold bitrate steady");

        for _ in 0..10 {
            let _ = policy.decide(&ctx(4, 0, &bitrates, &sizes));
        }
        let settled = policy.decide(&ctx(5, 0, &bitrates, &sizes));
        assert_eq!(settled.next_bitrate, 200_000, "grace should expire and allow downshift");
    }

    #[test]
    fn delay_requested_once_buffer_exceeds_threshold() {
        let bitrates = [200_000];
        let sizes = BTreeMap::new();
        let mut policy = BasicPolicy::new(200_000);
        policy.decide(&ctx(0, 0, &bitrates, &sizes));
        policy.decide(&ctx(1, 0, &bitrates, &sizes));
        let decision = policy.decide(&ctx(2, BASIC_THRESHOLD + 2, &bitrates, &sizes));
        assert_eq!(decision.delay_segments, 2.0);
    }
}
