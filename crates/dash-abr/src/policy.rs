use crate::constants::JUMP_BUFFER_COUNTER_CONSTANT;
use crate::context::DecisionContext;
use crate::decision::Decision;

/// Shared contract all three bitrate-selection strategies implement. The
/// jump-grace handling and the segment-0 lowest-bitrate rule live in the
/// default [`decide`](Self::decide) method so every implementation gets
/// them uniformly rather than re-deriving them per policy.
pub trait AdaptationPolicy: Send {
    /// Policy-specific choice, called only once the shared rules in
    /// [`decide`](Self::decide) have determined this isn't a forced case.
    fn decide_raw(&mut self, ctx: &DecisionContext<'_>) -> Decision;

    fn current_bitrate(&self) -> u64;
    fn set_current_bitrate(&mut self, bitrate: u64);

    fn jump_grace(&self) -> u32;
    fn set_jump_grace(&mut self, value: u32);

    /// Record that the previous segment took `seconds` to download
    /// `bytes`. Called by the driver once per completed fetch, before the
    /// next [`decide`](Self::decide) call.
    fn record_download(&mut self, bytes: u64, seconds: f64);

    /// Choose the next segment's bitrate and delay.
    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Decision {
        let before = self.current_bitrate();

        let mut decision = if ctx.is_initial_segment() {
            Decision {
                next_bitrate: ctx.bitrates_sorted_asc.first().copied().unwrap_or(before),
                delay_segments: 0.0,
            }
        } else {
            self.decide_raw(ctx)
        };

        let grace = self.jump_grace();
        if grace > 0 {
            if decision.next_bitrate < before {
                decision.next_bitrate = before;
            }
            self.set_jump_grace(grace - 1);
        }

        self.set_current_bitrate(decision.next_bitrate);
        decision
    }

    /// Reset the jump-grace counter after a seek, suppressing downshifts
    /// for the next few decisions while the buffer refills.
    fn on_jump(&mut self) {
        self.set_jump_grace(JUMP_BUFFER_COUNTER_CONSTANT);
    }
}
