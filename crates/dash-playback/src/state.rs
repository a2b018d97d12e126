/// Lifecycle phase of the playback buffer's consumer, used only to decide
/// when the producer (the pipeline driver) may exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// The consumer has not yet drained its first segment.
    Starting,
    /// Actively draining buffered segments.
    Playing,
    /// The buffer ran dry but more segments are still expected.
    Stalled,
    /// The producer signalled completion and the buffer has drained. Terminal.
    Complete,
    /// The consumer was stopped externally before draining finished. Terminal.
    Stopped,
    /// The consumer terminated unexpectedly. Terminal.
    Failed,
}

impl PlaybackState {
    /// Terminal phases: reached after the buffer has drained and no
    /// further segments are expected (or the consumer gave up).
    pub fn is_exit_state(self) -> bool {
        matches!(
            self,
            PlaybackState::Complete | PlaybackState::Stopped | PlaybackState::Failed
        )
    }
}
