use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::artifact::SegmentArtifact;
use crate::clock::PlaybackClock;
use crate::state::PlaybackState;

/// Bounded FIFO of decoded-ready segments, drained by a concurrent task
/// that models real-time playback and advances a [`PlaybackClock`].
///
/// Capacity is not enforced here: `write` never blocks or rejects. The
/// soft-capacity backpressure signal is `qsize()`, which the driver polls
/// and reacts to by delaying the next fetch (see [`crate`] for why: the
/// contract is that the driver never blocks on this buffer directly).
pub struct PlaybackBuffer {
    queue: Mutex<VecDeque<SegmentArtifact>>,
    occupancy: AtomicUsize,
    state: Mutex<PlaybackState>,
    clock: Mutex<PlaybackClock>,
    notify: Notify,
    no_more_writes: AtomicBool,
}

impl PlaybackBuffer {
    /// Create the buffer and spawn its consumer task. The returned handle
    /// completes once the consumer reaches an exit state.
    pub fn spawn() -> (Arc<PlaybackBuffer>, JoinHandle<()>) {
        let buffer = Arc::new(PlaybackBuffer {
            queue: Mutex::new(VecDeque::new()),
            occupancy: AtomicUsize::new(0),
            state: Mutex::new(PlaybackState::Starting),
            clock: Mutex::new(PlaybackClock::new()),
            notify: Notify::new(),
            no_more_writes: AtomicBool::new(false),
        });
        let task_buffer = buffer.clone();
        let handle = tokio::spawn(async move { task_buffer.run_consumer().await });
        (buffer, handle)
    }

    /// `write(artifact)` — producer side, non-blocking enqueue.
    pub fn write(&self, artifact: SegmentArtifact) {
        debug!(segment_number = artifact.segment_number, "buffered segment");
        self.queue.lock().push_back(artifact);
        self.occupancy.fetch_add(1, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// `qsize() -> int` — current occupancy in segments.
    pub fn qsize(&self) -> usize {
        self.occupancy.load(Ordering::SeqCst)
    }

    /// Told by the driver that no further segments will be written. The
    /// consumer exits to [`PlaybackState::Complete`] once it has drained
    /// whatever remains.
    pub fn mark_complete(&self) {
        self.no_more_writes.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    /// Ends the consumer immediately, regardless of what remains buffered.
    pub fn stop(&self) {
        *self.state.lock() = PlaybackState::Stopped;
        self.notify.notify_one();
    }

    pub fn playback_state(&self) -> PlaybackState {
        *self.state.lock()
    }

    pub fn clock_now(&self) -> f64 {
        self.clock.lock().now()
    }

    /// Shift the clock forward (moves `now()` earlier) — a barrier-free
    /// companion to [`jump`](Self::jump) the driver calls separately.
    pub fn clock_forward(&self, delta_seconds: f64) {
        self.clock.lock().forward(delta_seconds);
    }

    /// Shift the clock backward (moves `now()` later).
    pub fn clock_backward(&self, delta_seconds: f64) {
        self.clock.lock().backward(delta_seconds);
    }

    /// `jump(from_seconds, to_seconds, current_bitrate)` — discard every
    /// buffered segment, since a seek invalidates the entire playback
    /// position it was building toward. Acts as a barrier: nothing
    /// enqueued before this call is playable once it returns.
    pub fn jump(&self, from_seconds: f64, to_seconds: f64, current_bitrate: u64) {
        let discarded = {
            let mut queue = self.queue.lock();
            let discarded = queue.len();
            queue.clear();
            discarded
        };
        self.occupancy.store(0, Ordering::SeqCst);
        info!(
            from_seconds,
            to_seconds, current_bitrate, discarded, "buffer flushed for a seek"
        );
        self.notify.notify_one();
    }

    async fn run_consumer(self: Arc<Self>) {
        self.clock.lock().start();
        *self.state.lock() = PlaybackState::Playing;

        loop {
            if matches!(self.playback_state(), PlaybackState::Stopped) {
                return;
            }

            let next = self.queue.lock().pop_front();
            match next {
                Some(artifact) => {
                    self.occupancy.fetch_sub(1, Ordering::SeqCst);
                    {
                        let mut state = self.state.lock();
                        if *state == PlaybackState::Stalled {
                            self.clock.lock().resume();
                        }
                        *state = PlaybackState::Playing;
                    }
                    debug!(
                        segment_number = artifact.segment_number,
                        playback_length = artifact.playback_length,
                        "draining segment"
                    );
                    tokio::time::sleep(Duration::from_secs_f64(artifact.playback_length.max(0.0)))
                        .await;
                }
                None if self.no_more_writes.load(Ordering::SeqCst) => {
                    *self.state.lock() = PlaybackState::Complete;
                    return;
                }
                None => {
                    {
                        let mut state = self.state.lock();
                        if *state != PlaybackState::Stalled {
                            *state = PlaybackState::Stalled;
                            self.clock.lock().pause();
                        }
                    }
                    self.notify.notified().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use url::Url;

    fn artifact(segment_number: u64, playback_length: f64) -> SegmentArtifact {
        SegmentArtifact {
            playback_length,
            size: 1000,
            bitrate: 500_000,
            local_path: PathBuf::from("/tmp/seg"),
            source_url: Url::parse("https://cdn.example.com/seg.m4s").unwrap(),
            segment_number,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn write_then_drain_advances_occupancy_and_completes() {
        let (buffer, handle) = PlaybackBuffer::spawn();
        buffer.write(artifact(1, 2.0));
        buffer.write(artifact(2, 2.0));
        assert_eq!(buffer.qsize(), 2);
        buffer.mark_complete();

        tokio::time::timeout(Duration::from_secs(10), handle)
            .await
            .expect("consumer should finish")
            .unwrap();

        assert_eq!(buffer.qsize(), 0);
        assert_eq!(buffer.playback_state(), PlaybackState::Complete);
    }

    #[tokio::test(start_paused = true)]
    async fn jump_flushes_buffered_segments() {
        let (buffer, _handle) = PlaybackBuffer::spawn();
        buffer.write(artifact(5, 4.0));
        buffer.write(artifact(6, 4.0));
        tokio::task::yield_now().await;
        buffer.jump(40.0, 10.0, 500_000);
        assert_eq!(buffer.qsize(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn clock_pauses_on_underrun_and_resumes_on_write() {
        let (buffer, _handle) = PlaybackBuffer::spawn();
        tokio::task::yield_now().await;
        // Nothing written yet: consumer should have stalled, pausing the clock.
        tokio::time::advance(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        let stalled_now = buffer.clock_now();
        assert!(stalled_now <= 0.01, "clock should not advance while stalled");

        buffer.write(artifact(1, 1.0));
        tokio::task::yield_now().await;
        buffer.mark_complete();
    }
}
