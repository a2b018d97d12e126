use std::time::{Duration, Instant};

/// A monotonically advancing, wall-time-referenced playback timer.
///
/// `now()` reports elapsed playback time since [`PlaybackClock::start`],
/// net of any time spent [`pause`](PlaybackClock::pause)d and shifted by
/// [`forward`](PlaybackClock::forward)/[`backward`](PlaybackClock::backward).
/// Pausing is how the consumer models a buffer underrun: playback time
/// does not advance while there is nothing to play.
#[derive(Debug)]
pub struct PlaybackClock {
    start_at: Option<Instant>,
    paused_since: Option<Instant>,
    total_paused: Duration,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            start_at: None,
            paused_since: None,
            total_paused: Duration::ZERO,
        }
    }
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin (or restart) the clock at zero.
    pub fn start(&mut self) {
        self.start_at = Some(Instant::now());
        self.paused_since = None;
        self.total_paused = Duration::ZERO;
    }

    /// Freeze `now()` at its current value until [`resume`](Self::resume).
    pub fn pause(&mut self) {
        if self.paused_since.is_none() {
            self.paused_since = Some(Instant::now());
        }
    }

    /// Resume advancing `now()` after a [`pause`](Self::pause).
    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_since.take() {
            self.total_paused += paused_at.elapsed();
        }
    }

    /// Shift the start reference later in wall time, which moves `now()`
    /// earlier — used when a seek lands before the current position.
    pub fn forward(&mut self, delta_seconds: f64) {
        self.shift_start(Duration::from_secs_f64(delta_seconds.max(0.0)), true);
    }

    /// Shift the start reference earlier in wall time, which moves `now()`
    /// later — used when a seek lands after the current position.
    pub fn backward(&mut self, delta_seconds: f64) {
        self.shift_start(Duration::from_secs_f64(delta_seconds.max(0.0)), false);
    }

    fn shift_start(&mut self, delta: Duration, later: bool) {
        let Some(start) = self.start_at else { return };
        self.start_at = Some(if later {
            start + delta
        } else {
            start.checked_sub(delta).unwrap_or(start)
        });
    }

    /// Elapsed playback time in seconds. Zero before [`start`](Self::start).
    pub fn now(&self) -> f64 {
        let Some(start) = self.start_at else {
            return 0.0;
        };
        let paused_extra = self.paused_since.map(|p| p.elapsed()).unwrap_or_default();
        Instant::now()
            .saturating_duration_since(start)
            .saturating_sub(self.total_paused)
            .saturating_sub(paused_extra)
            .as_secs_f64()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_zero_before_start() {
        let clock = PlaybackClock::new();
        assert_eq!(clock.now(), 0.0);
    }

    #[test]
    fn forward_moves_now_earlier() {
        let mut clock = PlaybackClock::new();
        clock.start();
        clock.forward(10.0);
        assert!(clock.now() <= 0.001);
    }

    #[test]
    fn backward_moves_now_later() {
        let mut clock = PlaybackClock::new();
        clock.start();
        clock.backward(30.0);
        assert!(clock.now() >= 29.9);
    }

    #[tokio::test]
    async fn pause_freezes_elapsed_time() {
        let mut clock = PlaybackClock::new();
        clock.start();
        clock.pause();
        let frozen = clock.now();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(clock.now(), frozen);
        clock.resume();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(clock.now() > frozen);
    }
}
