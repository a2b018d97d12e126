use std::time::{Duration, Instant};

use dash_abr::{AdaptationPolicy, DecisionContext};
use dash_mpd::MpdModel;
use dash_playback::{PlaybackBuffer, SegmentArtifact};
use dash_transport::{FetchResult, Multiplexer};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::RunConfig;
use crate::error::PipelineError;
use crate::recorder::{RunReport, SegmentRecord};

struct FetchOutcome {
    bytes: u64,
    download_seconds: f64,
}

/// Drives one run end to end: consults the adaptation engine, fetches
/// through the transport multiplexer with retry-on-recoverable-fault,
/// hands artifacts to the playback buffer, records every segment, and
/// executes the configured jump scenario as playback crosses it.
pub struct PipelineDriver {
    config: RunConfig,
    model: MpdModel,
    multiplexer: Multiplexer,
    policy: Box<dyn AdaptationPolicy>,
    buffer: std::sync::Arc<PlaybackBuffer>,
    consumer: tokio::task::JoinHandle<()>,
    report: RunReport,
    jump_cursor: usize,
    cancel: CancellationToken,
}

impl PipelineDriver {
    pub async fn new(config: RunConfig, model: MpdModel) -> Result<Self, PipelineError> {
        std::fs::create_dir_all(&config.download_dir).map_err(|source| PipelineError::RunDirectory {
            path: config.download_dir.clone(),
            source,
        })?;

        let mut multiplexer = Multiplexer::new(config.transport.clone());
        multiplexer.open().await?;

        let lowest_bitrate = model.bitrates_sorted_asc().first().copied().unwrap_or(0);
        let policy = config.policy.build(lowest_bitrate);
        let (buffer, consumer) = PlaybackBuffer::spawn();

        Ok(PipelineDriver {
            config,
            model,
            multiplexer,
            policy,
            buffer,
            consumer,
            report: RunReport::new(),
            jump_cursor: 0,
            cancel: CancellationToken::new(),
        })
    }

    /// A handle the CLI can use to request early termination (e.g. on
    /// Ctrl-C) without the driver blocking indefinitely anywhere.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn run(mut self) -> Result<RunReport, PipelineError> {
        let outcome = self.run_loop().await;

        match &outcome {
            Ok(()) => self.buffer.mark_complete(),
            Err(_) => self.buffer.stop(),
        }
        self.wait_for_buffer_exit().await;
        self.multiplexer.shutdown().await;

        if !self.config.keep_downloads {
            let _ = std::fs::remove_dir_all(&self.config.download_dir);
        }

        outcome.map(|()| self.report)
    }

    /// The seven-step per-segment loop. Broken out so [`run`](Self::run)
    /// can guarantee the transport and playback buffer are torn down on
    /// every exit path, fatal errors included.
    async fn run_loop(&mut self) -> Result<(), PipelineError> {
        let start = self.model.index().start();
        let last = self.model.index().last_segment();
        let segment_duration = self.model.segment_duration();
        let bitrates = self.model.bitrates_sorted_asc();

        let mut segment_number = start;
        let mut processed: u64 = 0;

        while segment_number <= last {
            if self.cancel.is_cancelled() {
                info!("run cancelled before completion");
                break;
            }
            if let Some(limit) = self.config.segment_limit {
                if processed >= limit {
                    break;
                }
            }
            if self.buffer.playback_state().is_exit_state() {
                return Err(PipelineError::BufferTerminated);
            }

            let next_sizes = self.model.segment_sizes_at(segment_number.saturating_add(1));
            let average_sizes = self.model.average_segment_sizes();
            let ctx = DecisionContext {
                segment_number,
                index_start: start,
                bitrates_sorted_asc: &bitrates,
                qsize: self.buffer.qsize(),
                segment_duration,
                next_segment_sizes: &next_sizes,
                average_segment_sizes: &average_sizes,
            };
            let decision = self.policy.decide(&ctx);
            debug!(
                segment_number,
                next_bitrate = decision.next_bitrate,
                delay_segments = decision.delay_segments,
                "adaptation decision"
            );

            if decision.delay_segments > 0.0 {
                let cancelled = self
                    .sleep_responsively(decision.delay_segments * segment_duration)
                    .await;
                if cancelled {
                    break;
                }
            }

            let url = self.model.resolve_url(segment_number, decision.next_bitrate)?.clone();
            let fetched = self.fetch_with_retry(&url).await?;

            self.policy.record_download(fetched.bytes, fetched.download_seconds);

            let playback_length = if segment_number == start { 0.0 } else { segment_duration };
            let url_basename = basename(&url);
            let local_path = self.config.download_dir.join(&url_basename);
            self.buffer.write(SegmentArtifact {
                playback_length,
                size: fetched.bytes,
                bitrate: decision.next_bitrate,
                local_path,
                source_url: url.clone(),
                segment_number,
            });

            self.report.record(SegmentRecord {
                segment_number,
                url_basename,
                bitrate: decision.next_bitrate,
                bytes: fetched.bytes,
                download_seconds: fetched.download_seconds,
            });
            if let Some(report_path) = self.config.report_path.clone() {
                self.report.save(&report_path)?;
            }

            processed += 1;

            if let Some(scenario) = self.config.jump_scenario.clone() {
                if let Some(&(at_seconds, to_seconds)) = scenario.entries().get(self.jump_cursor) {
                    let now = self.buffer.clock_now();
                    if at_seconds <= now {
                        segment_number = target_segment_before_increment(to_seconds, segment_duration);
                        self.buffer.jump(now, to_seconds, decision.next_bitrate);
                        if to_seconds > at_seconds {
                            self.buffer.clock_backward(to_seconds - at_seconds);
                        } else {
                            self.buffer.clock_forward(at_seconds - to_seconds);
                        }
                        self.policy.on_jump();
                        self.jump_cursor += 1;
                        info!(at_seconds, to_seconds, segment_number, "executed seek");
                    }
                }
            }

            segment_number += 1;
        }

        Ok(())
    }

    async fn fetch_with_retry(&mut self, url: &Url) -> Result<FetchOutcome, PipelineError> {
        loop {
            let started = Instant::now();
            match self.multiplexer.fetch(url, &self.config.download_dir).await {
                Ok(FetchResult::Success(fetched)) => {
                    return Ok(FetchOutcome {
                        bytes: fetched.bytes,
                        download_seconds: started.elapsed().as_secs_f64(),
                    });
                }
                Ok(FetchResult::Recoverable) => {
                    warn!(%url, "recoverable transport fault, reopening and retrying");
                    self.multiplexer.reopen().await?;
                }
                Err(err) => return Err(PipelineError::Transport(err)),
            }
        }
    }

    /// Sleeps in slices no longer than one second so a cancellation
    /// request is never delayed by more than that. Returns `true` if
    /// cancelled mid-sleep.
    async fn sleep_responsively(&self, total_seconds: f64) -> bool {
        let mut remaining = total_seconds;
        while remaining > 0.0 {
            let slice = remaining.min(1.0);
            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs_f64(slice)) => {}
                _ = self.cancel.cancelled() => return true,
            }
            remaining -= slice;
        }
        false
    }

    /// The consumer task returns once it reaches an exit state (drained
    /// after `mark_complete`, or stopped/failed); waiting on its handle
    /// is cheaper and more direct than polling `playback_state()`.
    async fn wait_for_buffer_exit(&mut self) {
        let _ = (&mut self.consumer).await;
    }
}

fn basename(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or("segment")
        .to_string()
}

/// Where a seek lands *before* step 7's increment: `floor(to_seconds /
/// segment_duration) - 1`, per spec `# 4.5` step 6. Not offset by the
/// index's `start` — the original sets `segment_number` to this absolute
/// value directly, and the following `segment_number += 1` then resolves
/// to the segment containing `to_seconds`.
fn target_segment_before_increment(to_seconds: f64, segment_duration: f64) -> u64 {
    let target_media_number = (to_seconds / segment_duration).floor() as u64;
    target_media_number.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_target_lands_on_segment_after_increment() {
        // Seed scenario: 40 -> 10, 4s segments.
        let landed = target_segment_before_increment(10.0, 4.0);
        assert_eq!(landed, 1);
        assert_eq!(landed + 1, 2); // step 7's increment then resolves to segment 2
    }

    #[test]
    fn jump_to_zero_never_underflows() {
        let landed = target_segment_before_increment(0.0, 4.0);
        assert_eq!(landed, 0);
    }
}
