//! Helper-process transports.
//!
//! Both the generic HTTP helper and the QUIC helper speak the same
//! line-delimited wire protocol over a long-lived child process's stdio, so
//! one [`ChildTransport`] implementation serves both, parameterized by the
//! command line to spawn and (for QUIC) a URL rewrite. The child's stdout is
//! monitored line-by-line on a buffered async reader rather than polled with
//! a non-blocking read loop.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use process_utils::tokio_command;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tracing::{debug, info, warn};
use url::Url;

use crate::builtin::basename;
use crate::error::TransportError;
use crate::{FetchResult, Fetched, HelperKind, TransportKind};

/// The token a helper emits on stdout once it is ready to accept requests.
const STARTED_TOKEN: &str = "started";

/// Success marker: `file_size_start:<N>:file_size_end`.
const SIZE_START: &str = "file_size_start:";
const SIZE_END: &str = ":file_size_end";

/// Fault tokens a helper may emit in place of a success marker.
const FAULT_TOKENS: [&str; 3] = ["FATAL", "Failed to connect", "ERROR"];

/// Settling interval before reopening after a recoverable fault.
///
/// QUIC's helper shares libcurl's 5-second request timeout, so the settle
/// must be at least that long or a reopen races the still-timing-out
/// connection.
pub fn settle_interval(kind: &TransportKind) -> Duration {
    match kind {
        TransportKind::Helper {
            kind: HelperKind::Quic,
            ..
        } => Duration::from_secs(5),
        _ => Duration::from_millis(500),
    }
}

pub struct ChildTransport {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    process_name: &'static str,
    rewrite: Option<(String, String)>,
}

impl ChildTransport {
    /// Spawn the helper and block until it emits the `started` token.
    pub async fn spawn(kind: &TransportKind) -> Result<Self, TransportError> {
        let (binary, args, process_name, rewrite) = match kind {
            TransportKind::Http => unreachable!("builtin transport never spawns a child"),
            TransportKind::Helper {
                kind: helper_kind,
                binary,
                args,
                host,
            } => {
                let process_name = match helper_kind {
                    HelperKind::Quic => "quic_client",
                    HelperKind::Curl => binary.as_str(),
                };
                let rewrite = match helper_kind {
                    HelperKind::Quic => host
                        .as_ref()
                        .map(|host| (format!("https://{host}"), crate::QUIC_ORIGIN_PLACEHOLDER.to_string())),
                    HelperKind::Curl => None,
                };
                (binary.clone(), args.clone(), process_name, rewrite)
            }
        };

        let mut child = tokio_command(&binary)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TransportError::Spawn {
                binary: binary.clone(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TransportError::Fatal(format!("{binary}: no stdin pipe")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TransportError::Fatal(format!("{binary}: no stdout pipe")))?;
        let mut lines = BufReader::new(stdout).lines();

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    debug!(%line, "helper startup line");
                    if line.contains(STARTED_TOKEN) {
                        info!(binary = %binary, "helper transport started");
                        break;
                    }
                }
                Ok(None) => return Err(TransportError::HelperExitedDuringStartup),
                Err(source) => return Err(TransportError::Io(source)),
            }
        }

        Ok(Self {
            child,
            stdin,
            lines,
            process_name,
            rewrite,
        })
    }

    fn rewrite_url(&self, segment_url: &Url) -> String {
        let raw = segment_url.as_str().to_string();
        match &self.rewrite {
            Some((from, to)) if raw.starts_with(from.as_str()) => raw.replacen(from, to, 1),
            _ => raw,
        }
    }

    /// Fetch one segment: write the URL, classify the response line.
    pub async fn fetch(
        &mut self,
        segment_url: &Url,
        download_dir: &Path,
    ) -> Result<FetchResult, TransportError> {
        let requested_url = self.rewrite_url(segment_url);
        debug!(url = %requested_url, "writing request to helper stdin");
        self.stdin
            .write_all(format!("{requested_url}\n").as_bytes())
            .await?;
        self.stdin.flush().await?;

        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(outcome) = classify(&line, segment_url, download_dir) {
                        return outcome;
                    }
                }
                Ok(None) => {
                    warn!(process = self.process_name, "helper stdout closed mid-fetch");
                    return Ok(FetchResult::Recoverable);
                }
                Err(source) => return Err(TransportError::Io(source)),
            }
        }
    }

    /// Terminate the child (after a recoverable fault) and settle.
    pub async fn kill_and_settle(mut self, kind: &TransportKind) {
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
        kill_by_name(self.process_name);
        tokio::time::sleep(settle_interval(kind)).await;
    }

    /// Graceful shutdown: `exit\n` then a name-based sweep.
    pub async fn shutdown(mut self) {
        let _ = self.stdin.write_all(b"exit\n").await;
        let _ = self.stdin.flush().await;
        let wait = tokio::time::timeout(Duration::from_secs(2), self.child.wait()).await;
        if wait.is_err() {
            let _ = self.child.start_kill();
            let _ = self.child.wait().await;
        }
        kill_by_name(self.process_name);
    }
}

fn classify(
    line: &str,
    segment_url: &Url,
    download_dir: &Path,
) -> Option<Result<FetchResult, TransportError>> {
    if let Some(start) = line.find(SIZE_START) {
        if let Some(end) = line.find(SIZE_END) {
            let digits = &line[start + SIZE_START.len()..end];
            return Some(match digits.parse::<i64>() {
                Ok(size) if size >= 0 => Ok(FetchResult::Success(Fetched {
                    bytes: size as u64,
                    local_path: download_dir.join(basename(segment_url)),
                })),
                _ => Ok(FetchResult::Recoverable),
            });
        }
    }
    if FAULT_TOKENS.iter().any(|token| line.contains(token)) {
        return Some(Ok(FetchResult::Recoverable));
    }
    None
}

/// Defensive sweep by process-name substring. The primary path is the
/// owned [`Child`] handle above; this only catches an orphan of the same
/// binary left behind by a previous crashed run.
fn kill_by_name(name: &str) {
    #[cfg(unix)]
    {
        let _ = std::process::Command::new("pkill").arg("-f").arg(name).status();
    }
    #[cfg(not(unix))]
    {
        let _ = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://cdn.example.com/video/500000/seg-3.m4s").unwrap()
    }

    #[test]
    fn classifies_success_line() {
        let outcome = classify(
            "file_size_start:12345:file_size_end",
            &url(),
            Path::new("/tmp/run"),
        )
        .unwrap()
        .unwrap();
        match outcome {
            FetchResult::Success(fetched) => {
                assert_eq!(fetched.bytes, 12345);
                assert_eq!(fetched.local_path, PathBuf::from("/tmp/run/seg-3.m4s"));
            }
            FetchResult::Recoverable => panic!("expected success"),
        }
    }

    #[test]
    fn classifies_fault_tokens_as_recoverable() {
        for line in ["FATAL: connection reset", "Failed to connect to host", "ERROR 503"] {
            let outcome = classify(line, &url(), Path::new("/tmp")).unwrap().unwrap();
            assert!(matches!(outcome, FetchResult::Recoverable));
        }
    }

    #[test]
    fn ignores_unrelated_lines() {
        assert!(classify("debug: connecting...", &url(), Path::new("/tmp")).is_none());
    }
}
