//! Segment transport multiplexer: a uniform
//! `fetch(segment_url, download_dir, handle) -> (size, local_path)`
//! contract over three backends — builtin HTTP, and two
//! helper-process backends (a generic HTTP client and a QUIC client)
//! sharing one line-delimited wire protocol.

mod builtin;
mod child;
mod error;
mod multiplexer;

pub use error::TransportError;
pub use multiplexer::Multiplexer;

use std::path::PathBuf;

/// The host prefix substituted into QUIC helper requests in place of the
/// real origin, so the helper addresses the QUIC listener directly while
/// the server-side cache still sees the original host.
pub const QUIC_ORIGIN_PLACEHOLDER: &str = "https://quic-files.internal";

/// Which helper-process protocol a [`TransportKind::Helper`] drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperKind {
    /// The QUIC client helper.
    Quic,
    /// The generic HTTP client helper (a `curl`-backed helper binary).
    Curl,
}

/// Selects one of the three backends.
#[derive(Debug, Clone)]
pub enum TransportKind {
    /// The built-in `reqwest`-based HTTP client.
    Http,
    /// A long-lived helper process (HTTP or QUIC).
    Helper {
        kind: HelperKind,
        binary: String,
        args: Vec<String>,
        /// Origin authority used to rewrite QUIC request URLs (`--HOST`).
        /// Unused by [`HelperKind::Curl`].
        host: Option<String>,
    },
}

/// The artifact of a successful fetch: how many bytes were written and where.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub bytes: u64,
    pub local_path: PathBuf,
}

/// The outcome of one `fetch` call.
///
/// `Recoverable` is a transport fault the caller must retry after
/// reopening the handle. It is deliberately not a [`TransportError`]: a
/// transport fault must never be propagated as a permanent error, since
/// the caller's retry loop is the thing that makes the child-process
/// backends self-healing.
#[derive(Debug)]
pub enum FetchResult {
    Success(Fetched),
    Recoverable,
}
