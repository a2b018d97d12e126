//! The uniform transport contract: `fetch(url, download_dir,
//! handle) -> (size, path)` over three backends, with recoverable faults
//! handled by reopening the handle.

use std::path::Path;

use tracing::{info, warn};
use url::Url;

use crate::child::ChildTransport;
use crate::error::TransportError;
use crate::{FetchResult, Fetched, TransportKind};

/// Owns the currently open transport handle.
///
/// For the builtin backend "open" is a no-op — the contract stays
/// three-argument uniformly across backends, with the builtin backend
/// ignoring the handle (there is nothing to reopen).
pub struct Multiplexer {
    kind: TransportKind,
    http_client: reqwest::Client,
    child: Option<ChildTransport>,
}

impl Multiplexer {
    pub fn new(kind: TransportKind) -> Self {
        Self {
            kind,
            http_client: reqwest::Client::new(),
            child: None,
        }
    }

    /// Opens (or reopens) the backend's transport handle.
    pub async fn open(&mut self) -> Result<(), TransportError> {
        match &self.kind {
            TransportKind::Http => Ok(()),
            TransportKind::Helper { .. } => {
                self.child = Some(ChildTransport::spawn(&self.kind).await?);
                Ok(())
            }
        }
    }

    /// Fetches one segment through the currently open backend.
    pub async fn fetch(
        &mut self,
        segment_url: &Url,
        download_dir: &Path,
    ) -> Result<FetchResult, TransportError> {
        match &self.kind {
            TransportKind::Http => {
                crate::builtin::fetch(&self.http_client, segment_url, download_dir).await
            }
            TransportKind::Helper { .. } => {
                let child = self.child.as_mut().ok_or(TransportError::NotOpen)?;
                child.fetch(segment_url, download_dir).await
            }
        }
    }

    /// Kill the faulted child, settle, and reopen. A no-op settle for the
    /// builtin backend, which has no child to reopen.
    pub async fn reopen(&mut self) -> Result<(), TransportError> {
        if let Some(child) = self.child.take() {
            warn!("reopening faulted transport after recoverable error");
            child.kill_and_settle(&self.kind).await;
        }
        self.open().await
    }

    /// Shut the transport down on driver exit.
    pub async fn shutdown(mut self) {
        if let Some(child) = self.child.take() {
            info!("shutting down helper transport");
            child.shutdown().await;
        }
    }
}

/// Convenience used by a fresh-success return where callers want the
/// fields directly rather than matching on [`FetchResult`].
impl Fetched {
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builtin_open_is_a_no_op_and_reopen_never_spawns() {
        let mut mux = Multiplexer::new(TransportKind::Http);
        mux.open().await.unwrap();
        assert!(mux.child.is_none());
        mux.reopen().await.unwrap();
        assert!(mux.child.is_none());
    }
}
