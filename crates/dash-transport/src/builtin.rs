//! The built-in HTTP backend.
//!
//! A plain GET, streamed to `download_dir/<basename>` in chunks. Network
//! errors at the HTTP layer are fatal for the segment in flight — recoverable
//! faults are reserved for the helper-process backends, where a crashed
//! child is the expected transient failure mode.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use url::Url;

use crate::error::TransportError;
use crate::{FetchResult, Fetched};

/// Nominal chunk size for the streamed write. `reqwest`'s stream does not
/// guarantee chunk boundaries this precisely; this only bounds how much of
/// a chunk we hold before flushing to disk.
const DOWNLOAD_CHUNK: usize = 1024;

pub async fn fetch(
    client: &reqwest::Client,
    segment_url: &Url,
    download_dir: &Path,
) -> Result<FetchResult, TransportError> {
    let response = match client.get(segment_url.clone()).send().await {
        Ok(response) => response,
        Err(source) => {
            return Err(TransportError::Fatal(format!(
                "GET {segment_url} failed: {source}"
            )));
        }
    };

    if !response.status().is_success() {
        return Err(TransportError::Fatal(format!(
            "GET {segment_url} returned HTTP {}",
            response.status()
        )));
    }

    tokio::fs::create_dir_all(download_dir).await?;
    let local_path = download_dir.join(basename(segment_url));
    let mut file = tokio::fs::File::create(&local_path).await?;

    let mut stream = response.bytes_stream();
    let mut total: u64 = 0;
    let mut pending = Vec::with_capacity(DOWNLOAD_CHUNK);

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|source| {
            TransportError::Fatal(format!("reading body of {segment_url} failed: {source}"))
        })?;
        pending.extend_from_slice(&chunk);
        while pending.len() >= DOWNLOAD_CHUNK {
            let flush: Vec<u8> = pending.drain(..DOWNLOAD_CHUNK).collect();
            total += flush.len() as u64;
            file.write_all(&flush).await?;
        }
    }
    if !pending.is_empty() {
        total += pending.len() as u64;
        file.write_all(&pending).await?;
    }
    file.flush().await?;

    debug!(%segment_url, bytes = total, path = %local_path.display(), "builtin HTTP fetch complete");

    Ok(FetchResult::Success(Fetched {
        bytes: total,
        local_path,
    }))
}

/// `basename(path)` — the last path segment of the URL, with leading
/// slashes stripped.
pub(crate) fn basename(url: &Url) -> PathBuf {
    let trimmed = url.path().trim_start_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    PathBuf::from(if name.is_empty() { "segment" } else { name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basename_strips_leading_slashes_and_directories() {
        let url = Url::parse("https://cdn.example.com/video/500000/seg-1.m4s").unwrap();
        assert_eq!(basename(&url), PathBuf::from("seg-1.m4s"));
    }
}
