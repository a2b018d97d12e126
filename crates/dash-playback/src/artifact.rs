use std::path::PathBuf;

use url::Url;

/// What a successful fetch leaves behind, ready for the playback buffer.
#[derive(Debug, Clone)]
pub struct SegmentArtifact {
    /// Playback length in seconds (the representation's segment duration).
    pub playback_length: f64,
    /// Size in bytes, as reported by the transport.
    pub size: u64,
    /// The bitrate the adaptation engine chose for this segment.
    pub bitrate: u64,
    /// Where the transport wrote the segment on disk.
    pub local_path: PathBuf,
    /// The absolute URL the segment was fetched from.
    pub source_url: Url,
    /// Absolute segment number in the shared segment index.
    pub segment_number: u64,
}
