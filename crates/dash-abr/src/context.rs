use std::collections::BTreeMap;

/// Everything a policy needs to decide the next segment's bitrate. Built
/// fresh by the driver for every segment from the manifest model and the
/// current buffer occupancy; policies carry their own download history
/// across calls internally.
pub struct DecisionContext<'a> {
    /// Absolute segment number about to be fetched.
    pub segment_number: u64,
    /// First segment number in the index (the initialization segment).
    pub index_start: u64,
    /// Bitrates available for this representation, ascending.
    pub bitrates_sorted_asc: &'a [u64],
    /// Current playback buffer occupancy, in segments.
    pub qsize: usize,
    /// Representation segment duration, in seconds.
    pub segment_duration: f64,
    /// Encoded size in bytes per bitrate, for the segment about to be
    /// fetched. Used by policies that predict download time.
    pub next_segment_sizes: &'a BTreeMap<u64, u64>,
    /// Arithmetic-mean encoded size in bytes per bitrate, across the whole
    /// representation. Used by policies that need a stable per-bitrate
    /// estimate rather than one segment's actual size.
    pub average_segment_sizes: &'a BTreeMap<u64, u64>,
}

impl DecisionContext<'_> {
    /// The initialization segment and the first media segment both force
    /// the lowest bitrate unconditionally, before any policy runs.
    pub fn is_initial_segment(&self) -> bool {
        self.segment_number <= self.index_start.saturating_add(1)
    }
}
