//! Representation and segment-index data model.
//!
//! This module is a passive record: it never performs I/O. Something
//! external (an MPD parser, a test fixture, or [`crate::manifest`]'s thin
//! XML reader) is responsible for producing [`Representation`] values;
//! this module only builds the segment index from them and answers the
//! two queries the adaptation engine needs.

use std::collections::BTreeMap;

use url::Url;

use crate::error::MpdError;

/// The literal placeholder substituted with a representation's bandwidth
/// in its initialization segment URL.
pub const BANDWIDTH_PLACEHOLDER: &str = "$Bandwidth$";

/// One encoding of the content at a specific nominal bandwidth.
#[derive(Debug, Clone)]
pub struct Representation {
    /// Nominal bandwidth in bits/sec. Also the representation's identity.
    pub bandwidth: u64,
    /// Initialization segment URL; may contain `$Bandwidth$` before [`build_segment_index`] runs.
    pub initialization_url: String,
    /// Media segment URLs, in playback order, not including the initialization segment.
    pub media_urls: Vec<String>,
    /// Sizes (bytes) parallel to `media_urls`.
    pub segment_sizes: Vec<u64>,
    /// Nominal duration of each media segment, in seconds.
    pub segment_duration: f64,
}

impl Representation {
    /// `false` if `media_urls` and `segment_sizes` disagree in length.
    fn lengths_match(&self) -> bool {
        self.media_urls.len() == self.segment_sizes.len()
    }
}

/// Mapping from segment number -> bitrate -> absolute URL.
///
/// Segment numbers are contiguous starting at `start`. Segment `start`
/// is the initialization segment for every representation; media
/// segments occupy `start + 1 ..= start + media_len`.
#[derive(Debug, Clone)]
pub struct SegmentIndex {
    entries: BTreeMap<u64, BTreeMap<u64, Url>>,
    start: u64,
    total_segments: u64,
}

impl SegmentIndex {
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Segment count including the initialization segment.
    pub fn total_segments(&self) -> u64 {
        self.total_segments
    }

    pub fn last_segment(&self) -> u64 {
        self.start + self.total_segments.saturating_sub(1)
    }

    pub fn url_for(&self, segment_number: u64, bitrate: u64) -> Result<&Url, MpdError> {
        self.entries
            .get(&segment_number)
            .and_then(|by_bitrate| by_bitrate.get(&bitrate))
            .ok_or(MpdError::UnknownSegment { segment_number })
    }
}

/// Substitute `$Bandwidth$` in the initialization URL of each
/// representation exactly once, prepend it to the media URL list, and
/// assign contiguous segment numbers starting at `start`.
///
/// All representations must share the same media segment count; this
/// is the MPD invariant that the URL list length for every representation
/// equals the total segment count.
pub fn build_segment_index(
    representations: &[Representation],
    base_url: &Url,
    start: u64,
) -> Result<SegmentIndex, MpdError> {
    if representations.is_empty() {
        return Err(MpdError::NoRepresentations);
    }

    for rep in representations {
        if !rep.lengths_match() {
            return Err(MpdError::LengthMismatch {
                bandwidth: rep.bandwidth,
                urls: rep.media_urls.len(),
                sizes: rep.segment_sizes.len(),
            });
        }
    }

    let media_len = representations[0].media_urls.len();
    if representations
        .iter()
        .any(|rep| rep.media_urls.len() != media_len)
    {
        return Err(MpdError::Malformed {
            reason: "representations disagree on segment count".to_string(),
        });
    }

    let mut entries: BTreeMap<u64, BTreeMap<u64, Url>> = BTreeMap::new();

    for rep in representations {
        let init_url = rep
            .initialization_url
            .replacen(BANDWIDTH_PLACEHOLDER, &rep.bandwidth.to_string(), 1);
        let full_urls = std::iter::once(init_url).chain(rep.media_urls.iter().cloned());

        for (offset, raw_url) in full_urls.enumerate() {
            let segment_number = start + offset as u64;
            let absolute = resolve(base_url, &raw_url)?;
            entries
                .entry(segment_number)
                .or_default()
                .insert(rep.bandwidth, absolute);
        }
    }

    Ok(SegmentIndex {
        entries,
        start,
        // +1 for the initialization segment.
        total_segments: media_len as u64 + 1,
    })
}

fn resolve(base_url: &Url, raw: &str) -> Result<Url, MpdError> {
    match Url::parse(raw) {
        Ok(absolute) => Ok(absolute),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            base_url.join(raw).map_err(|source| MpdError::InvalidUrl {
                input: raw.to_string(),
                source,
            })
        }
        Err(source) => Err(MpdError::InvalidUrl {
            input: raw.to_string(),
            source,
        }),
    }
}

/// The full in-memory model the pipeline driver plays back from:
/// representations keyed by bandwidth, the built segment index, and
/// timing metadata.
#[derive(Debug, Clone)]
pub struct MpdModel {
    representations: BTreeMap<u64, Representation>,
    index: SegmentIndex,
    segment_duration: f64,
    playback_duration: f64,
}

impl MpdModel {
    pub fn new(
        representations: Vec<Representation>,
        base_url: &Url,
        start: u64,
        playback_duration: f64,
    ) -> Result<Self, MpdError> {
        let segment_duration = representations
            .first()
            .map(|rep| rep.segment_duration)
            .unwrap_or(0.0);
        let index = build_segment_index(&representations, base_url, start)?;
        let representations = representations
            .into_iter()
            .map(|rep| (rep.bandwidth, rep))
            .collect();

        Ok(Self {
            representations,
            index,
            segment_duration,
            playback_duration,
        })
    }

    pub fn index(&self) -> &SegmentIndex {
        &self.index
    }

    pub fn segment_duration(&self) -> f64 {
        self.segment_duration
    }

    pub fn playback_duration(&self) -> f64 {
        self.playback_duration
    }

    /// Bitrates of every representation, ascending.
    pub fn bitrates_sorted_asc(&self) -> Vec<u64> {
        self.representations.keys().copied().collect()
    }

    pub fn resolve_url(&self, segment_number: u64, bitrate: u64) -> Result<&Url, MpdError> {
        self.index.url_for(segment_number, bitrate)
    }

    /// Bitrate -> bytes for the
    /// media segment at absolute `segment_number`. The initialization
    /// segment (`segment_number == start`) has no representative size
    /// and reports zero for every bitrate.
    pub fn segment_sizes_at(&self, segment_number: u64) -> BTreeMap<u64, u64> {
        let start = self.index.start();
        if segment_number <= start {
            return self
                .representations
                .keys()
                .map(|&b| (b, 0))
                .collect();
        }
        let media_index = (segment_number - start - 1) as usize;
        self.representations
            .iter()
            .map(|(&bandwidth, rep)| {
                let size = rep.segment_sizes.get(media_index).copied().unwrap_or(0);
                (bandwidth, size)
            })
            .collect()
    }

    /// Arithmetic mean per
    /// bitrate; bitrates with no samples report zero.
    pub fn average_segment_sizes(&self) -> BTreeMap<u64, u64> {
        self.representations
            .iter()
            .map(|(&bandwidth, rep)| {
                if rep.segment_sizes.is_empty() {
                    (bandwidth, 0)
                } else {
                    let sum: u64 = rep.segment_sizes.iter().sum();
                    (bandwidth, sum / rep.segment_sizes.len() as u64)
                }
            })
            .collect()
    }
}
