use thiserror::Error;

/// Errors raised while building or querying the representation/segment-index model.
#[derive(Debug, Error)]
pub enum MpdError {
    #[error("malformed MPD: {reason}")]
    Malformed { reason: String },

    #[error("representation {bandwidth} has {urls} media URLs but {sizes} segment sizes")]
    LengthMismatch {
        bandwidth: u64,
        urls: usize,
        sizes: usize,
    },

    #[error("no representations found in MPD")]
    NoRepresentations,

    #[error("unknown bitrate {bandwidth} requested")]
    UnknownBitrate { bandwidth: u64 },

    #[error("segment {segment_number} not found in the index")]
    UnknownSegment { segment_number: u64 },

    #[error("invalid URL `{input}`: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),
}
