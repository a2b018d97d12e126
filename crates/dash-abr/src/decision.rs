/// What a policy returns for a single upcoming segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// The bitrate to fetch the next segment at.
    pub next_bitrate: u64,
    /// How long to hold off before fetching, in units of segment duration.
    /// The driver multiplies this by the representation's segment duration
    /// to get a sleep in seconds. Zero means fetch immediately.
    pub delay_segments: f64,
}
