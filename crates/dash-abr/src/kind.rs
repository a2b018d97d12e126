use crate::basic::BasicPolicy;
use crate::netflix::NetflixPolicy;
use crate::policy::AdaptationPolicy;
use crate::sara::SaraPolicy;

/// Which of the three bitrate-selection strategies to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Basic,
    Sara,
    Netflix,
}

impl PolicyKind {
    /// Build a fresh policy instance, seeded with the representation's
    /// lowest bitrate as its starting point.
    pub fn build(self, lowest_bitrate: u64) -> Box<dyn AdaptationPolicy> {
        match self {
            PolicyKind::Basic => Box::new(BasicPolicy::new(lowest_bitrate)),
            PolicyKind::Sara => Box::new(SaraPolicy::new(lowest_bitrate)),
            PolicyKind::Netflix => Box::new(NetflixPolicy::new(lowest_bitrate)),
        }
    }
}
