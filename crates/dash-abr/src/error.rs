use thiserror::Error;

#[derive(Debug, Error)]
pub enum AbrError {
    #[error("representation has no bitrates to choose from")]
    NoBitrates,
}
