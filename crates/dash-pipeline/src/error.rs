use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Manifest(#[from] dash_mpd::MpdError),

    #[error(transparent)]
    Transport(#[from] dash_transport::TransportError),

    #[error("invalid jump scenario `{input}`: {reason}")]
    InvalidJumpScenario { input: String, reason: String },

    #[error("buffer consumer terminated before the run finished")]
    BufferTerminated,

    #[error("failed to create run directory `{path}`: {source}")]
    RunDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to persist run report to `{path}`: {source}")]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize run report: {0}")]
    ReportSerialize(#[from] serde_json::Error),
}
