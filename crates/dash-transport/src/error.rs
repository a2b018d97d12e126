use thiserror::Error;

/// Errors raised by the transport multiplexer.
///
/// A [`TransportError`] is always fatal to the segment in flight — a
/// *recoverable* fault (child crash, dropped connection) is not an error at
/// all, it is the `Recoverable` arm of [`crate::FetchResult`], handled
/// locally by reopening the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport fault is fatal: {0}")]
    Fatal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to spawn helper process `{binary}`: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("helper process exited before emitting the `started` token")]
    HelperExitedDuringStartup,

    #[error("transport has not been opened")]
    NotOpen,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}
