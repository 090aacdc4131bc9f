// Central error type for the engine

use thiserror::Error;

/// Engine-level error type
#[derive(Error, Debug)]
pub enum QueueError {
    #[error("domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("message source error: {0}")]
    Source(#[from] crate::port::SourceError),

    #[error("message handler error: {0}")]
    Handler(#[from] crate::port::HandlerError),
}

/// Result type alias using QueueError
pub type Result<T> = std::result::Result<T, QueueError>;
