//! Error types for the index crate.

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// A registration payload was not valid JSON.
    #[error("invalid node descriptor: {0}")]
    InvalidDescriptor(#[from] serde_json::Error),

    /// The partition map could not be rendered or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
