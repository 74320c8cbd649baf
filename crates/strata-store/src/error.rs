use std::path::PathBuf;

/// Errors from blob storage operations.
///
/// The `Display` form is sent to clients verbatim after `FAIL: `, so each
/// variant names the key or path it concerns.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Filesystem failure while performing `op` on `path`.
    #[error("{source}, {op} '{}'", path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The path policy refused to map the key onto the filesystem.
    #[error("path rejected '{key}': {reason}")]
    PathRejected { key: String, reason: String },

    /// No blob is stored under the key (non-filesystem backends).
    #[error("blob not found: {0}")]
    NotFound(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_operation_and_path() {
        let err = StoreError::Io {
            op: "open",
            path: PathBuf::from("/tmp/missing"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not here"),
        };
        assert_eq!(err.to_string(), "not here, open '/tmp/missing'");
    }
}
