//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    #[error("No {what} found with runtime version: {runtime_version}. Error: {reason}")]
    ConfigMissing {
        what: &'static str,
        runtime_version: String,
        reason: String,
    },

    #[error("invalid bundle metadata: {0}")]
    InvalidDescriptor(String),

    #[error("failed to read asset {path}: {reason}")]
    AssetRead { path: String, reason: String },

    #[error("invalid upload path: {0}")]
    InvalidUploadPath(String),

    #[error("Unsupported platform. Expected either ios or android.")]
    UnsupportedPlatform(String),

    #[error("Unsupported protocol version. Expected either 0 or 1.")]
    UnsupportedProtocolVersion(String),

    #[error("malformed multipart body: {0}")]
    Multipart(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_missing_names_runtime_version() {
        let err = Error::ConfigMissing {
            what: "update",
            runtime_version: "1.0.0".to_string(),
            reason: "file not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No update found with runtime version: 1.0.0. Error: file not found"
        );
    }
}
