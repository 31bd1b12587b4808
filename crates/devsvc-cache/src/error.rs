//! Cache contract errors

use thiserror::Error;

use devsvc_core::ServiceError;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Name (or id) already present
    #[error("{kind} {key} already exists in cache")]
    AlreadyExists { kind: &'static str, key: String },

    /// Id or name absent
    #[error("{kind} {key} does not exist in cache")]
    NotFound { kind: &'static str, key: String },

    /// Entity breaks a cache invariant
    #[error("invalid {kind}: {reason}")]
    Invalid { kind: &'static str, reason: String },
}

impl CacheError {
    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        CacheError::NotFound {
            kind,
            key: key.into(),
        }
    }

    pub fn already_exists(kind: &'static str, key: impl Into<String>) -> Self {
        CacheError::AlreadyExists {
            kind,
            key: key.into(),
        }
    }
}

impl From<CacheError> for ServiceError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::NotFound { .. } => ServiceError::NotFound(err.to_string()),
            CacheError::AlreadyExists { .. } | CacheError::Invalid { .. } => {
                ServiceError::BadRequest(err.to_string())
            }
        }
    }
}
