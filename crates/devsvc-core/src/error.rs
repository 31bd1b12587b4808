//! Error taxonomy for command dispatch and model validation

use thiserror::Error;

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to callers of the command surface
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Unknown device, command, resource operation or device object
    #[error("Not found: {0}")]
    NotFound(String),

    /// Device is administratively locked
    #[error("Locked: {0}")]
    Locked(String),

    /// Malformed write body, unparsable parameter or unknown value descriptor
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal inconsistency, driver failure or exceeded operation ceiling
    #[error("Server error: {0}")]
    ServerError(String),

    /// One or more values failed transformation or assertion.
    ///
    /// Non-fatal: it is reported next to an otherwise complete event.
    #[error("Transform failure: {0}")]
    TransformFailure(String),
}

impl ServiceError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 404,
            ServiceError::Locked(_) => 423,
            ServiceError::BadRequest(_) => 400,
            ServiceError::ServerError(_) => 500,
            ServiceError::TransformFailure(_) => 500,
        }
    }

    /// Short machine-readable kind, used in response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Locked(_) => "locked",
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::ServerError(_) => "server_error",
            ServiceError::TransformFailure(_) => "transform_failure",
        }
    }

    /// The message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            ServiceError::NotFound(m)
            | ServiceError::Locked(m)
            | ServiceError::BadRequest(m)
            | ServiceError::ServerError(m)
            | ServiceError::TransformFailure(m) => m,
        }
    }
}

/// Errors raised while building or validating model values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Value type name not recognised
    #[error("unknown value type: {0}")]
    UnknownValueType(String),

    /// Direction other than get/set
    #[error("unknown direction: {0}")]
    UnknownDirection(String),

    /// Encoded numeric value has the wrong width for its type
    #[error("{value_type} value must be {expected} bytes, got {actual}")]
    InvalidWidth {
        value_type: String,
        expected: usize,
        actual: usize,
    },

    /// Attempt to store a value of one type into a value of another
    #[error("cannot store {actual} value into {expected} command value")]
    TypeMismatch { expected: String, actual: String },

    /// A resource operation points at a device object that is not declared
    #[error("profile {profile}: resource operation references unknown device object {object}")]
    UnknownDeviceObject { profile: String, object: String },
}
