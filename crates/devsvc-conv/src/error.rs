//! Error types for value conversion

use thiserror::Error;

use devsvc_core::{ModelError, ValueType};

/// Errors that can occur while transforming, checking or parsing a value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvError {
    /// Base, scale or offset is not a number
    #[error("the {name} {value} of PropertyValue cannot be parsed to float64")]
    InvalidParameter { name: &'static str, value: String },

    /// Write transform with a zero scale
    #[error("scale is 0")]
    ZeroScale,

    /// Arithmetic applied to a string or bool value
    #[error("{0} value is not numeric")]
    NotNumeric(ValueType),

    /// Parameter text does not parse into the declared type
    #[error("parsing parameter value ({value}) to {value_type} failed")]
    ParseValue { value: String, value_type: ValueType },

    /// Canonical value differs from the declared assertion
    #[error("assertion ({expected}) failed with value: {actual}")]
    AssertionFailed { expected: String, actual: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type for conversion operations
pub type ConvResult<T> = Result<T, ConvError>;
