//! Typed command values
//!
//! A [`CommandValue`] is one reading or write argument exchanged with the
//! driver. Numeric and boolean payloads are held in a canonical big-endian
//! byte encoding sized exactly to the value type; strings are held as text.
//! [`Scalar`] is the decoded, typed view of that payload.

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::models::ResourceOperation;

/// Declared type of a device object or command value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    Bool,
    String,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
}

impl ValueType {
    /// Width of the canonical encoding in bytes; zero for strings
    pub fn byte_size(&self) -> usize {
        match self {
            ValueType::String => 0,
            ValueType::Bool | ValueType::Uint8 | ValueType::Int8 => 1,
            ValueType::Uint16 | ValueType::Int16 => 2,
            ValueType::Uint32 | ValueType::Int32 | ValueType::Float32 => 4,
            ValueType::Uint64 | ValueType::Int64 | ValueType::Float64 => 8,
        }
    }

    /// Integer or floating point
    pub fn is_numeric(&self) -> bool {
        !matches!(self, ValueType::Bool | ValueType::String)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ValueType::Float32 | ValueType::Float64)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Bool => "Bool",
            ValueType::String => "String",
            ValueType::Uint8 => "Uint8",
            ValueType::Uint16 => "Uint16",
            ValueType::Uint32 => "Uint32",
            ValueType::Uint64 => "Uint64",
            ValueType::Int8 => "Int8",
            ValueType::Int16 => "Int16",
            ValueType::Int32 => "Int32",
            ValueType::Int64 => "Int64",
            ValueType::Float32 => "Float32",
            ValueType::Float64 => "Float64",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim().to_ascii_lowercase().as_str() {
            "bool" => ValueType::Bool,
            "string" => ValueType::String,
            "uint8" => ValueType::Uint8,
            "uint16" => ValueType::Uint16,
            "uint32" => ValueType::Uint32,
            "uint64" => ValueType::Uint64,
            "int8" => ValueType::Int8,
            "int16" => ValueType::Int16,
            "int32" => ValueType::Int32,
            "int64" => ValueType::Int64,
            "float32" => ValueType::Float32,
            "float64" => ValueType::Float64,
            _ => return Err(ModelError::UnknownValueType(s.to_string())),
        };
        Ok(ty)
    }
}

impl TryFrom<String> for ValueType {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValueType> for String {
    fn from(value: ValueType) -> Self {
        value.as_str().to_string()
    }
}

/// Decoded value of a [`CommandValue`]
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    String(String),
    Uint8(u8),
    Uint16(u16),
    Uint32(u32),
    Uint64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
}

impl Scalar {
    pub fn value_type(&self) -> ValueType {
        match self {
            Scalar::Bool(_) => ValueType::Bool,
            Scalar::String(_) => ValueType::String,
            Scalar::Uint8(_) => ValueType::Uint8,
            Scalar::Uint16(_) => ValueType::Uint16,
            Scalar::Uint32(_) => ValueType::Uint32,
            Scalar::Uint64(_) => ValueType::Uint64,
            Scalar::Int8(_) => ValueType::Int8,
            Scalar::Int16(_) => ValueType::Int16,
            Scalar::Int32(_) => ValueType::Int32,
            Scalar::Int64(_) => ValueType::Int64,
            Scalar::Float32(_) => ValueType::Float32,
            Scalar::Float64(_) => ValueType::Float64,
        }
    }

    /// Widen a numeric value to `f64`; `None` for strings and bools
    pub fn as_f64(&self) -> Option<f64> {
        let v = match *self {
            Scalar::Uint8(v) => v as f64,
            Scalar::Uint16(v) => v as f64,
            Scalar::Uint32(v) => v as f64,
            Scalar::Uint64(v) => v as f64,
            Scalar::Int8(v) => v as f64,
            Scalar::Int16(v) => v as f64,
            Scalar::Int32(v) => v as f64,
            Scalar::Int64(v) => v as f64,
            Scalar::Float32(v) => v as f64,
            Scalar::Float64(v) => v,
            Scalar::Bool(_) | Scalar::String(_) => return None,
        };
        Some(v)
    }

    /// Narrow an `f64` back into a numeric type.
    ///
    /// Float-to-integer conversion truncates toward zero and saturates at
    /// the bounds of the target type; NaN becomes zero.
    pub fn from_f64(value_type: ValueType, v: f64) -> Option<Scalar> {
        let s = match value_type {
            ValueType::Uint8 => Scalar::Uint8(v as u8),
            ValueType::Uint16 => Scalar::Uint16(v as u16),
            ValueType::Uint32 => Scalar::Uint32(v as u32),
            ValueType::Uint64 => Scalar::Uint64(v as u64),
            ValueType::Int8 => Scalar::Int8(v as i8),
            ValueType::Int16 => Scalar::Int16(v as i16),
            ValueType::Int32 => Scalar::Int32(v as i32),
            ValueType::Int64 => Scalar::Int64(v as i64),
            ValueType::Float32 => Scalar::Float32(v as f32),
            ValueType::Float64 => Scalar::Float64(v),
            ValueType::Bool | ValueType::String => return None,
        };
        Some(s)
    }

    fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.value_type().byte_size());
        match self {
            Scalar::Bool(v) => buf.put_u8(u8::from(*v)),
            Scalar::String(_) => {}
            Scalar::Uint8(v) => buf.put_u8(*v),
            Scalar::Uint16(v) => buf.put_u16(*v),
            Scalar::Uint32(v) => buf.put_u32(*v),
            Scalar::Uint64(v) => buf.put_u64(*v),
            Scalar::Int8(v) => buf.put_i8(*v),
            Scalar::Int16(v) => buf.put_i16(*v),
            Scalar::Int32(v) => buf.put_i32(*v),
            Scalar::Int64(v) => buf.put_i64(*v),
            Scalar::Float32(v) => buf.put_f32(*v),
            Scalar::Float64(v) => buf.put_f64(*v),
        }
        buf.freeze()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{v}"),
            Scalar::String(v) => f.write_str(v),
            Scalar::Uint8(v) => write!(f, "{v}"),
            Scalar::Uint16(v) => write!(f, "{v}"),
            Scalar::Uint32(v) => write!(f, "{v}"),
            Scalar::Uint64(v) => write!(f, "{v}"),
            Scalar::Int8(v) => write!(f, "{v}"),
            Scalar::Int16(v) => write!(f, "{v}"),
            Scalar::Int32(v) => write!(f, "{v}"),
            Scalar::Int64(v) => write!(f, "{v}"),
            Scalar::Float32(v) => write!(f, "{v}"),
            Scalar::Float64(v) => write!(f, "{v}"),
        }
    }
}

/// One typed value produced by a read or consumed by a write
#[derive(Debug, Clone, PartialEq)]
pub struct CommandValue {
    /// Name of the device object this value belongs to
    pub ro: String,
    pub value_type: ValueType,
    /// Timestamp in milliseconds since the Unix epoch; zero when unset
    pub origin: i64,
    /// Resource operation the value was read or written for, when known
    pub operation: Option<ResourceOperation>,
    numeric_value: Bytes,
    string_value: Option<String>,
}

impl CommandValue {
    pub fn new(ro: impl Into<String>, origin: i64, value: Scalar) -> Self {
        let value_type = value.value_type();
        let numeric_value = value.encode();
        let string_value = match value {
            Scalar::String(s) => Some(s),
            _ => None,
        };
        Self {
            ro: ro.into(),
            value_type,
            origin,
            operation: None,
            numeric_value,
            string_value,
        }
    }

    /// Attach the resource operation this value belongs to
    pub fn with_operation(mut self, operation: ResourceOperation) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn string(ro: impl Into<String>, origin: i64, value: impl Into<String>) -> Self {
        Self::new(ro, origin, Scalar::String(value.into()))
    }

    /// Build a value from its canonical big-endian encoding.
    ///
    /// Fails when the byte count does not match the width of `value_type`.
    /// Use [`CommandValue::string`] for string values.
    pub fn from_be_bytes(
        ro: impl Into<String>,
        origin: i64,
        value_type: ValueType,
        bytes: impl Into<Bytes>,
    ) -> Result<Self, ModelError> {
        let bytes = bytes.into();
        if value_type == ValueType::String || bytes.len() != value_type.byte_size() {
            return Err(ModelError::InvalidWidth {
                value_type: value_type.to_string(),
                expected: value_type.byte_size(),
                actual: bytes.len(),
            });
        }
        Ok(Self {
            ro: ro.into(),
            value_type,
            origin,
            operation: None,
            numeric_value: bytes,
            string_value: None,
        })
    }

    /// Canonical big-endian encoding; empty for strings
    pub fn numeric_bytes(&self) -> &Bytes {
        &self.numeric_value
    }

    /// Decode the typed value
    pub fn scalar(&self) -> Result<Scalar, ModelError> {
        let b = &self.numeric_value[..];
        let expected = self.value_type.byte_size();
        if self.value_type != ValueType::String && b.len() != expected {
            return Err(ModelError::InvalidWidth {
                value_type: self.value_type.to_string(),
                expected,
                actual: b.len(),
            });
        }
        let s = match self.value_type {
            ValueType::String => Scalar::String(self.string_value.clone().unwrap_or_default()),
            ValueType::Bool => Scalar::Bool(b[0] != 0),
            ValueType::Uint8 => Scalar::Uint8(b[0]),
            ValueType::Int8 => Scalar::Int8(b[0] as i8),
            ValueType::Uint16 => Scalar::Uint16(u16::from_be_bytes([b[0], b[1]])),
            ValueType::Int16 => Scalar::Int16(i16::from_be_bytes([b[0], b[1]])),
            ValueType::Uint32 => Scalar::Uint32(u32::from_be_bytes(be4(b))),
            ValueType::Int32 => Scalar::Int32(i32::from_be_bytes(be4(b))),
            ValueType::Float32 => Scalar::Float32(f32::from_be_bytes(be4(b))),
            ValueType::Uint64 => Scalar::Uint64(u64::from_be_bytes(be8(b))),
            ValueType::Int64 => Scalar::Int64(i64::from_be_bytes(be8(b))),
            ValueType::Float64 => Scalar::Float64(f64::from_be_bytes(be8(b))),
        };
        Ok(s)
    }

    /// Replace the value, keeping the type.
    pub fn set_scalar(&mut self, value: Scalar) -> Result<(), ModelError> {
        if value.value_type() != self.value_type {
            return Err(ModelError::TypeMismatch {
                expected: self.value_type.to_string(),
                actual: value.value_type().to_string(),
            });
        }
        self.numeric_value = value.encode();
        self.string_value = match value {
            Scalar::String(s) => Some(s),
            _ => None,
        };
        Ok(())
    }

    /// Canonical string form, used for readings, assertions and mappings
    pub fn value_to_string(&self) -> Result<String, ModelError> {
        Ok(self.scalar()?.to_string())
    }
}

fn be4(b: &[u8]) -> [u8; 4] {
    [b[0], b[1], b[2], b[3]]
}

fn be8(b: &[u8]) -> [u8; 8] {
    [b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]
}

impl fmt::Display for CommandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scalar() {
            Ok(s) => write!(f, "{}: {} ({})", self.ro, s, self.value_type),
            Err(_) => write!(f, "{}: <invalid> ({})", self.ro, self.value_type),
        }
    }
}
