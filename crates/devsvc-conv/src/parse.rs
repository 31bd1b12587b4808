//! Parsing of externally supplied write parameters

use devsvc_core::{CommandValue, Scalar, ValueType};

use crate::error::{ConvError, ConvResult};

/// Parse parameter text into a value of `value_type`.
///
/// Integers are decimal and must fit the declared width. Bools accept
/// `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_param(
    ro: impl Into<String>,
    value_type: ValueType,
    text: &str,
    origin: i64,
) -> ConvResult<CommandValue> {
    let fail = || ConvError::ParseValue {
        value: text.to_string(),
        value_type,
    };

    let scalar = match value_type {
        ValueType::String => Scalar::String(text.to_string()),
        ValueType::Bool => Scalar::Bool(parse_bool(text).ok_or_else(fail)?),
        ValueType::Uint8 => Scalar::Uint8(text.parse().map_err(|_| fail())?),
        ValueType::Uint16 => Scalar::Uint16(text.parse().map_err(|_| fail())?),
        ValueType::Uint32 => Scalar::Uint32(text.parse().map_err(|_| fail())?),
        ValueType::Uint64 => Scalar::Uint64(text.parse().map_err(|_| fail())?),
        ValueType::Int8 => Scalar::Int8(text.parse().map_err(|_| fail())?),
        ValueType::Int16 => Scalar::Int16(text.parse().map_err(|_| fail())?),
        ValueType::Int32 => Scalar::Int32(text.parse().map_err(|_| fail())?),
        ValueType::Int64 => Scalar::Int64(text.parse().map_err(|_| fail())?),
        ValueType::Float32 => Scalar::Float32(text.parse().map_err(|_| fail())?),
        ValueType::Float64 => Scalar::Float64(text.parse().map_err(|_| fail())?),
    };
    Ok(CommandValue::new(ro, origin, scalar))
}

fn parse_bool(text: &str) -> Option<bool> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ValueType::Bool, "T", Scalar::Bool(true))]
    #[case(ValueType::Bool, "0", Scalar::Bool(false))]
    #[case(ValueType::Uint8, "255", Scalar::Uint8(255))]
    #[case(ValueType::Int16, "-300", Scalar::Int16(-300))]
    #[case(ValueType::Uint64, "18446744073709551615", Scalar::Uint64(u64::MAX))]
    #[case(ValueType::Float32, "21.5", Scalar::Float32(21.5))]
    #[case(ValueType::String, "auto", Scalar::String("auto".into()))]
    fn test_parse_ok(#[case] ty: ValueType, #[case] text: &str, #[case] expected: Scalar) {
        let cv = parse_param("x", ty, text, 1).unwrap();
        assert_eq!(cv.value_type, ty);
        assert_eq!(cv.scalar().unwrap(), expected);
    }

    #[rstest]
    #[case(ValueType::Uint8, "256")]
    #[case(ValueType::Uint8, "-1")]
    #[case(ValueType::Int32, "1.5")]
    #[case(ValueType::Int32, "0x10")]
    #[case(ValueType::Bool, "yes")]
    #[case(ValueType::Float64, "warm")]
    fn test_parse_rejects(#[case] ty: ValueType, #[case] text: &str) {
        assert_eq!(
            parse_param("x", ty, text, 0).unwrap_err(),
            ConvError::ParseValue {
                value: text.to_string(),
                value_type: ty
            }
        );
    }
}
