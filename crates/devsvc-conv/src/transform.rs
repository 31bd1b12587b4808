//! Base / scale / offset correction
//!
//! Read:  `v = base^v`, then `v = v * scale`, then `v = v + offset`
//! Write: `v = v - offset`, then `v = v / scale`, then `v = log_base(v)`
//!
//! Each step runs only when its parameter is declared. A base of zero
//! disables the exponent step in both directions. Arithmetic is done in
//! `f64` and the result narrowed back to the value's declared type.

use devsvc_core::{CommandValue, PropertyValue, Scalar};

use crate::error::{ConvError, ConvResult};

/// Relative distance from an integer below which a result is treated as
/// that integer before narrowing.
const INTEGER_SNAP: f64 = 1e-9;

/// Apply the read-direction correction in place.
///
/// String and bool values are left untouched.
pub fn transform_read(cv: &mut CommandValue, pv: &PropertyValue) -> ConvResult<()> {
    if !cv.value_type.is_numeric() {
        return Ok(());
    }

    if let Some(base) = pv.base() {
        let b = parse_param("base", base)?;
        if b != 0.0 {
            apply(cv, |v| b.powf(v))?;
        }
    }
    if let Some(scale) = pv.scale() {
        let s = parse_param("scale", scale)?;
        apply(cv, |v| v * s)?;
    }
    if let Some(offset) = pv.offset() {
        let o = parse_param("offset", offset)?;
        apply(cv, |v| v + o)?;
    }
    Ok(())
}

/// Apply the write-direction correction in place, inverse of [`transform_read`].
///
/// A declared scale of zero is an error.
pub fn transform_write(cv: &mut CommandValue, pv: &PropertyValue) -> ConvResult<()> {
    if !cv.value_type.is_numeric() {
        return Ok(());
    }

    if let Some(offset) = pv.offset() {
        let o = parse_param("offset", offset)?;
        apply(cv, |v| v - o)?;
    }
    if let Some(scale) = pv.scale() {
        let s = parse_param("scale", scale)?;
        if s == 0.0 {
            return Err(ConvError::ZeroScale);
        }
        apply(cv, |v| v / s)?;
    }
    if let Some(base) = pv.base() {
        let b = parse_param("base", base)?;
        if b != 0.0 {
            apply(cv, |v| v.ln() / b.ln())?;
        }
    }
    Ok(())
}

fn parse_param(name: &'static str, value: &str) -> ConvResult<f64> {
    value.trim().parse::<f64>().map_err(|_| {
        tracing::error!(name, value, "PropertyValue parameter is not a number");
        ConvError::InvalidParameter {
            name,
            value: value.to_string(),
        }
    })
}

fn apply(cv: &mut CommandValue, f: impl FnOnce(f64) -> f64) -> ConvResult<()> {
    let current = cv
        .scalar()?
        .as_f64()
        .ok_or(ConvError::NotNumeric(cv.value_type))?;
    let next = narrow(cv, f(current))?;
    cv.set_scalar(next)?;
    Ok(())
}

/// Convert back to the value's type, truncating toward zero for integers
fn narrow(cv: &CommandValue, v: f64) -> ConvResult<Scalar> {
    let v = if cv.value_type.is_float() {
        v
    } else {
        snap_to_integer(v)
    };
    Scalar::from_f64(cv.value_type, v).ok_or(ConvError::NotNumeric(cv.value_type))
}

fn snap_to_integer(v: f64) -> f64 {
    let nearest = v.round();
    if (v - nearest).abs() <= INTEGER_SNAP * nearest.abs().max(1.0) {
        nearest
    } else {
        v
    }
}
