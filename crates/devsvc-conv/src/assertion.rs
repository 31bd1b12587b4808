//! Assertion and value mapping

use devsvc_core::{CommandValue, ResourceOperation};

use crate::error::{ConvError, ConvResult};

/// Compare the value's canonical string form against a declared assertion.
///
/// An undeclared (or empty) assertion always passes. The caller decides
/// what a failure does to the owning device.
pub fn check_assertion(cv: &CommandValue, assertion: Option<&str>) -> ConvResult<()> {
    let Some(expected) = assertion.filter(|a| !a.is_empty()) else {
        return Ok(());
    };
    let actual = cv.value_to_string()?;
    if actual != expected {
        return Err(ConvError::AssertionFailed {
            expected: expected.to_string(),
            actual,
        });
    }
    Ok(())
}

/// Look up the value's canonical string in its resource operation's
/// mapping table.
///
/// The operation carried by the value wins; `fallback` is used for values
/// that arrive without one. On a hit returns a string value carrying the
/// mapped text, with the same object name, origin and operation; on a miss
/// (or no table) returns `None`.
pub fn map_value(cv: &CommandValue, fallback: Option<&ResourceOperation>) -> Option<CommandValue> {
    let ro = cv.operation.as_ref().or(fallback)?;
    if ro.mappings.is_empty() {
        return None;
    }
    let key = cv.value_to_string().ok()?;
    let mapped = ro.mappings.get(&key)?;
    let mut out = CommandValue::string(cv.ro.clone(), cv.origin, mapped.clone());
    out.operation = cv.operation.clone();
    Some(out)
}
