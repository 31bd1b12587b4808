//! devsvc-conv - Value conversion for the device service
//!
//! Pure functions applied to [`CommandValue`](devsvc_core::CommandValue)s
//! between the driver and the outside world:
//!
//! - [`transform_read`] / [`transform_write`]: base, scale and offset correction
//! - [`check_assertion`]: compare a reading against its declared expected value
//! - [`map_value`]: substitute a value through a resource operation's mapping table
//! - [`parse_param`]: turn write-body text into a typed value

pub mod assertion;
pub mod error;
pub mod parse;
pub mod transform;

pub use assertion::{check_assertion, map_value};
pub use error::{ConvError, ConvResult};
pub use parse::parse_param;
pub use transform::{transform_read, transform_write};
