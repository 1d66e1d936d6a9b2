//! Request bodies and path parameters.

mod unified;

pub use unified::{TaskPathParams, UnifiedRequest};
