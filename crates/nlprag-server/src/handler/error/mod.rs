//! [`Error`], [`ErrorKind`] and [`Result`].

mod http_error;
mod pipeline_error;

pub use http_error::{Error, ErrorKind, Result};
