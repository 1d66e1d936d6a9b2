//! Response bodies.

mod error_response;
mod tasks;

pub use error_response::ErrorResponse;
pub use tasks::{AcceptedTask, CollectionSize, Health};
