//! Shared web helpers: JSON response writing and the typed request error.

mod error;
mod response;

pub use error::{ErrorResponse, FieldError, RequestError};
pub use response::{respond, respond_error};
