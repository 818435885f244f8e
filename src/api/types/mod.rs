pub mod error;
pub mod json;

pub use error::{ApiError, ApiErrorKind, ApiErrorResponse};
pub use json::Json;
