//! Shared request and response types for the HTTP API

pub mod error;
pub mod json;
pub mod query;

pub use error::{ApiError, ApiErrorKind, ApiErrorResponse};
pub use json::{Json, ValidatedJson};
pub use query::Query;
