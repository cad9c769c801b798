//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers and error types used across the diagnosis domain.

mod errors;
mod ids;

pub use errors::{ErrorCode, ValidationError};
pub use ids::RunId;
