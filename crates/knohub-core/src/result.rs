//! Convenience result type alias for KnoHub.

use crate::error::AppError;

/// A specialized `Result` type for KnoHub operations.
pub type AppResult<T> = Result<T, AppError>;
