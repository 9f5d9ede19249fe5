//! Result type alias

use crate::error::ScError;

/// Standard Result type for service center operations
pub type ScResult<T> = Result<T, ScError>;
