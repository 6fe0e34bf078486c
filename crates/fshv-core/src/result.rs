//! Result type alias for FSH validation operations

use crate::error::FshvError;

/// Standard Result type for FSH validation operations
pub type Result<T> = std::result::Result<T, FshvError>;
