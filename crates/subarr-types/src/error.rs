//! Common error types

use thiserror::Error;

/// Errors shared across the subarr crates
#[derive(Error, Debug)]
pub enum SubarrError {
    /// Unrecognized quality value
    #[error("invalid quality: {0}")]
    InvalidQuality(String),

    /// Unrecognized subscription status
    #[error("invalid status: {0}")]
    InvalidStatus(String),
}
