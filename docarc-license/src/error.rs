//! Error types for the license protocol.

use thiserror::Error;

/// License protocol errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Requested validity duration is out of range.
    #[error("invalid duration: {0} days (expected 1..=3650)")]
    InvalidDuration(u32),

    /// The activation secret is empty.
    #[error("activation secret must not be empty")]
    EmptySecret,
}

/// Result type for license protocol operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
