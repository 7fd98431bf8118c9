//! Error types for the license store and service.

use thiserror::Error;

/// Result type for store and service operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store and service operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The device code is already bound to a license.
    #[error("device already bound to a license: {0}")]
    DuplicateDevice(String),

    /// No license with the given id.
    #[error("license not found: {0}")]
    NotFound(String),

    /// Activation code does not verify for the device code.
    ///
    /// Deliberately detail-free: a malformed code, a wrong-device code and
    /// a mismatching stored code all surface identically.
    #[error("activation failed")]
    InvalidActivation,

    /// License protocol error.
    #[error(transparent)]
    License(#[from] docarc_license::LicenseError),
}
