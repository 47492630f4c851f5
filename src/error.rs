//! Error taxonomy for the security library.
//!
//! Validation failures and admission denials are *values*, not errors: they
//! come back as [`crate::validation::ValidationResult`] and
//! [`crate::admission::Admission`]. The variants here cover the failures
//! that must propagate to callers (cryptography) or that persistence code
//! logs and absorbs at its boundary (storage, serialization).

use thiserror::Error;

/// Errors surfaced by the security subsystems.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// Ciphertext token is malformed: bad base64, or shorter than one IV.
    #[error("invalid ciphertext token: {0}")]
    InvalidCiphertext(String),

    /// AES-GCM operation failed. Covers tag-verification failure on decrypt;
    /// the payload is deliberately not echoed back.
    #[error("cryptographic operation failed: {0}")]
    Crypto(String),

    /// Key material could not be loaded or persisted during lazy init.
    #[error("encryption key unavailable: {0}")]
    KeyUnavailable(String),

    /// Local store read/write failure.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// JSON (de)serialization failure in the local store or event export.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Shorthand result type used throughout the crate.
pub type SecurityResult<T> = Result<T, SecurityError>;
