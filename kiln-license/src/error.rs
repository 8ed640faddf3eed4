//! Error types for the licensing module.

use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// The license server could not be reached (transport failure,
    /// timeout, or non-success HTTP status).
    #[error("license server unreachable: {0}")]
    Unreachable(String),

    /// The license server explicitly rejected the key/email pair.
    #[error("license rejected: {0}")]
    Rejected(String),

    /// The server answered but the payload did not parse.
    #[error("malformed server response: {0}")]
    MalformedResponse(String),

    /// Subscription is past its expiry date.
    #[error("license expired on {0}")]
    Expired(String),

    /// No license record exists on this installation.
    #[error("license not activated")]
    NotActivated,

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Returns true if this error means the server could not give a
    /// verdict at all, which is when the offline grace window applies.
    /// An explicit rejection is a verdict and never falls back to grace.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::MalformedResponse(_))
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
