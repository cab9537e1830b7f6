//! Error types for signature tracking.

use std::fmt::{Display, Formatter};

/// Result type for tracking operations.
pub type TrackResult<T> = Result<T, TrackError>;

/// Tracking errors. Creation is all-or-nothing: any validation variant
/// means no row was persisted.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    /// No owner record supplied for the signature.
    #[error("signature owner is required")]
    MissingOwner,

    /// No signing user supplied.
    #[error("signature user is required")]
    MissingUser,

    /// A physician countersignature without an effective date.
    #[error("effective date is required when a physician signs")]
    MissingEffectiveDate,

    /// Error from the underlying SQLite storage.
    #[error("sqlite error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl TrackError {
    /// Returns true for the validation variants (as opposed to storage
    /// failures).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingOwner | Self::MissingUser | Self::MissingEffectiveDate
        )
    }
}

#[derive(Debug)]
pub struct ConfigError(pub String);

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfigError: {}", self.0)
    }
}
impl std::error::Error for ConfigError {}
