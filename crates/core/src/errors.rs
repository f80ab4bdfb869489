//! Error types for the preference sync core.

use thiserror::Error;

use crate::preferences::PreferenceKey;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or saving preference state.
#[derive(Debug, Error)]
pub enum Error {
    /// Snapshot accessed before any fetch populated the store.
    #[error("Preference snapshot has not been loaded for this session")]
    NotLoaded,

    /// A save cycle is already in flight for this session.
    #[error("A preference save is already in progress")]
    AlreadyInProgress,

    /// The system-of-record write was rejected; nothing was committed.
    #[error("Preference authority write failed: {0}")]
    AuthorityWriteFailed(String),

    /// The initial opt-out fetch from the system of record failed.
    #[error("Preference authority fetch failed: {0}")]
    AuthorityFetchFailed(String),

    /// The downstream mirror write failed after the authority committed.
    #[error("Engagement platform write failed: {0}")]
    EngagementWriteFailed(String),

    /// Malformed static configuration, caught at load time.
    #[error("Configuration defect: {0}")]
    ConfigurationDefect(String),

    /// A preference matrix does not cover the full topic x channel space.
    #[error("Preference matrix is not total: {0}")]
    MatrixNotTotal(String),

    /// A key outside the configured topic x channel space.
    #[error("Unknown preference key: {0}")]
    UnknownPreference(PreferenceKey),
}

impl Error {
    /// Create a configuration defect error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationDefect(message.into())
    }

    /// True when the save cycle must be treated as fully failed, with no
    /// local state change.
    pub fn is_blocking(&self) -> bool {
        !matches!(self, Self::EngagementWriteFailed(_))
    }
}
