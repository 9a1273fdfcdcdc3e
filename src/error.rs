//! Error types for tourtrack
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in tourtrack
#[derive(Debug, Error)]
pub enum TourtrackError {
    /// User not present in the registry
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Location provider failure (network, status, malformed body)
    #[error("Locator error: {0}")]
    Locator(String),

    /// Reward scoring or reward points lookup failure
    #[error("Scoring error: {0}")]
    Scoring(String),

    /// Trip pricing provider failure
    #[error("Pricing error: {0}")]
    Pricing(String),

    /// User registry could not be read
    #[error("Registry error: {0}")]
    Registry(String),

    /// Configuration that cannot be used to build the tracker
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Operation not allowed in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias for tourtrack operations
pub type Result<T> = std::result::Result<T, TourtrackError>;
