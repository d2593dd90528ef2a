//! Error types for onroad-alerts

use thiserror::Error;

/// Errors that can occur while resolving, arbitrating, or publishing alerts
///
/// Arbitration itself never fails; these cover the collaborators around it
/// (bus transport, configuration, supervised processes).
#[derive(Debug, Error)]
pub enum AlertError {
    /// Bus connection failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Publish failure
    #[error("Failed to publish on channel '{channel}': {reason}")]
    Publish {
        channel: String,
        reason: String,
    },

    /// Subscribe failure
    #[error("Failed to subscribe to channel '{channel}': {reason}")]
    Subscribe {
        channel: String,
        reason: String,
    },

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parse failure
    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML write failure
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Event or event type name that is not part of the catalogue
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Supervised process failure
    #[error("Process '{name}': {reason}")]
    Process {
        name: String,
        reason: String,
    },

    /// Timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),
}

/// Result type alias for alert operations
pub type Result<T> = std::result::Result<T, AlertError>;
