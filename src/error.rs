//! Error types for the hammer host

use thiserror::Error;

use crate::plugins::ActivationError;

/// Result type alias for hammer operations
pub type Result<T> = std::result::Result<T, Error>;

/// A single failed plugin activation within a batch
#[derive(Debug)]
pub struct FailedActivation {
    /// Folder the plugin was discovered in
    pub folder: std::path::PathBuf,
    /// Why activation failed
    pub error: ActivationError,
}

/// Errors that can occur in the hammer host
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication/authorization error
    #[error("auth error: {0}")]
    Auth(String),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// Resource not found
    #[error("not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Single plugin activation failure
    #[error("plugin error: {0}")]
    Plugin(#[from] ActivationError),

    /// A plugin-provided hook failed
    #[error("plugin {name} hook failed: {reason}")]
    PluginHook {
        /// Plugin name
        name: String,
        /// Error the hook returned
        reason: String,
    },

    /// Aggregate plugin batch failure: the whole `initialize()` call failed
    /// because at least one constituent activation failed. Successfully
    /// activated plugins keep their registered capabilities.
    #[error("{} plugin activation(s) failed", .failures.len())]
    PluginBatch {
        /// Every failed activation with its folder
        failures: Vec<FailedActivation>,
    },
}
