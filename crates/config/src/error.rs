//! Error types for settings operations.
//!
//! This module defines the error types that can occur during settings
//! loading, parsing, environment overrides, and validation.

use std::path::PathBuf;

/// Errors that can occur during settings operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read a settings or key file.
    #[error("failed to read file at {path}: {source}")]
    ReadFile {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse JSON5 settings.
    #[error("failed to parse settings: {0}")]
    ParseJson5(#[from] serde_json5::Error),

    /// An environment variable holds a value of the wrong shape.
    #[error("invalid value for {name}: {reason}")]
    InvalidEnvironment {
        /// The environment variable name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// The credential TTL is not usable.
    #[error("invalid credential TTL: {reason}")]
    InvalidCredentialTtl {
        /// Why the TTL is invalid.
        reason: String,
    },

    /// No GitHub App id is configured.
    #[error("no GitHub App id configured (set app_id or HUBBOT_APP_ID)")]
    MissingAppId,

    /// No private key is configured.
    #[error(
        "no private key configured (set private_key, private_key_path, HUBBOT_PRIVATE_KEY or HUBBOT_PRIVATE_KEY_PATH)"
    )]
    MissingPrivateKey,

    /// Failed to determine home directory.
    #[error("could not determine home directory")]
    NoHomeDirectory,
}

/// A specialized Result type for settings operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
