//! Error types for the hubbot-protocol crate.
//!
//! This module defines the errors that can occur when interpreting webhook
//! events: malformed registration patterns and payloads that lack the
//! information an operation needs.

use thiserror::Error;

/// Errors that can occur during protocol operations.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// An event pattern was not `*`, `name`, or `name.action`.
    #[error("invalid event pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The rejected pattern.
        pattern: String,
        /// Why the pattern was rejected.
        reason: &'static str,
    },

    /// The payload has no `repository` object.
    #[error("context.repo() is not supported for this webhook event")]
    MissingRepository,

    /// The `repository` object exists but its owner cannot be determined.
    #[error("repository owner could not be determined from the payload")]
    MissingRepositoryOwner,

    /// The payload carries no issue or pull request number.
    #[error("context.issue() is not supported for this webhook event")]
    MissingIssueNumber,

    /// The payload has no `installation.id`.
    #[error("webhook event '{event}' does not reference an installation")]
    MissingInstallation {
        /// The name of the event.
        event: String,
    },
}

/// A specialized Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
