//! Error types for GitHub operations.
//!
//! This module defines the error types that can occur while issuing
//! installation credentials and fetching repository contents. A missing
//! file is reported as [`Error::NotFound`] so callers can treat it as a
//! designed outcome rather than a failure.

/// Operator-facing advice for private key and app assertion failures.
pub const PRIVATE_KEY_HINT: &str = "Your private key (usually a .pem file) is not correct. \
Go to https://github.com/settings/apps/YOUR_APP and generate a new PEM file.";

/// Message GitHub returns when it cannot decode an app assertion.
const UNDECODABLE_JWT: &str = "A JSON web token could not be decoded";

/// Errors that can occur during GitHub operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An error occurred while calling the GitHub API.
    #[error("GitHub API error: {0}")]
    Api(#[from] octocrab::Error),

    /// The requested repository file does not exist.
    #[error("file not found: {path}")]
    NotFound {
        /// The repository path that was requested.
        path: String,
    },

    /// The requested path exists but is not a single file with content.
    #[error("not a file: {path}")]
    NotAFile {
        /// The repository path that was requested.
        path: String,
    },

    /// File content could not be decoded from its transport encoding.
    #[error("failed to decode content of {path}: {reason}")]
    Decode {
        /// The repository path that was requested.
        path: String,
        /// What went wrong.
        reason: String,
    },

    /// The app assertion could not be created.
    #[error("failed to sign app assertion: {0}")]
    Assertion(#[from] jsonwebtoken::errors::Error),

    /// The event lacks information needed for the operation.
    #[error(transparent)]
    Protocol(#[from] hubbot_protocol::ProtocolError),
}

impl Error {
    /// Returns `true` if this error means the requested file does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns advice for an operator if this error looks like a private
    /// key or app assertion misconfiguration.
    ///
    /// # Examples
    ///
    /// ```
    /// use hubbot_github::Error;
    ///
    /// let err = Error::NotFound { path: ".github/bot.yml".to_string() };
    /// assert!(err.credential_hint().is_none());
    /// ```
    #[must_use]
    pub fn credential_hint(&self) -> Option<&'static str> {
        match self {
            Self::Assertion(_) => Some(PRIVATE_KEY_HINT),
            Self::Api(octocrab::Error::GitHub { source, .. })
                if source.message.contains(UNDECODABLE_JWT) =>
            {
                Some(PRIVATE_KEY_HINT)
            }
            _ => None,
        }
    }
}

/// A specialized Result type for GitHub operations.
pub type Result<T> = std::result::Result<T, Error>;
