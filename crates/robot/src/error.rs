//! Error types for event dispatch.
//!
//! Handler code reports failures as [`anyhow::Error`]; everything the
//! dispatch machinery itself can fail with is an [`Error`].

use hubbot_protocol::ProtocolError;

/// Errors that can occur while dispatching events or loading config.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The event lacks information needed for the operation.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A GitHub call failed.
    #[error(transparent)]
    GitHub(#[from] hubbot_github::Error),

    /// A repository config file is not a valid, safe YAML mapping.
    #[error("invalid config file {path}: {reason}")]
    ConfigFormat {
        /// Repository path of the offending file.
        path: String,
        /// What is wrong with it.
        reason: String,
    },

    /// No application is registered under the requested name.
    #[error("no app registered as '{name}'")]
    UnknownApp {
        /// The requested name.
        name: String,
    },

    /// At least one handler failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl Error {
    /// Returns operator advice if this error, or a handler error it carries,
    /// stems from a private key or app assertion misconfiguration.
    ///
    /// Handler errors are searched through their whole cause chain.
    #[must_use]
    pub fn credential_hint(&self) -> Option<&'static str> {
        match self {
            Self::GitHub(e) => e.credential_hint(),
            Self::Dispatch(dispatch) => dispatch.first.chain().find_map(|cause| {
                if let Some(e) = cause.downcast_ref::<Error>() {
                    e.credential_hint()
                } else {
                    cause
                        .downcast_ref::<hubbot_github::Error>()
                        .and_then(hubbot_github::Error::credential_hint)
                }
            }),
            _ => None,
        }
    }
}

/// Aggregate failure of a dispatch group.
///
/// Carries the first error by completion time; the others were logged when
/// they occurred.
#[derive(Debug, thiserror::Error)]
#[error("{failed} of {total} {group} failed; first error: {first:#}")]
pub struct DispatchError {
    /// The first error observed.
    pub first: anyhow::Error,
    /// How many members of the group failed.
    pub failed: usize,
    /// How many members the group had.
    pub total: usize,
    /// What the members were, e.g. `handlers` or `apps`.
    pub group: &'static str,
}

/// A specialized Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, Error>;
