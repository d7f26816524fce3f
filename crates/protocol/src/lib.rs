//! Shared protocol types for hubbot.
//!
//! This crate defines the data model every other hubbot crate works with:
//! the webhook event record, the patterns handlers are registered under, and
//! the repository/issue coordinates derived from event payloads. It performs
//! no I/O.
//!
//! # Overview
//!
//! - [`event`]: [`WebhookEvent`] and [`InstallationId`]
//! - [`pattern`]: [`EventPattern`], the `*` / `name` / `name.action` matcher
//! - [`repo`]: [`RepoRef`], [`IssueRef`] and parameter-map helpers
//! - [`error`]: Error types for protocol operations
//!
//! # Examples
//!
//! ```
//! use hubbot_protocol::{EventPattern, RepoRef, WebhookEvent};
//! use serde_json::json;
//!
//! let event = WebhookEvent::new(
//!     "issues",
//!     json!({
//!         "action": "opened",
//!         "repository": {"name": "probot", "owner": {"login": "bkeepers"}},
//!     }),
//! );
//!
//! let pattern: EventPattern = "issues.opened".parse().unwrap();
//! assert!(pattern.matches(&event));
//!
//! let repo = RepoRef::from_payload(event.payload()).unwrap();
//! assert_eq!(repo.full_name(), "bkeepers/probot");
//! ```

pub mod error;
pub mod event;
pub mod pattern;
pub mod repo;

// Re-export primary types at crate root for convenience
pub use error::{ProtocolError, Result};
pub use event::{InstallationId, WebhookEvent};
pub use pattern::EventPattern;
pub use repo::{IssueRef, RepoRef, issue_params, repo_params};
