//! GitHub collaborators for hubbot.
//!
//! This crate turns a GitHub App's identity into installation-scoped API
//! clients, and fetches repository files on behalf of apps.
//!
//! # Overview
//!
//! - [`AppAssertion`] and [`AppAuthenticator`]: Sign app assertions and
//!   exchange them for installation tokens
//! - [`CredentialCache`]: Reuse installation clients, one issuance at a time
//! - [`GitHubClient`]: The authenticated handle given to apps
//! - [`ContentSource`] and [`decode_content`]: Fetch and decode repository files
//! - [`Error`]: Error types for GitHub operations
//!
//! # Security
//!
//! Tokens are handled as [`secrecy::SecretString`] and never appear in
//! `Debug` output.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use hubbot_github::{AppAssertion, AppAuthenticator, CredentialCache};
//! use hubbot_protocol::InstallationId;
//!
//! # async fn example(pem: &[u8]) -> hubbot_github::Result<()> {
//! let authenticator = AppAuthenticator::new(AppAssertion::from_rsa_pem(1234, pem)?);
//! let cache = CredentialCache::new(Arc::new(authenticator));
//!
//! let github = cache.get_client(InstallationId(42)).await?;
//! let user = github.inner().current().user().await?;
//! println!("acting as {}", user.login);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cache;
pub mod client;
pub mod contents;
pub mod error;

// Re-export primary types at crate root for convenience
pub use auth::{AppAssertion, AppAuthenticator, InstallationToken, TokenIssuer};
pub use cache::CredentialCache;
pub use client::GitHubClient;
pub use contents::{ContentSource, decode_content};
pub use error::{Error, PRIVATE_KEY_HINT, Result};
