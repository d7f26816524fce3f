//! GitHub API client implementation.
//!
//! This module provides the [`GitHubClient`] struct, the authenticated
//! handle apps receive for the installation an event was delivered for.

use octocrab::Octocrab;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

/// GitHub API client with optional authentication.
///
/// Clients handed to apps are authenticated with an installation access
/// token and are scoped to that installation's repositories.
///
/// # Security
///
/// Tokens are accepted as [`SecretString`] to prevent accidental logging
/// or exposure in debug output.
///
/// # Examples
///
/// ```no_run
/// use secrecy::SecretString;
/// use hubbot_github::GitHubClient;
///
/// # async fn example() -> hubbot_github::Result<()> {
/// let token = SecretString::from("ghs_installation_token".to_string());
/// let client = GitHubClient::new(Some(token), None).await?;
/// assert!(client.is_authenticated());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct GitHubClient {
    /// The underlying octocrab client.
    inner: Octocrab,
    /// Whether this client is authenticated.
    authenticated: bool,
}

impl GitHubClient {
    /// Creates a new GitHub client.
    ///
    /// # Arguments
    ///
    /// * `token` - Bearer token sent with every request: an installation
    ///   access token, or an app assertion when talking to `/app` endpoints.
    /// * `base_url` - REST API root; `None` means `https://api.github.com`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid URI or the octocrab
    /// client fails to initialize.
    #[instrument(skip(token), fields(authenticated = token.is_some()))]
    pub async fn new(token: Option<SecretString>, base_url: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder();
        if let Some(base_url) = base_url {
            debug!("using custom API base URL");
            builder = builder.base_uri(base_url).map_err(Error::Api)?;
        }

        let authenticated = token.is_some();
        let inner = match token {
            Some(token) => builder.personal_token(token.expose_secret()).build(),
            None => builder.build(),
        }
        .map_err(Error::Api)?;

        Ok(Self {
            inner,
            authenticated,
        })
    }

    /// Returns whether this client sends a token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Returns a reference to the underlying octocrab client.
    ///
    /// Apps use this for every API call not wrapped by hubbot.
    #[must_use]
    pub fn inner(&self) -> &Octocrab {
        &self.inner
    }
}
