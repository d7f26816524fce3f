//! Installation credential caching.
//!
//! Issuing an installation token costs a signed assertion and a round trip
//! to GitHub, so [`CredentialCache`] keeps one authenticated client per
//! installation and hands it out until it goes stale.
//!
//! # Behavior
//!
//! - A cached client is reused for the configured time-to-live (one hour by
//!   default), or until shortly before the token's own expiry if GitHub
//!   reports an earlier one.
//! - Stale entries are discarded lazily, on the next lookup for the same
//!   installation. Nothing runs in the background.
//! - At most one issuance is in flight per installation. Concurrent callers
//!   for the same installation wait for it and share its result.
//! - A failed issuance is not cached. Its caller gets the error and the next
//!   caller in line, waiting or not, issues again.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use hubbot_github::{AppAssertion, AppAuthenticator, CredentialCache};
//! use hubbot_protocol::InstallationId;
//!
//! # async fn example(pem: &[u8]) -> hubbot_github::Result<()> {
//! let issuer = AppAuthenticator::new(AppAssertion::from_rsa_pem(1234, pem)?);
//! let cache = CredentialCache::new(Arc::new(issuer));
//!
//! let github = cache.get_client(InstallationId(42)).await?;
//! let again = cache.get_client(InstallationId(42)).await?;
//! assert!(Arc::ptr_eq(&github, &again));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use hubbot_protocol::InstallationId;
use tokio::time::Instant;
use tracing::{debug, instrument};

use crate::auth::{InstallationToken, TokenIssuer};
use crate::client::GitHubClient;
use crate::error::Result;

/// Default time-to-live of a cached client.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Margin kept before a token's reported expiry.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// A client together with the instant it stops being served.
struct CachedCredential {
    client: Arc<GitHubClient>,
    stale_at: Instant,
}

impl CachedCredential {
    fn is_fresh(&self, now: Instant) -> bool {
        now < self.stale_at
    }
}

/// Per-installation slot; the async lock is held for the whole issuance.
type Slot = Arc<tokio::sync::Mutex<Option<CachedCredential>>>;

/// Caches authenticated clients per installation.
pub struct CredentialCache {
    issuer: Arc<dyn TokenIssuer>,
    ttl: Duration,
    base_url: Option<String>,
    slots: Mutex<HashMap<InstallationId, Slot>>,
}

impl fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let installations = self
            .slots
            .lock()
            .map(|slots| slots.len())
            .unwrap_or_default();
        f.debug_struct("CredentialCache")
            .field("ttl", &self.ttl)
            .field("base_url", &self.base_url)
            .field("installations", &installations)
            .finish_non_exhaustive()
    }
}

impl CredentialCache {
    /// Creates an empty cache backed by `issuer`.
    #[must_use]
    pub fn new(issuer: Arc<dyn TokenIssuer>) -> Self {
        Self {
            issuer,
            ttl: DEFAULT_TTL,
            base_url: None,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Overrides how long a client is reused.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Points the clients handed out at a different REST API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Returns the configured time-to-live.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns an authenticated client for `installation`.
    ///
    /// Serves the cached client while it is fresh. Otherwise issues a new
    /// token, unless another caller is already doing so for the same
    /// installation, in which case this waits for that issuance instead.
    ///
    /// # Errors
    ///
    /// Returns the issuer's error unchanged, or an error if the client
    /// cannot be built.
    #[instrument(skip(self))]
    pub async fn get_client(&self, installation: InstallationId) -> Result<Arc<GitHubClient>> {
        let slot = self.slot(installation);
        let mut cached = slot.lock().await;

        let now = Instant::now();
        match cached.as_ref() {
            Some(entry) if entry.is_fresh(now) => {
                debug!("reusing cached installation client");
                return Ok(Arc::clone(&entry.client));
            }
            Some(_) => {
                debug!("cached installation client is stale");
                *cached = None;
            }
            None => {}
        }

        let token = self.issuer.issue(installation).await?;
        let stale_at = Instant::now() + self.lifetime_of(&token);
        let client = Arc::new(GitHubClient::new(Some(token.token), self.base_url.as_deref()).await?);

        debug!(lifetime = ?stale_at.saturating_duration_since(Instant::now()), "cached new installation client");
        *cached = Some(CachedCredential {
            client: Arc::clone(&client),
            stale_at,
        });
        Ok(client)
    }

    /// Drops the cached client for `installation`, if any.
    ///
    /// Waits for an in-flight issuance to finish first, so the result of
    /// that issuance is discarded too.
    pub async fn invalidate(&self, installation: InstallationId) {
        let slot = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&installation)
            .cloned();
        if let Some(slot) = slot {
            slot.lock().await.take();
            debug!(%installation, "invalidated installation client");
        }
    }

    fn slot(&self, installation: InstallationId) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(installation).or_default())
    }

    /// How long a client built from `token` may be served.
    fn lifetime_of(&self, token: &InstallationToken) -> Duration {
        let Some(expires_at) = token.expires_at else {
            return self.ttl;
        };
        let remaining = (expires_at - Utc::now())
            .to_std()
            .unwrap_or_default()
            .saturating_sub(EXPIRY_MARGIN);
        self.ttl.min(remaining)
    }
}
