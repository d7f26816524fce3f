//! Core settings struct and loading logic.
//!
//! This module provides the main [`Settings`] struct which aggregates all
//! process-level configuration: GitHub App credentials, API endpoint,
//! credential caching, the apps to load, and logging.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::env::apply_overrides;
use crate::error::{ConfigError, Result};
use crate::logging::LoggingSettings;
use crate::persistence::{find_config_file, read_config_file};

/// Default lifetime of a cached installation credential (one hour).
pub const DEFAULT_CREDENTIAL_TTL_SECS: u64 = 60 * 60;

/// The main settings struct for a hubbot process.
///
/// # Examples
///
/// ```
/// use hubbot_config::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.apps.is_empty());
/// assert_eq!(settings.credential_ttl_secs, 3600);
///
/// let settings = Settings {
///     app_id: Some(42),
///     apps: vec!["event-log".to_string()],
///     ..Settings::default()
/// };
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    /// The GitHub App id, used as the issuer of app assertions.
    #[serde(default)]
    pub app_id: Option<u64>,

    /// The app's private key as inline PEM. Wins over `private_key_path`.
    #[serde(default)]
    pub private_key: Option<String>,

    /// Path to the app's private key PEM file.
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,

    /// REST API base URL, for GitHub Enterprise Server. Defaults to
    /// `https://api.github.com` when unset.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// How long an installation credential is reused before re-issuance.
    #[serde(default = "default_credential_ttl")]
    pub credential_ttl_secs: u64,

    /// Identifiers of the apps to load, in load order.
    #[serde(default)]
    pub apps: Vec<String>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

fn default_credential_ttl() -> u64 {
    DEFAULT_CREDENTIAL_TTL_SECS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_id: None,
            private_key: None,
            private_key_path: None,
            api_base_url: None,
            credential_ttl_secs: DEFAULT_CREDENTIAL_TTL_SECS,
            apps: Vec::new(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Settings {
    /// Loads settings from the default file locations, then applies
    /// `HUBBOT_*` environment overrides.
    ///
    /// If no settings file is found, starts from the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a settings file is found but cannot be read or
    /// parsed, if an environment override is malformed, or if the result
    /// does not validate.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use hubbot_config::Settings;
    ///
    /// # async fn example() -> hubbot_config::Result<()> {
    /// let settings = Settings::load().await?;
    /// println!("Loading {} apps", settings.apps.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn load() -> Result<Self> {
        let mut settings = match find_config_file() {
            Some(path) => {
                let content = tokio::fs::read_to_string(&path).await.map_err(|source| {
                    ConfigError::ReadFile {
                        path: path.clone(),
                        source,
                    }
                })?;
                serde_json5::from_str(&content)?
            }
            None => Self::default(),
        };
        apply_overrides(&mut settings, |name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a specific file, without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let settings: Settings = read_config_file(path)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validates the settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidCredentialTtl`] if the TTL is zero.
    pub fn validate(&self) -> Result<()> {
        if self.credential_ttl_secs == 0 {
            return Err(ConfigError::InvalidCredentialTtl {
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Returns the credential TTL as a [`Duration`].
    #[must_use]
    pub fn credential_ttl(&self) -> Duration {
        Duration::from_secs(self.credential_ttl_secs)
    }

    /// Returns the configured app id.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingAppId`] if none is configured.
    pub fn require_app_id(&self) -> Result<u64> {
        self.app_id.ok_or(ConfigError::MissingAppId)
    }

    /// Returns the private key PEM, reading it from `private_key_path` if
    /// it is not configured inline.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPrivateKey`] if neither source is
    /// configured, or [`ConfigError::ReadFile`] if the key file cannot be
    /// read.
    pub fn resolve_private_key(&self) -> Result<String> {
        if let Some(key) = &self.private_key {
            return Ok(key.clone());
        }

        let path = self
            .private_key_path
            .as_ref()
            .ok_or(ConfigError::MissingPrivateKey)?;
        std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.clone(),
            source,
        })
    }
}
