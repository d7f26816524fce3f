//! Process settings for hubbot.
//!
//! This crate handles loading and validating the settings a
//! hubbot process starts from: which GitHub App it acts as, where its
//! private key lives, which API endpoint to talk to, how long installation
//! credentials are reused, which apps to load, and how to log.
//!
//! # Overview
//!
//! - [`settings`]: The [`Settings`] struct and loading logic
//! - [`env`]: `HUBBOT_*` environment overrides
//! - [`logging`]: Log level and format
//! - [`persistence`]: Settings file lookup and reading
//! - [`error`]: Error types for settings operations
//!
//! # Sources (Priority)
//!
//! 1. Environment variables (`HUBBOT_*`)
//! 2. Local file (`./hubbot.json5` or `./hubbot.json`)
//! 3. User file (`~/.config/hubbot/config.json5` or `~/.config/hubbot/config.json`)
//! 4. Built-in defaults
//!
//! # Examples
//!
//! ```no_run
//! use hubbot_config::Settings;
//!
//! # async fn example() -> hubbot_config::Result<()> {
//! let settings = Settings::load().await?;
//! let app_id = settings.require_app_id()?;
//! let private_key = settings.resolve_private_key()?;
//! println!("acting as app {app_id}, loading {:?}", settings.apps);
//! # Ok(())
//! # }
//! ```

pub mod env;
pub mod error;
pub mod logging;
pub mod persistence;
pub mod settings;

// Re-export primary types at crate root for convenience
pub use error::{ConfigError, Result};
pub use logging::{LogFormat, LoggingSettings};
pub use settings::{DEFAULT_CREDENTIAL_TTL_SECS, Settings};
