//! Settings file lookup and reading.
//!
//! Files may be JSON5 (comments, trailing commas, unquoted keys) or plain
//! JSON; both go through the JSON5 parser.
//!
//! # File Locations
//!
//! Settings are searched in the following order:
//!
//! 1. Local: `./hubbot.json5` or `./hubbot.json`
//! 2. User: `~/.config/hubbot/config.json5` or `~/.config/hubbot/config.json`

use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

/// Local settings file names, in priority order.
const LOCAL_FILE_NAMES: &[&str] = &["hubbot.json5", "hubbot.json"];

/// Directory under the user's config dir.
const USER_CONFIG_DIR: &str = "hubbot";

/// Settings file names inside [`USER_CONFIG_DIR`], in priority order.
const USER_FILE_NAMES: &[&str] = &["config.json5", "config.json"];

/// Finds the settings file to load, if any.
///
/// # Examples
///
/// ```no_run
/// use hubbot_config::persistence::find_config_file;
///
/// match find_config_file() {
///     Some(path) => println!("loading settings from {}", path.display()),
///     None => println!("using built-in defaults"),
/// }
/// ```
#[must_use]
pub fn find_config_file() -> Option<PathBuf> {
    let local = LOCAL_FILE_NAMES.iter().map(PathBuf::from);
    let user = user_config_dir()
        .ok()
        .into_iter()
        .flat_map(|dir| USER_FILE_NAMES.iter().map(move |name| dir.join(name)));

    local.chain(user).find(|path| path.exists())
}

/// Returns the user settings directory, typically `~/.config/hubbot/`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] if the platform config
/// directory cannot be determined.
pub fn user_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(USER_CONFIG_DIR))
        .ok_or(ConfigError::NoHomeDirectory)
}

/// Reads and parses a settings file.
///
/// # Errors
///
/// Returns [`ConfigError::ReadFile`] if the file cannot be read, or
/// [`ConfigError::ParseJson5`] if its content is malformed.
pub fn read_config_file<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json5::from_str(&content).map_err(ConfigError::from)
}
