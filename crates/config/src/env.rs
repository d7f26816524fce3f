//! Environment variable overrides.
//!
//! Applied on top of the file-based settings, highest priority first:
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `HUBBOT_APP_ID` | `app_id` |
//! | `HUBBOT_PRIVATE_KEY` | `private_key` |
//! | `HUBBOT_PRIVATE_KEY_PATH` | `private_key_path` |
//! | `HUBBOT_API_BASE_URL` | `api_base_url` |
//! | `HUBBOT_CREDENTIAL_TTL_SECS` | `credential_ttl_secs` |
//! | `HUBBOT_APPS` | `apps` (comma separated) |
//! | `HUBBOT_LOG_LEVEL` | `logging.level` |
//! | `HUBBOT_LOG_FORMAT` | `logging.format` |

use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::settings::Settings;

pub const APP_ID: &str = "HUBBOT_APP_ID";
pub const PRIVATE_KEY: &str = "HUBBOT_PRIVATE_KEY";
pub const PRIVATE_KEY_PATH: &str = "HUBBOT_PRIVATE_KEY_PATH";
pub const API_BASE_URL: &str = "HUBBOT_API_BASE_URL";
pub const CREDENTIAL_TTL_SECS: &str = "HUBBOT_CREDENTIAL_TTL_SECS";
pub const APPS: &str = "HUBBOT_APPS";
pub const LOG_LEVEL: &str = "HUBBOT_LOG_LEVEL";
pub const LOG_FORMAT: &str = "HUBBOT_LOG_FORMAT";

/// Applies environment overrides to `settings`.
///
/// `lookup` resolves a variable name to its value; pass
/// `|name| std::env::var(name).ok()` to read the process environment.
/// Empty values are treated as unset.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvironment`] if a numeric or enumerated
/// variable cannot be parsed.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use hubbot_config::{Settings, env::apply_overrides};
///
/// let vars = HashMap::from([("HUBBOT_APPS", "event-log, triage")]);
/// let mut settings = Settings::default();
/// apply_overrides(&mut settings, |name| vars.get(name).map(|v| v.to_string())).unwrap();
/// assert_eq!(settings.apps, vec!["event-log", "triage"]);
/// ```
pub fn apply_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

    if let Some(value) = get(APP_ID) {
        settings.app_id = Some(parse_number(APP_ID, &value)?);
    }
    if let Some(value) = get(PRIVATE_KEY) {
        settings.private_key = Some(value);
    }
    if let Some(value) = get(PRIVATE_KEY_PATH) {
        settings.private_key_path = Some(PathBuf::from(value));
    }
    if let Some(value) = get(API_BASE_URL) {
        settings.api_base_url = Some(value);
    }
    if let Some(value) = get(CREDENTIAL_TTL_SECS) {
        settings.credential_ttl_secs = parse_number(CREDENTIAL_TTL_SECS, &value)?;
    }
    if let Some(value) = get(APPS) {
        settings.apps = value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string)
            .collect();
    }
    if let Some(value) = get(LOG_LEVEL) {
        settings.logging.level = value;
    }
    if let Some(value) = get(LOG_FORMAT) {
        settings.logging.format = value
            .parse()
            .map_err(|reason| ConfigError::InvalidEnvironment {
                name: LOG_FORMAT,
                reason,
            })?;
    }

    Ok(())
}

fn parse_number(name: &'static str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidEnvironment {
            name,
            reason: e.to_string(),
        })
}
