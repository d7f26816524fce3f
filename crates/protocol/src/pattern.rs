//! Event patterns used as registration keys.
//!
//! A handler is registered under one of three pattern shapes:
//!
//! | Pattern | Matches |
//! |---------|---------|
//! | `*` | every event |
//! | `issues` | every `issues` event, whatever its action |
//! | `issues.opened` | `issues` events whose action is `opened` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ProtocolError, Result};
use crate::event::WebhookEvent;

/// A registration key selecting which events reach a handler.
///
/// # Examples
///
/// ```
/// use hubbot_protocol::{EventPattern, WebhookEvent};
/// use serde_json::json;
///
/// let pattern: EventPattern = "issues.opened".parse().unwrap();
/// let event = WebhookEvent::new("issues", json!({"action": "opened"}));
/// assert!(pattern.matches(&event));
/// assert!(EventPattern::Any.matches(&event));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventPattern {
    /// `*`: every event.
    Any,
    /// `name`: every event of one category.
    Event(String),
    /// `name.action`: one category restricted to one action.
    Action {
        /// The event category.
        event: String,
        /// The required action.
        action: String,
    },
}

impl EventPattern {
    /// Parses a pattern string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidPattern`] if the string is empty,
    /// has an empty segment, has more than one `.`, contains whitespace, or
    /// uses `*` anywhere other than as the whole pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use hubbot_protocol::EventPattern;
    ///
    /// assert_eq!(EventPattern::parse("*").unwrap(), EventPattern::Any);
    /// assert!(EventPattern::parse("issues.opened").is_ok());
    /// assert!(EventPattern::parse("issues.").is_err());
    /// assert!(EventPattern::parse("a.b.c").is_err());
    /// ```
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason| ProtocolError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        if pattern == "*" {
            return Ok(Self::Any);
        }
        if pattern.is_empty() {
            return Err(invalid("pattern cannot be empty"));
        }
        if pattern.contains('*') {
            return Err(invalid("'*' must be the whole pattern"));
        }
        if pattern.chars().any(char::is_whitespace) {
            return Err(invalid("pattern cannot contain whitespace"));
        }

        match pattern.split_once('.') {
            None => Ok(Self::Event(pattern.to_string())),
            Some((event, action)) => {
                if event.is_empty() {
                    return Err(invalid("event name cannot be empty"));
                }
                if action.is_empty() {
                    return Err(invalid("action cannot be empty"));
                }
                if action.contains('.') {
                    return Err(invalid("expected at most one '.'"));
                }
                Ok(Self::Action {
                    event: event.to_string(),
                    action: action.to_string(),
                })
            }
        }
    }

    /// Returns `true` if an event with the given category and action is
    /// selected by this pattern.
    #[must_use]
    pub fn matches_parts(&self, name: &str, action: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Event(event) => event == name,
            Self::Action {
                event,
                action: wanted,
            } => event == name && action == Some(wanted.as_str()),
        }
    }

    /// Returns `true` if the event is selected by this pattern.
    #[must_use]
    pub fn matches(&self, event: &WebhookEvent) -> bool {
        self.matches_parts(event.name(), event.action())
    }
}

impl fmt::Display for EventPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Event(event) => f.write_str(event),
            Self::Action { event, action } => write!(f, "{event}.{action}"),
        }
    }
}

impl FromStr for EventPattern {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for EventPattern {
    type Error = ProtocolError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl Serialize for EventPattern {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EventPattern {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
