//! Webhook event records.
//!
//! A [`WebhookEvent`] is what the delivery layer hands to the dispatcher once
//! a request has been authenticated and its signature verified: the event
//! category from the `X-GitHub-Event` header, the optional delivery id, and
//! the JSON payload. Events are immutable once constructed.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, Result};

/// Identifier of a GitHub App installation.
///
/// An installation is the grant that connects the app to one account or
/// organization, and is the unit credentials are scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstallationId(pub u64);

impl InstallationId {
    /// Returns the raw numeric identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for InstallationId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for InstallationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A verified webhook delivery.
///
/// # Examples
///
/// ```
/// use hubbot_protocol::WebhookEvent;
/// use serde_json::json;
///
/// let event = WebhookEvent::new("issues", json!({"action": "opened"}));
/// assert_eq!(event.name(), "issues");
/// assert_eq!(event.action(), Some("opened"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// The event category, e.g. `issues` or `push`.
    #[serde(alias = "event")]
    name: String,

    /// The delivery id (`X-GitHub-Delivery`), if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    /// The raw JSON payload.
    payload: Value,
}

impl WebhookEvent {
    /// Creates an event without a delivery id.
    #[must_use]
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            id: None,
            payload,
        }
    }

    /// Attaches a delivery id to the event.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Returns the event category.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the delivery id, if known.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Returns the event's sub-type, taken from the payload's `action` field.
    ///
    /// Events such as `push` carry no action.
    #[must_use]
    pub fn action(&self) -> Option<&str> {
        self.payload.get("action").and_then(Value::as_str)
    }

    /// Returns the raw payload.
    #[must_use]
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns `name.action`, or just `name` for events without an action.
    ///
    /// # Examples
    ///
    /// ```
    /// use hubbot_protocol::WebhookEvent;
    /// use serde_json::json;
    ///
    /// let event = WebhookEvent::new("issues", json!({"action": "opened"}));
    /// assert_eq!(event.qualified_name(), "issues.opened");
    ///
    /// let event = WebhookEvent::new("push", json!({}));
    /// assert_eq!(event.qualified_name(), "push");
    /// ```
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match self.action() {
            Some(action) => format!("{}.{action}", self.name),
            None => self.name.clone(),
        }
    }

    /// Returns the installation the event was delivered for, if any.
    #[must_use]
    pub fn installation_id(&self) -> Option<InstallationId> {
        self.payload
            .get("installation")
            .and_then(|installation| installation.get("id"))
            .and_then(Value::as_u64)
            .map(InstallationId)
    }

    /// Returns the installation the event was delivered for.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MissingInstallation`] if the payload has no
    /// `installation.id`.
    pub fn require_installation_id(&self) -> Result<InstallationId> {
        self.installation_id()
            .ok_or_else(|| ProtocolError::MissingInstallation {
                event: self.name.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_is_read_from_payload() {
        let event = WebhookEvent::new("test", json!({"action": "foo"}));
        assert_eq!(event.action(), Some("foo"));

        let event = WebhookEvent::new("test", json!({}));
        assert_eq!(event.action(), None);

        // A non-string action is not an action.
        let event = WebhookEvent::new("test", json!({"action": 5}));
        assert_eq!(event.action(), None);
    }

    #[test]
    fn installation_id_is_read_from_payload() {
        let event = WebhookEvent::new("test", json!({"installation": {"id": 1}}));
        assert_eq!(event.installation_id(), Some(InstallationId(1)));
        assert_eq!(event.require_installation_id().unwrap(), InstallationId(1));

        let event = WebhookEvent::new("ping", json!({}));
        assert!(event.installation_id().is_none());
        assert!(matches!(
            event.require_installation_id(),
            Err(ProtocolError::MissingInstallation { .. })
        ));
    }

    #[test]
    fn deserializes_with_event_alias() {
        let event: WebhookEvent = serde_json::from_str(
            r#"{"event": "issues", "id": "abc-123", "payload": {"action": "closed"}}"#,
        )
        .unwrap();

        assert_eq!(event.name(), "issues");
        assert_eq!(event.id(), Some("abc-123"));
        assert_eq!(event.action(), Some("closed"));
    }

    #[test]
    fn serializes_without_missing_id() {
        let event = WebhookEvent::new("push", json!({"ref": "refs/heads/main"}));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            json!({"name": "push", "payload": {"ref": "refs/heads/main"}})
        );
    }

    #[test]
    fn with_id_sets_delivery_id() {
        let event = WebhookEvent::new("push", json!({})).with_id("delivery-1");
        assert_eq!(event.id(), Some("delivery-1"));
    }
}
