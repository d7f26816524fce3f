//! Repository and issue coordinates derived from webhook payloads.
//!
//! Most events describe the repository as `{name, owner: {login}}`. The
//! `push` event is the exception: its owner object carries `name` instead of
//! `login`. Payloads that only provide `full_name` (`owner/name`) are split.
//!
//! The `*_params` functions produce JSON parameter maps for API calls. Keys
//! supplied by the caller always win over derived ones, so
//! `issue_params(payload, {"owner": "muahaha", "number": 5})` targets issue 5
//! of `muahaha/<repo>`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ProtocolError, Result};

/// A repository address: `{owner, repo}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    /// The user or organization owning the repository.
    pub owner: String,
    /// The repository name.
    pub repo: String,
}

impl RepoRef {
    /// Creates a repository address.
    #[must_use]
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Derives the repository address from a webhook payload.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::MissingRepository`] if the payload has no
    /// `repository` object, or [`ProtocolError::MissingRepositoryOwner`] if
    /// neither `owner.login`, `owner.name`, nor `full_name` identify the
    /// owner.
    ///
    /// # Examples
    ///
    /// ```
    /// use hubbot_protocol::RepoRef;
    /// use serde_json::json;
    ///
    /// let payload = json!({
    ///     "repository": {"name": "probot", "owner": {"login": "bkeepers"}}
    /// });
    /// assert_eq!(RepoRef::from_payload(&payload).unwrap(), RepoRef::new("bkeepers", "probot"));
    /// ```
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let repository = payload
            .get("repository")
            .filter(|repository| repository.is_object())
            .ok_or(ProtocolError::MissingRepository)?;

        let full_name = repository
            .get("full_name")
            .and_then(Value::as_str)
            .and_then(|full_name| full_name.split_once('/'));

        let owner = repository
            .get("owner")
            .and_then(|owner| {
                owner
                    .get("login")
                    .and_then(Value::as_str)
                    .or_else(|| owner.get("name").and_then(Value::as_str))
            })
            .or(full_name.map(|(owner, _)| owner))
            .ok_or(ProtocolError::MissingRepositoryOwner)?;

        let repo = repository
            .get("name")
            .and_then(Value::as_str)
            .or(full_name.map(|(_, name)| name))
            .ok_or(ProtocolError::MissingRepository)?;

        Ok(Self::new(owner, repo))
    }

    /// Returns `owner/repo`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    fn into_map(self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("owner".to_string(), Value::String(self.owner));
        map.insert("repo".to_string(), Value::String(self.repo));
        map
    }
}

/// An issue or pull request address: `{owner, repo, number}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IssueRef {
    /// The user or organization owning the repository.
    pub owner: String,
    /// The repository name.
    pub repo: String,
    /// The issue or pull request number.
    pub number: u64,
}

impl IssueRef {
    /// Derives the issue address from a webhook payload.
    ///
    /// The number is taken from `issue.number`, then `pull_request.number`,
    /// then a top-level `number`.
    ///
    /// # Errors
    ///
    /// Fails like [`RepoRef::from_payload`], or with
    /// [`ProtocolError::MissingIssueNumber`] if no number is present.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let RepoRef { owner, repo } = RepoRef::from_payload(payload)?;
        let number = issue_number(payload).ok_or(ProtocolError::MissingIssueNumber)?;
        Ok(Self {
            owner,
            repo,
            number,
        })
    }

    /// Returns the repository part of the address.
    #[must_use]
    pub fn repo_ref(&self) -> RepoRef {
        RepoRef::new(self.owner.clone(), self.repo.clone())
    }
}

fn issue_number(payload: &Value) -> Option<u64> {
    ["issue", "pull_request"]
        .iter()
        .find_map(|key| payload.get(*key).and_then(|item| item.get("number")))
        .or_else(|| payload.get("number"))
        .and_then(Value::as_u64)
}

/// Builds `{owner, repo}` from the payload with `extra` merged on top.
///
/// # Errors
///
/// Fails like [`RepoRef::from_payload`]. Supplying `owner`/`repo` in `extra`
/// does not excuse a payload without repository information.
///
/// # Examples
///
/// ```
/// use hubbot_protocol::repo::repo_params;
/// use serde_json::json;
///
/// let payload = json!({"repository": {"name": "probot", "owner": {"login": "bkeepers"}}});
/// let extra = json!({"owner": "muahaha", "path": "README.md"});
/// let params = repo_params(&payload, extra.as_object().unwrap().clone()).unwrap();
/// assert_eq!(
///     serde_json::Value::Object(params),
///     json!({"owner": "muahaha", "repo": "probot", "path": "README.md"})
/// );
/// ```
pub fn repo_params(payload: &Value, extra: Map<String, Value>) -> Result<Map<String, Value>> {
    let mut params = RepoRef::from_payload(payload)?.into_map();
    params.extend(extra);
    Ok(params)
}

/// Builds `{owner, repo, number}` from the payload with `extra` merged on top.
///
/// # Errors
///
/// Fails like [`RepoRef::from_payload`], or with
/// [`ProtocolError::MissingIssueNumber`] if neither the payload nor `extra`
/// provides a number.
pub fn issue_params(payload: &Value, extra: Map<String, Value>) -> Result<Map<String, Value>> {
    let mut params = RepoRef::from_payload(payload)?.into_map();
    if let Some(number) = issue_number(payload) {
        params.insert("number".to_string(), Value::from(number));
    }
    params.extend(extra);

    if params.contains_key("number") {
        Ok(params)
    } else {
        Err(ProtocolError::MissingIssueNumber)
    }
}
