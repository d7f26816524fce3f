//! The per-event handle given to handlers.

use std::sync::Arc;

use hubbot_github::{CredentialCache, GitHubClient};
use hubbot_protocol::{IssueRef, RepoRef, WebhookEvent, issue_params, repo_params};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, instrument};

use crate::config::ConfigLoader;
use crate::error::{Error, Result};

/// Everything a handler needs to act on one event.
///
/// A fresh `Context` is built for every handler invocation. The GitHub
/// client is obtained on first use and then kept for the rest of the
/// invocation.
///
/// # Examples
///
/// ```no_run
/// use hubbot_robot::Context;
/// use serde_json::json;
///
/// async fn greet(ctx: Context) -> anyhow::Result<()> {
///     let issue = ctx.issue()?;
///     let config = ctx.config("greeter.yml", Some(json!({"message": "Thanks!"}))).await?;
///     let message = config
///         .as_ref()
///         .and_then(|c| c["message"].as_str())
///         .unwrap_or("Thanks!");
///
///     ctx.github()
///         .await?
///         .inner()
///         .issues(&issue.owner, &issue.repo)
///         .create_comment(issue.number, message)
///         .await?;
///     Ok(())
/// }
/// ```
pub struct Context {
    event: Arc<WebhookEvent>,
    credentials: Arc<CredentialCache>,
    github: OnceCell<Arc<GitHubClient>>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("event", &self.event.qualified_name())
            .field("id", &self.event.id())
            .field("github", &self.github.initialized())
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Creates a context for `event`, drawing clients from `credentials`.
    #[must_use]
    pub fn new(event: Arc<WebhookEvent>, credentials: Arc<CredentialCache>) -> Self {
        Self {
            event,
            credentials,
            github: OnceCell::new(),
        }
    }

    /// Returns the event being handled.
    #[must_use]
    pub fn event(&self) -> &WebhookEvent {
        &self.event
    }

    /// Returns the event payload.
    #[must_use]
    pub fn payload(&self) -> &Value {
        self.event.payload()
    }

    /// Returns the repository the event happened in.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the payload has no usable repository.
    pub fn repo(&self) -> Result<RepoRef> {
        Ok(RepoRef::from_payload(self.payload())?)
    }

    /// Returns `{owner, repo}` with `extra` merged on top, ready to be used
    /// as request parameters. Keys in `extra` win.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the payload has no usable repository.
    pub fn repo_params(&self, extra: Map<String, Value>) -> Result<Map<String, Value>> {
        Ok(repo_params(self.payload(), extra)?)
    }

    /// Returns the issue or pull request the event is about.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the payload has no usable repository
    /// or no issue number.
    pub fn issue(&self) -> Result<IssueRef> {
        Ok(IssueRef::from_payload(self.payload())?)
    }

    /// Returns `{owner, repo, number}` with `extra` merged on top. Keys in
    /// `extra` win, so it may supply a number the payload lacks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the payload has no usable repository,
    /// or if neither the payload nor `extra` has a number.
    pub fn issue_params(&self, extra: Map<String, Value>) -> Result<Map<String, Value>> {
        Ok(issue_params(self.payload(), extra)?)
    }

    /// Returns a client authenticated as the installation the event was
    /// delivered for.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the event has no installation, or
    /// [`Error::GitHub`] if credentials cannot be issued.
    pub async fn github(&self) -> Result<Arc<GitHubClient>> {
        self.github
            .get_or_try_init(|| async {
                let installation = self.event.require_installation_id()?;
                debug!(%installation, "acquiring installation client");
                Ok::<_, Error>(self.credentials.get_client(installation).await?)
            })
            .await
            .cloned()
    }

    /// Loads `.github/<file_name>` from the event's repository.
    ///
    /// Returns `Ok(None)` if the file does not exist and no defaults were
    /// given, and the defaults if it does not exist and they were. File
    /// values are deep-merged over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigFormat`] if the file is not a safe YAML
    /// mapping. Any failure to determine the repository, obtain a client or
    /// fetch the file is returned as well.
    #[instrument(skip(self, defaults), fields(event = %self.event.qualified_name()))]
    pub async fn config(&self, file_name: &str, defaults: Option<Value>) -> Result<Option<Value>> {
        let repo = self.repo()?;
        let github = self.github().await?;
        ConfigLoader::new(github.as_ref())
            .load(&repo, file_name, defaults)
            .await
    }

    /// Like [`Context::config`], deserialized into `T`.
    ///
    /// # Errors
    ///
    /// Fails like [`Context::config`], or with [`Error::ConfigFormat`] if
    /// the merged document does not match `T`.
    pub async fn config_as<T: DeserializeOwned>(
        &self,
        file_name: &str,
        defaults: Option<Value>,
    ) -> Result<Option<T>> {
        self.config(file_name, defaults)
            .await?
            .map(|document| {
                serde_json::from_value(document).map_err(|e| Error::ConfigFormat {
                    path: format!("{}/{file_name}", crate::config::CONFIG_DIR),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use hubbot_github::{InstallationToken, TokenIssuer};
    use hubbot_protocol::{InstallationId, ProtocolError};
    use secrecy::SecretString;
    use serde_json::json;

    #[derive(Default)]
    struct CountingIssuer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TokenIssuer for CountingIssuer {
        async fn issue(&self, _: InstallationId) -> hubbot_github::Result<InstallationToken> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(InstallationToken {
                token: SecretString::from("ghs_test".to_string()),
                expires_at: None,
            })
        }
    }

    fn context(payload: Value) -> (Context, Arc<CountingIssuer>) {
        let issuer = Arc::new(CountingIssuer::default());
        let cache = CredentialCache::new(Arc::clone(&issuer) as Arc<dyn TokenIssuer>);
        let event = WebhookEvent::new("issues", payload);
        (Context::new(Arc::new(event), Arc::new(cache)), issuer)
    }

    fn issue_payload() -> Value {
        json!({
            "action": "opened",
            "issue": {"number": 4},
            "repository": {"name": "probot", "owner": {"login": "bkeepers"}},
            "installation": {"id": 7},
        })
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[test]
    fn exposes_payload() {
        let (ctx, _) = context(issue_payload());
        assert_eq!(ctx.payload()["issue"]["number"], 4);
        assert_eq!(ctx.event().action(), Some("opened"));
    }

    #[test]
    fn repo_and_issue_from_payload() {
        let (ctx, _) = context(issue_payload());
        assert_eq!(ctx.repo().unwrap(), RepoRef::new("bkeepers", "probot"));
        assert_eq!(ctx.issue().unwrap().number, 4);
    }

    #[test]
    fn issue_params_honour_overrides() {
        let (ctx, _) = context(issue_payload());
        let params = ctx
            .issue_params(object(json!({"owner": "muahaha", "number": 5})))
            .unwrap();
        assert_eq!(
            Value::Object(params),
            json!({"owner": "muahaha", "repo": "probot", "number": 5})
        );
    }

    #[test]
    fn repo_params_merge_extra_keys() {
        let (ctx, _) = context(issue_payload());
        let params = ctx.repo_params(object(json!({"path": "README.md"}))).unwrap();
        assert_eq!(
            Value::Object(params),
            json!({"owner": "bkeepers", "repo": "probot", "path": "README.md"})
        );
    }

    #[test]
    fn repo_fails_without_repository() {
        let (ctx, _) = context(json!({}));
        let err = ctx.repo().unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::MissingRepository)));
        assert!(err.to_string().contains("context.repo() is not supported"));
    }

    #[tokio::test]
    async fn github_client_is_acquired_once() {
        let (ctx, issuer) = context(issue_payload());
        let first = ctx.github().await.unwrap();
        let second = ctx.github().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.is_authenticated());
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn github_requires_an_installation() {
        let (ctx, issuer) = context(json!({"action": "opened"}));
        let err = ctx.github().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Protocol(ProtocolError::MissingInstallation { .. })
        ));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn config_requires_a_repository() {
        let (ctx, issuer) = context(json!({"installation": {"id": 7}}));
        let err = ctx.config("bot.yml", None).await.unwrap_err();

        assert!(matches!(err, Error::Protocol(ProtocolError::MissingRepository)));
        assert_eq!(issuer.calls.load(Ordering::SeqCst), 0);
    }
}
