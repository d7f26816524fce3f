//! The top-level dispatcher.

use std::sync::Arc;

use hubbot_github::CredentialCache;
use hubbot_protocol::WebhookEvent;
use tracing::{debug, info, instrument};

use crate::application::{Application, aggregate, in_completion_order};
use crate::error::Result;
use crate::registry::AppRegistry;

/// Hosts every loaded app and fans events out to them.
///
/// All apps share one [`CredentialCache`], so an installation's token is
/// issued once no matter how many apps act on its events.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use hubbot_github::CredentialCache;
/// use hubbot_protocol::WebhookEvent;
/// use hubbot_robot::{AppRegistry, Context, Robot};
/// use serde_json::json;
///
/// # async fn example(credentials: Arc<CredentialCache>) -> hubbot_robot::Result<()> {
/// let registry = AppRegistry::new().with("greeter", |app| {
///     app.on("issues.opened", |ctx: Context| async move {
///         println!("new issue #{}", ctx.issue()?.number);
///         Ok(())
///     })
/// });
///
/// let mut robot = Robot::new(credentials, registry);
/// robot.setup(["greeter"])?;
/// robot
///     .receive(WebhookEvent::new("issues", json!({"action": "opened"})))
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Robot {
    credentials: Arc<CredentialCache>,
    registry: AppRegistry,
    apps: Vec<Arc<Application>>,
}

impl Robot {
    /// Creates a robot with no apps loaded.
    #[must_use]
    pub fn new(credentials: Arc<CredentialCache>, registry: AppRegistry) -> Self {
        Self {
            credentials,
            registry,
            apps: Vec::new(),
        }
    }

    /// Returns the loaded apps in load order.
    #[must_use]
    pub fn apps(&self) -> &[Arc<Application>] {
        &self.apps
    }

    /// Loads the app registered under `name`.
    ///
    /// Loading the same name twice creates two independent instances.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownApp`] if the registry has no such app,
    /// or whatever the app's factory fails with.
    pub fn load(&mut self, name: &str) -> Result<Arc<Application>> {
        let factory = self.registry.get(name)?;
        self.load_with(name, |app| factory(app))
    }

    /// Loads an app that is not in the registry.
    ///
    /// # Errors
    ///
    /// Returns whatever `factory` fails with; the app is not added then.
    pub fn load_with(
        &mut self,
        name: &str,
        factory: impl FnOnce(&Application) -> Result<()>,
    ) -> Result<Arc<Application>> {
        let app = Application::new(name, Arc::clone(&self.credentials));
        factory(&app)?;
        info!(app = name, routes = app.route_count(), "loaded app");

        let app = Arc::new(app);
        self.apps.push(Arc::clone(&app));
        Ok(app)
    }

    /// Loads every app in `names`, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first app that fails to load. Apps loaded before it stay
    /// loaded.
    pub fn setup<I>(&mut self, names: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for name in names {
            self.load(name.as_ref())?;
        }
        Ok(())
    }

    /// Delivers `event` to every app concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Dispatch`] carrying the first app failure by
    /// completion time, after every app has finished.
    #[instrument(skip(self, event), fields(event = %event.qualified_name(), id = event.id().unwrap_or_default()))]
    pub async fn receive(&self, event: WebhookEvent) -> Result<()> {
        debug!(apps = self.apps.len(), "delivering event");
        let event = Arc::new(event);
        let deliveries = self.apps.iter().map(|app| {
            let event = Arc::clone(&event);
            async move { app.receive(event).await.map_err(anyhow::Error::from) }
        });

        aggregate("apps", in_completion_order(deliveries).await)
    }
}
