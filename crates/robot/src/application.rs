//! Event routing within one app.
//!
//! An [`Application`] owns a table of `(pattern, handler)` routes. When an
//! event arrives, every route whose pattern matches is invoked with its own
//! [`Context`], all of them concurrently. The group is awaited to the end:
//! a failing handler never cancels its siblings, and the failures are only
//! aggregated once everyone is done.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use futures_util::FutureExt as _;
use futures_util::StreamExt as _;
use futures_util::future::BoxFuture;
use futures_util::stream::FuturesUnordered;
use hubbot_github::CredentialCache;
use hubbot_protocol::{EventPattern, WebhookEvent};
use tracing::{debug, error, instrument};

use crate::context::Context;
use crate::error::{DispatchError, Result};

/// Something that handles events.
///
/// Implemented for every `Fn(Context) -> impl Future<Output = anyhow::Result<()>>`,
/// so plain async functions and closures can be registered directly.
/// [`Application::on`] takes such functions and infers their types;
/// [`Application::register`] also accepts hand-written implementations.
pub trait Handler: Send + Sync + 'static {
    /// Handles one event.
    fn call(&self, ctx: Context) -> BoxFuture<'static, anyhow::Result<()>>;
}

impl<F, Fut> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn call(&self, ctx: Context) -> BoxFuture<'static, anyhow::Result<()>> {
        self(ctx).boxed()
    }
}

#[derive(Clone)]
struct Route {
    pattern: EventPattern,
    handler: Arc<dyn Handler>,
}

/// The result of one handler invocation.
#[derive(Debug)]
pub struct HandlerOutcome {
    /// The pattern the handler was registered under.
    pub pattern: EventPattern,
    /// Position of the handler's route in registration order.
    pub index: usize,
    /// What the handler returned. A panic is reported as an error.
    pub result: anyhow::Result<()>,
}

/// One app: a named routing table bound to the shared credential cache.
pub struct Application {
    name: String,
    credentials: Arc<CredentialCache>,
    routes: RwLock<Vec<Route>>,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let patterns: Vec<String> = self
            .read_routes()
            .iter()
            .map(|route| route.pattern.to_string())
            .collect();
        f.debug_struct("Application")
            .field("name", &self.name)
            .field("routes", &patterns)
            .finish_non_exhaustive()
    }
}

impl Application {
    /// Creates an app with an empty routing table.
    #[must_use]
    pub fn new(name: impl Into<String>, credentials: Arc<CredentialCache>) -> Self {
        Self {
            name: name.into(),
            credentials,
            routes: RwLock::new(Vec::new()),
        }
    }

    /// Returns the app's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns how many routes are registered.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.read_routes().len()
    }

    /// Registers `handler` for events matching `pattern`.
    ///
    /// Registering the same handler or pattern twice is allowed; every
    /// registration is invoked.
    pub fn register(&self, pattern: EventPattern, handler: impl Handler) {
        debug!(app = %self.name, %pattern, "registered handler");
        self.routes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Route {
                pattern,
                handler: Arc::new(handler),
            });
    }

    /// Parses `pattern` and registers `handler` under it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Protocol`] if `pattern` is not `*`, `name`,
    /// or `name.action`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use hubbot_robot::{Application, Context};
    /// # use hubbot_github::{CredentialCache, InstallationToken, TokenIssuer};
    /// # struct NoIssuer;
    /// # #[async_trait::async_trait]
    /// # impl TokenIssuer for NoIssuer {
    /// #     async fn issue(&self, _: hubbot_protocol::InstallationId) -> hubbot_github::Result<InstallationToken> {
    /// #         unimplemented!()
    /// #     }
    /// # }
    /// # let credentials = Arc::new(CredentialCache::new(Arc::new(NoIssuer)));
    ///
    /// let app = Application::new("greeter", credentials);
    /// app.on("issues.opened", |ctx: Context| async move {
    ///     println!("opened: {}", ctx.issue()?.number);
    ///     Ok(())
    /// })?;
    /// assert!(app.on("issues.", |_ctx: Context| async { Ok(()) }).is_err());
    /// # Ok::<(), hubbot_robot::Error>(())
    /// ```
    pub fn on<F, Fut>(&self, pattern: &str, handler: F) -> Result<()>
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.register(EventPattern::parse(pattern)?, handler);
        Ok(())
    }

    /// Invokes every matching handler and reports each outcome.
    ///
    /// The matching routes are fixed when the call starts. Outcomes are
    /// returned in the order the handlers completed; each failure is logged
    /// as it happens.
    #[instrument(
        skip(self, event),
        fields(app = %self.name, event = %event.qualified_name(), id = event.id().unwrap_or_default())
    )]
    pub async fn dispatch(&self, event: Arc<WebhookEvent>) -> Vec<HandlerOutcome> {
        let matched: Vec<(usize, Route)> = self
            .read_routes()
            .iter()
            .enumerate()
            .filter(|(_, route)| route.pattern.matches(&event))
            .map(|(index, route)| (index, route.clone()))
            .collect();

        if matched.is_empty() {
            debug!("no handler matched");
            return Vec::new();
        }

        let invocations = matched.into_iter().map(|(index, route)| {
            debug!(pattern = %route.pattern, handler = index, "invoking handler");
            let ctx = Context::new(Arc::clone(&event), Arc::clone(&self.credentials));
            // Handlers may panic while building their future as well as while running it.
            let call = std::panic::catch_unwind(AssertUnwindSafe(|| route.handler.call(ctx)));
            async move {
                let result = match call {
                    Ok(future) => AssertUnwindSafe(future)
                        .catch_unwind()
                        .await
                        .unwrap_or_else(|panic| Err(panic_error(&*panic))),
                    Err(panic) => Err(panic_error(&*panic)),
                };
                if let Err(e) = &result {
                    error!(pattern = %route.pattern, handler = index, error = %format_args!("{e:#}"), "handler failed");
                }
                HandlerOutcome {
                    pattern: route.pattern,
                    index,
                    result,
                }
            }
        });

        in_completion_order(invocations).await
    }

    /// Invokes every matching handler and waits for all of them.
    ///
    /// Succeeds if no handler matched or every matching handler succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Dispatch`] carrying the first handler error
    /// by completion time. Handlers that had not finished when it occurred
    /// were still run to completion.
    pub async fn receive(&self, event: Arc<WebhookEvent>) -> Result<()> {
        aggregate_outcomes(self.dispatch(event).await)
    }

    fn read_routes(&self) -> std::sync::RwLockReadGuard<'_, Vec<Route>> {
        self.routes.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Applies the dispatch policy to a list of outcomes in completion order.
///
/// # Errors
///
/// Returns [`crate::Error::Dispatch`] with the first failure in `outcomes`
/// if any handler failed.
pub fn aggregate_outcomes(outcomes: Vec<HandlerOutcome>) -> Result<()> {
    aggregate("handlers", outcomes.into_iter().map(|outcome| outcome.result))
}

/// Fails with the first error in `results`, if any.
pub(crate) fn aggregate(
    group: &'static str,
    results: impl IntoIterator<Item = anyhow::Result<()>>,
) -> Result<()> {
    let mut total = 0;
    let mut failed = 0;
    let mut first = None;
    for result in results {
        total += 1;
        if let Err(e) = result {
            failed += 1;
            first.get_or_insert(e);
        }
    }

    match first {
        None => Ok(()),
        Some(first) => Err(DispatchError {
            first,
            failed,
            total,
            group,
        }
        .into()),
    }
}

/// Drives all `futures` concurrently and returns their outputs as they
/// complete.
pub(crate) async fn in_completion_order<F: Future>(
    futures: impl IntoIterator<Item = F>,
) -> Vec<F::Output> {
    futures
        .into_iter()
        .collect::<FuturesUnordered<_>>()
        .collect()
        .await
}

fn panic_error(panic: &(dyn Any + Send)) -> anyhow::Error {
    let message = panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload");
    anyhow::anyhow!("handler panicked: {message}")
}
