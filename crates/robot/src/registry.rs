//! Named app factories.
//!
//! Apps are compiled into the binary. The registry maps the names used in
//! settings to the function that wires an app's handlers into a fresh
//! [`Application`].

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::application::Application;
use crate::error::{Error, Result};

/// Wires an app's handlers into an [`Application`].
pub type AppFactory = Arc<dyn Fn(&Application) -> Result<()> + Send + Sync>;

/// A lookup table from app name to [`AppFactory`].
///
/// # Examples
///
/// ```
/// use hubbot_robot::{AppRegistry, Context};
///
/// let registry = AppRegistry::new().with("welcome", |app| {
///     app.on("installation.created", |_ctx: Context| async { Ok(()) })
/// });
/// assert!(registry.contains("welcome"));
/// assert!(registry.get("missing").is_err());
/// ```
#[derive(Clone, Default)]
pub struct AppRegistry {
    factories: BTreeMap<String, AppFactory>,
}

impl std::fmt::Debug for AppRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.factories.keys()).finish()
    }
}

impl AppRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `factory` under `name`, replacing any previous entry.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&Application) -> Result<()> + Send + Sync + 'static,
    ) {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Builder form of [`AppRegistry::insert`].
    #[must_use]
    pub fn with(
        mut self,
        name: impl Into<String>,
        factory: impl Fn(&Application) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.insert(name, factory);
        self
    }

    /// Returns whether an app is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Looks up the factory registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownApp`] if nothing is registered under `name`.
    pub fn get(&self, name: &str) -> Result<AppFactory> {
        self.factories
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownApp {
                name: name.to_string(),
            })
    }
}
