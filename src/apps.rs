//! Apps compiled into the binary.

use hubbot_robot::{AppRegistry, Application, Context};
use tracing::info;

/// Logs every delivered event. Loaded when no apps are configured.
pub const EVENT_LOG: &str = "event-log";

/// Returns the registry of built-in apps.
pub fn registry() -> AppRegistry {
    AppRegistry::new().with(EVENT_LOG, event_log)
}

fn event_log(app: &Application) -> hubbot_robot::Result<()> {
    app.on("*", |ctx: Context| async move {
        let event = ctx.event();
        let repo = ctx.repo().map(|repo| repo.full_name()).ok();
        info!(
            event = %event.qualified_name(),
            id = event.id().unwrap_or_default(),
            installation = ?event.installation_id(),
            repo = repo.as_deref().unwrap_or("-"),
            "received event"
        );
        Ok(())
    })
}
