//! hubbot - a GitHub App framework.
//!
//! This binary loads settings, wires the configured apps into a robot and
//! delivers webhook events read from stdin, one JSON object per line:
//!
//! ```text
//! {"name": "issues", "id": "72d3162e", "payload": {"action": "opened", ...}}
//! ```
//!
//! Receiving deliveries over HTTP and verifying their signatures is left to
//! whatever feeds this process.

mod apps;

use std::sync::Arc;

use anyhow::Context as _;
use hubbot_config::{LogFormat, LoggingSettings, Settings};
use hubbot_github::{AppAssertion, AppAuthenticator, CredentialCache};
use hubbot_protocol::WebhookEvent;
use hubbot_robot::Robot;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().await.context("loading settings")?;
    init_tracing(&settings.logging);

    let credentials = Arc::new(credential_cache(&settings)?);
    let mut robot = Robot::new(credentials, apps::registry());
    if settings.apps.is_empty() {
        robot.load(apps::EVENT_LOG)?;
    } else {
        robot.setup(&settings.apps)?;
    }
    info!(apps = robot.apps().len(), "hubbot ready, reading events from stdin");

    let robot = Arc::new(robot);
    let mut deliveries = JoinSet::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let event = match parse_event(&line) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "skipping malformed event");
                continue;
            }
        };

        let robot = Arc::clone(&robot);
        deliveries.spawn(async move {
            let id = event.id().unwrap_or_default().to_string();
            if let Err(e) = robot.receive(event).await {
                match e.credential_hint() {
                    Some(hint) => error!(%id, error = %e, hint, "delivery failed"),
                    None => error!(%id, error = %e, "delivery failed"),
                }
            }
        });
    }

    while let Some(joined) = deliveries.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "delivery task aborted");
        }
    }
    info!("stdin closed, shutting down");
    Ok(())
}

/// Installs the global subscriber. `RUST_LOG` wins over the settings.
fn init_tracing(logging: &LoggingSettings) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Compact => registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .init(),
    }
}

fn credential_cache(settings: &Settings) -> anyhow::Result<CredentialCache> {
    let app_id = settings.require_app_id()?;
    let pem = settings.resolve_private_key()?;
    let assertion = AppAssertion::from_rsa_pem(app_id, pem.as_bytes()).map_err(|e| {
        let hint = e.credential_hint().unwrap_or_default();
        anyhow::Error::new(e).context(format!("loading the app's private key. {hint}"))
    })?;

    let mut authenticator = AppAuthenticator::new(assertion);
    if let Some(base_url) = &settings.api_base_url {
        authenticator = authenticator.with_base_url(base_url.clone());
    }

    let mut cache =
        CredentialCache::new(Arc::new(authenticator)).with_ttl(settings.credential_ttl());
    if let Some(base_url) = &settings.api_base_url {
        cache = cache.with_base_url(base_url.clone());
    }
    Ok(cache)
}

/// Parses one delivery, assigning a delivery id if it has none.
fn parse_event(line: &str) -> serde_json::Result<WebhookEvent> {
    let event: WebhookEvent = serde_json::from_str(line)?;
    Ok(match event.id() {
        Some(_) => event,
        None => event.with_id(uuid::Uuid::new_v4().to_string()),
    })
}
