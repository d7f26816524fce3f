//! Event dispatch for hubbot.
//!
//! This crate is the core of a hubbot process: it routes webhook events to
//! the handlers apps registered, and gives each handler a [`Context`] with
//! the event, repository coordinates, repository config and an installation
//! client.
//!
//! # Overview
//!
//! - [`robot`]: [`Robot`], which fans each event out to every loaded app
//! - [`application`]: [`Application`], one app's routing table and dispatch
//! - [`context`]: [`Context`], the per-event handle handlers receive
//! - [`config`]: Safe YAML config loading with default merging
//! - [`registry`]: [`AppRegistry`], named app factories
//! - [`error`]: Error types for dispatch operations
//!
//! # Dispatch policy
//!
//! Both a robot and each of its apps run their members concurrently and wait
//! for all of them. If any member fails, the call fails with the first error
//! by completion time; siblings are never cancelled.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use hubbot_github::{AppAssertion, AppAuthenticator, CredentialCache};
//! use hubbot_protocol::WebhookEvent;
//! use hubbot_robot::{AppRegistry, Context, Robot};
//! use serde_json::{Value, json};
//!
//! # async fn example(pem: &[u8], payload: Value) -> anyhow::Result<()> {
//! let issuer = AppAuthenticator::new(AppAssertion::from_rsa_pem(1234, pem)?);
//! let credentials = Arc::new(CredentialCache::new(Arc::new(issuer)));
//!
//! let registry = AppRegistry::new().with("autolabel", |app| {
//!     app.on("issues.opened", |ctx: Context| async move {
//!         let config = ctx.config("autolabel.yml", Some(json!({"labels": []}))).await?;
//!         let issue = ctx.issue()?;
//!         println!("would label #{} with {:?}", issue.number, config);
//!         Ok(())
//!     })
//! });
//!
//! let mut robot = Robot::new(credentials, registry);
//! robot.setup(["autolabel"])?;
//! robot.receive(WebhookEvent::new("issues", payload)).await?;
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod config;
pub mod context;
pub mod error;
pub mod registry;
pub mod robot;

// Re-export primary types at crate root for convenience
pub use application::{Application, Handler, HandlerOutcome, aggregate_outcomes};
pub use config::ConfigLoader;
pub use context::Context;
pub use error::{DispatchError, Error, Result};
pub use registry::{AppFactory, AppRegistry};
pub use robot::Robot;
