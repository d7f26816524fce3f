//! Integration tests for event routing through a robot.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use hubbot_github::{CredentialCache, InstallationToken, TokenIssuer};
use hubbot_protocol::{InstallationId, WebhookEvent};
use hubbot_robot::{Application, Context, Error, Robot};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::sync::Mutex;

struct StaticIssuer {
    calls: AtomicUsize,
}

#[async_trait]
impl TokenIssuer for StaticIssuer {
    async fn issue(&self, _: InstallationId) -> hubbot_github::Result<InstallationToken> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        Ok(InstallationToken {
            token: SecretString::from("ghs_static".to_string()),
            expires_at: None,
        })
    }
}

fn issuer() -> Arc<StaticIssuer> {
    Arc::new(StaticIssuer {
        calls: AtomicUsize::new(0),
    })
}

fn robot_with(issuer: &Arc<StaticIssuer>) -> Robot {
    let credentials = CredentialCache::new(Arc::clone(issuer) as Arc<dyn TokenIssuer>);
    Robot::new(Arc::new(credentials), Default::default())
}

fn test_event() -> WebhookEvent {
    WebhookEvent::new(
        "test",
        json!({
            "action": "foo",
            "installation": {"id": 1},
        }),
    )
}

/// Loads an app with one handler under `pattern` counting its calls.
fn load_spy(robot: &mut Robot, pattern: &'static str) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    robot
        .load_with("spy", move |app: &Application| {
            let counter = Arc::clone(&counter);
            app.on(pattern, move |_ctx: Context| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
        })
        .unwrap();
    calls
}

#[tokio::test]
async fn calls_handler_when_no_action_is_specified() {
    let mut robot = robot_with(&issuer());
    let calls = load_spy(&mut robot, "test");

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    robot.receive(test_event()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn calls_handler_with_same_action() {
    let mut robot = robot_with(&issuer());
    let calls = load_spy(&mut robot, "test.foo");

    robot.receive(test_event()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn does_not_call_handler_with_different_action() {
    let mut robot = robot_with(&issuer());
    let calls = load_spy(&mut robot, "test.nope");

    robot.receive(test_event()).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn calls_handler_with_wildcard() {
    let mut robot = robot_with(&issuer());
    let calls = load_spy(&mut robot, "*");

    robot.receive(test_event()).await.unwrap();
    robot
        .receive(WebhookEvent::new("push", json!({})))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn action_patterns_ignore_events_without_action() {
    let mut robot = robot_with(&issuer());
    let calls = load_spy(&mut robot, "test.foo");

    robot
        .receive(WebhookEvent::new("test", json!({})))
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn handler_sees_the_delivered_payload() {
    let mut robot = robot_with(&issuer());
    let seen: Arc<Mutex<Option<Value>>> = Arc::default();
    let sink = Arc::clone(&seen);
    robot
        .load_with("payload", move |app: &Application| {
            let sink = Arc::clone(&sink);
            app.on("test", move |ctx: Context| {
                let sink = Arc::clone(&sink);
                async move {
                    *sink.lock().await = Some(ctx.payload().clone());
                    Ok(())
                }
            })
        })
        .unwrap();

    let event = test_event();
    let payload = event.payload().clone();
    robot.receive(event).await.unwrap();

    assert_eq!(seen.lock().await.as_ref(), Some(&payload));
}

#[tokio::test(start_paused = true)]
async fn waits_for_async_handlers() {
    let mut robot = robot_with(&issuer());
    let done = Arc::new(AtomicUsize::new(0));
    let flag = Arc::clone(&done);
    robot
        .load_with("slow", move |app: &Application| {
            let flag = Arc::clone(&flag);
            app.on("test", move |_ctx: Context| {
                let flag = Arc::clone(&flag);
                async move {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    flag.store(1, Ordering::SeqCst);
                    Ok(())
                }
            })
        })
        .unwrap();

    robot.receive(test_event()).await.unwrap();
    assert_eq!(done.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn surfaces_handler_errors() {
    let mut robot = robot_with(&issuer());
    robot
        .load_with("broken", |app: &Application| {
            app.on("test", |_ctx: Context| async {
                anyhow::bail!("error from plugin")
            })
        })
        .unwrap();

    let err = robot.receive(test_event()).await.unwrap_err();
    assert!(matches!(err, Error::Dispatch(_)));
    assert!(err.to_string().contains("error from plugin"), "got {err}");
}

#[tokio::test(start_paused = true)]
async fn apps_share_one_credential_issuance() {
    let issuer = issuer();
    let mut robot = robot_with(&issuer);
    for name in ["one", "two", "three"] {
        robot
            .load_with(name, |app: &Application| {
                app.on("test", |ctx: Context| async move {
                    ctx.github().await?;
                    Ok(())
                })
            })
            .unwrap();
    }

    robot.receive(test_event()).await.unwrap();
    robot.receive(test_event()).await.unwrap();

    assert_eq!(issuer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_installation_fails_only_handlers_that_need_github() {
    let mut robot = robot_with(&issuer());
    let calls = load_spy(&mut robot, "test");
    robot
        .load_with("needs-github", |app: &Application| {
            app.on("test", |ctx: Context| async move {
                ctx.github().await?;
                Ok(())
            })
        })
        .unwrap();

    let err = robot
        .receive(WebhookEvent::new("test", json!({"action": "foo"})))
        .await
        .unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(err.to_string().contains("does not reference an installation"), "got {err}");
}
