//! End-to-end tests: events flow through a robot whose apps talk to a mock
//! GitHub API for installation tokens and repository config.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hubbot_github::{AppAssertion, AppAuthenticator, CredentialCache};
use hubbot_protocol::WebhookEvent;
use hubbot_robot::{AppRegistry, Application, Context, Robot};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_KEY: &[u8] = include_bytes!("../crates/github/tests/fixtures/test-app-key.pem");

fn content_response(file: &str, content: &str) -> Value {
    let path = format!(".github/{file}");
    let url = format!("https://api.github.com/repos/bkeepers/probot/contents/{path}");
    let blob = "https://api.github.com/repos/bkeepers/probot/git/blobs/3d21ec53a331a6f037a91c368710b99387d012c1";
    json!({
        "type": "file",
        "encoding": "base64",
        "size": content.len(),
        "name": file,
        "path": path,
        "content": STANDARD.encode(content),
        "sha": "3d21ec53a331a6f037a91c368710b99387d012c1",
        "url": url,
        "git_url": blob,
        "html_url": format!("https://github.com/bkeepers/probot/blob/master/{path}"),
        "download_url": format!("https://raw.githubusercontent.com/bkeepers/probot/master/{path}"),
        "_links": {
            "git": blob,
            "self": url,
            "html": format!("https://github.com/bkeepers/probot/blob/master/{path}"),
        },
    })
}

async fn mock_github() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/app/installations/1/access_tokens"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "ghs_end_to_end",
            "expires_at": "2099-01-01T00:00:00Z",
        })))
        .expect(1)
        .mount(&server)
        .await;
    server
}

async fn mount_file(server: &MockServer, file: &str, content: &str) {
    let escaped = file.replace('.', r"\.");
    Mock::given(method("GET"))
        .and(path_regex(format!(
            r"^/repos/bkeepers/probot/contents/.*{escaped}$"
        )))
        .respond_with(ResponseTemplate::new(200).set_body_json(content_response(file, content)))
        .mount(server)
        .await;
}

async fn mount_missing(server: &MockServer, file: &str) {
    let escaped = file.replace('.', r"\.");
    Mock::given(method("GET"))
        .and(path_regex(format!(
            r"^/repos/bkeepers/probot/contents/.*{escaped}$"
        )))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest/repos/contents",
        })))
        .mount(server)
        .await;
}

fn robot_for(server: &MockServer, registry: AppRegistry) -> Robot {
    let assertion = AppAssertion::from_rsa_pem(1234, TEST_KEY).unwrap();
    let authenticator = AppAuthenticator::new(assertion).with_base_url(server.uri());
    let credentials = CredentialCache::new(Arc::new(authenticator)).with_base_url(server.uri());
    Robot::new(Arc::new(credentials), registry)
}

fn issue_opened() -> WebhookEvent {
    WebhookEvent::new(
        "issues",
        json!({
            "action": "opened",
            "issue": {"number": 12},
            "repository": {
                "name": "probot",
                "full_name": "bkeepers/probot",
                "owner": {"login": "bkeepers"},
            },
            "installation": {"id": 1},
        }),
    )
    .with_id("d4f6e1a0-5a2b-11ee-8c99-0242ac120002")
}

type Seen = Arc<Mutex<Vec<(String, Option<Value>)>>>;

/// An app that loads `file` with `defaults` and records what it got.
fn config_reader(
    seen: &Seen,
    file: &'static str,
    defaults: Option<Value>,
) -> impl Fn(&Application) -> hubbot_robot::Result<()> + Send + Sync + 'static {
    let seen = Arc::clone(seen);
    move |app: &Application| {
        let seen = Arc::clone(&seen);
        let defaults = defaults.clone();
        app.on("issues.opened", move |ctx: Context| {
            let seen = Arc::clone(&seen);
            let defaults = defaults.clone();
            async move {
                let config = ctx.config(file, defaults).await?;
                seen.lock().await.push((file.to_string(), config));
                Ok(())
            }
        })
    }
}

#[tokio::test]
async fn apps_load_repository_config_with_one_token() {
    let server = mock_github().await;
    mount_file(&server, "reader.yml", "foo: 5\nnested:\n  keep: file\n").await;
    mount_missing(&server, "absent.yml").await;

    let seen = Seen::default();
    let registry = AppRegistry::new()
        .with(
            "reader",
            config_reader(
                &seen,
                "reader.yml",
                Some(json!({"foo": 10, "bar": 7, "nested": {"keep": "default", "extra": true}})),
            ),
        )
        .with(
            "absent",
            config_reader(&seen, "absent.yml", Some(json!({"enabled": false}))),
        )
        .with("absent-no-default", config_reader(&seen, "absent.yml", None));

    let mut robot = robot_for(&server, registry);
    robot.setup(["reader", "absent", "absent-no-default"]).unwrap();

    robot.receive(issue_opened()).await.unwrap();
    robot.receive(issue_opened()).await.unwrap();

    let mut seen = seen.lock().await.clone();
    seen.sort_by_key(|(file, config)| (file.clone(), config.is_none()));
    seen.dedup();
    assert_eq!(
        seen,
        [
            ("absent.yml".to_string(), Some(json!({"enabled": false}))),
            ("absent.yml".to_string(), None),
            (
                "reader.yml".to_string(),
                Some(json!({"foo": 5, "bar": 7, "nested": {"keep": "file", "extra": true}}))
            ),
        ]
    );
}

#[tokio::test]
async fn unsafe_config_fails_the_delivery() {
    let server = mock_github().await;
    mount_file(
        &server,
        "evil.yml",
        "evil: !!js/function >\n  function () { console.log(\"pwned\") }\n",
    )
    .await;

    let seen = Seen::default();
    let registry = AppRegistry::new().with("evil", config_reader(&seen, "evil.yml", None));
    let mut robot = robot_for(&server, registry);
    robot.setup(["evil"]).unwrap();

    let err = robot.receive(issue_opened()).await.unwrap_err();

    assert!(err.to_string().contains("unknown tag"), "got {err}");
    assert!(err.credential_hint().is_none());
    assert!(seen.lock().await.is_empty());
}

#[tokio::test]
async fn rejected_assertion_carries_key_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/app/installations/1/access_tokens"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "A JSON web token could not be decoded",
            "documentation_url": "https://docs.github.com/rest",
        })))
        .mount(&server)
        .await;

    let seen = Seen::default();
    let registry = AppRegistry::new().with("reader", config_reader(&seen, "reader.yml", None));
    let mut robot = robot_for(&server, registry);
    robot.setup(["reader"]).unwrap();

    let err = robot.receive(issue_opened()).await.unwrap_err();

    assert_eq!(err.credential_hint(), Some(hubbot_github::PRIVATE_KEY_HINT));
}
