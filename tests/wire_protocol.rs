//! End-to-end tests against a stub WebDriver endpoint.
//!
//! These spin up a real HTTP server on a random port that answers in a
//! chosen wire-protocol generation and records every request, then verify
//! negotiation, path templating, protocol stickiness, error mapping, and
//! the unsupported-command short circuit.

use std::sync::{Arc, Mutex};

use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde_json::{json, Value};

use rudder::{By, Capabilities, Driver, Protocol, RudderError};

const W3C_ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Which generation the stub endpoint speaks.
#[derive(Debug, Clone, Copy, PartialEq)]
enum StubMode {
    W3c,
    Legacy,
    /// Negotiates W3C, then answers later commands in legacy-shaped
    /// envelopes — simulating a flaky endpoint that must not cause the
    /// client to re-derive its protocol.
    FlakyAfterW3c,
    /// Returns garbage from the new-session endpoint.
    Broken,
}

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    body: Value,
}

type Log = Arc<Mutex<Vec<Recorded>>>;

#[derive(Clone)]
struct StubState {
    mode: StubMode,
    log: Log,
}

async fn stub_handler(State(state): State<StubState>, request: Request) -> impl IntoResponse {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let bytes = to_bytes(request.into_body(), 1 << 20).await.unwrap_or_default();
    let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    state.log.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        body: body.clone(),
    });

    let (status, reply) = respond(state.mode, &method, &path, &body);
    (status, Json(reply))
}

fn respond(mode: StubMode, method: &str, path: &str, body: &Value) -> (StatusCode, Value) {
    match mode {
        StubMode::Broken => (StatusCode::OK, json!({"ok": true})),
        StubMode::W3c => respond_w3c(method, path, body),
        StubMode::Legacy => respond_legacy(method, path, body),
        StubMode::FlakyAfterW3c => {
            if method == "POST" && path == "/session" {
                return respond_w3c(method, path, body);
            }
            // Legacy-shaped success envelope for everything afterwards.
            (
                StatusCode::OK,
                json!({"sessionId": "w3c-session-1", "status": 0, "value": "win-x"}),
            )
        }
    }
}

fn respond_w3c(method: &str, path: &str, body: &Value) -> (StatusCode, Value) {
    match (method, path) {
        ("POST", "/session") => (
            StatusCode::OK,
            json!({"value": {
                "sessionId": "w3c-session-1",
                "capabilities": {"browserName": "firefox"},
            }}),
        ),
        ("POST", "/session/w3c-session-1/element") => {
            if body["value"].as_str() == Some("#missing") {
                return (
                    StatusCode::NOT_FOUND,
                    json!({"value": {
                        "error": "no such element",
                        "message": "Unable to locate element: #missing",
                        "stacktrace": "",
                    }}),
                );
            }
            (StatusCode::OK, json!({"value": {W3C_ELEMENT_KEY: "elem-77"}}))
        }
        ("POST", "/session/w3c-session-1/elements") => (StatusCode::OK, json!({"value": []})),
        ("GET", "/session/w3c-session-1/timeouts") => (
            StatusCode::NOT_FOUND,
            json!({"value": {
                "error": "unknown command",
                "message": "GET /session/w3c-session-1/timeouts not implemented",
                "stacktrace": "",
            }}),
        ),
        _ => (StatusCode::OK, json!({"value": null})),
    }
}

fn respond_legacy(method: &str, path: &str, _body: &Value) -> (StatusCode, Value) {
    match (method, path) {
        ("POST", "/session") => (
            StatusCode::OK,
            json!({
                "sessionId": "legacy-session-9",
                "status": 0,
                "value": {"browserName": "firefox"},
            }),
        ),
        ("POST", "/session/legacy-session-9/element") => (
            StatusCode::OK,
            json!({"status": 0, "value": {"ELEMENT": "e-9"}}),
        ),
        ("GET", "/session/legacy-session-9/window_handle") => {
            (StatusCode::OK, json!({"status": 0, "value": "w-0"}))
        }
        ("POST", "/session/legacy-session-9/element/e-9/toggle") => (
            StatusCode::OK,
            json!({"status": 10, "value": {"message": "element went stale"}}),
        ),
        _ => (StatusCode::OK, json!({"status": 0, "value": null})),
    }
}

/// Honor `RUST_LOG` for wire-level debugging of a failing test run.
fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

async fn spawn_stub(mode: StubMode) -> (String, Log) {
    init_tracing();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: Log = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        mode,
        log: log.clone(),
    };
    let app = Router::new().fallback(stub_handler).with_state(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), log)
}

fn paths(log: &Log) -> Vec<(String, String)> {
    log.lock()
        .unwrap()
        .iter()
        .map(|r| (r.method.clone(), r.path.clone()))
        .collect()
}

#[tokio::test]
async fn w3c_negotiation_find_and_click_use_templated_paths() {
    let (url, log) = spawn_stub(StubMode::W3c).await;
    let driver = Driver::connect(&url, Capabilities::new().browser_name("firefox"))
        .await
        .unwrap();

    assert_eq!(driver.session().protocol(), Protocol::W3c);
    assert_eq!(driver.session().id(), "w3c-session-1");

    let body = driver.find_element(By::TagName, "body").await.unwrap();
    assert_eq!(body.id(), "elem-77");
    body.click().await.unwrap();

    let recorded = paths(&log);
    assert!(recorded.contains(&(
        "POST".to_string(),
        "/session/w3c-session-1/element".to_string()
    )));
    assert!(recorded.contains(&(
        "POST".to_string(),
        "/session/w3c-session-1/element/elem-77/click".to_string()
    )));

    // The locator strategy went on the wire untranslated (tag name exists
    // in both generations).
    let find = log
        .lock()
        .unwrap()
        .iter()
        .find(|r| r.path.ends_with("/element"))
        .cloned()
        .unwrap();
    assert_eq!(find.body, json!({"using": "tag name", "value": "body"}));

    driver.quit().await.unwrap();
    let recorded = paths(&log);
    assert!(recorded.contains(&(
        "DELETE".to_string(),
        "/session/w3c-session-1".to_string()
    )));
}

#[tokio::test]
async fn legacy_negotiation_normalizes_element_ids_and_locators() {
    let (url, log) = spawn_stub(StubMode::Legacy).await;
    let driver = Driver::connect(&url, Capabilities::new().browser_name("firefox"))
        .await
        .unwrap();

    assert_eq!(driver.session().protocol(), Protocol::Legacy);
    assert_eq!(driver.session().id(), "legacy-session-9");

    // Legacy wrapped element id comes back canonical.
    let element = driver.find_element(By::Id, "login").await.unwrap();
    assert_eq!(element.id(), "e-9");

    // Under legacy the id strategy goes through untranslated.
    let find = log
        .lock()
        .unwrap()
        .iter()
        .find(|r| r.path.ends_with("/element"))
        .cloned()
        .unwrap();
    assert_eq!(find.body, json!({"using": "id", "value": "login"}));

    // Legacy window-handle path, not the W3C one.
    assert_eq!(driver.window_handle().await.unwrap(), "w-0");
    let recorded = paths(&log);
    assert!(recorded.contains(&(
        "GET".to_string(),
        "/session/legacy-session-9/window_handle".to_string()
    )));

    // A nonzero legacy status is mapped to the shared slug vocabulary.
    let err = element.toggle().await.unwrap_err();
    match err {
        RudderError::Remote { error, message } => {
            assert_eq!(error, "stale element reference");
            assert_eq!(message, "element went stale");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
}

#[tokio::test]
async fn protocol_is_never_rederived_from_later_responses() {
    let (url, log) = spawn_stub(StubMode::FlakyAfterW3c).await;
    let driver = Driver::connect(&url, Capabilities::new()).await.unwrap();
    assert_eq!(driver.session().protocol(), Protocol::W3c);

    // The endpoint now answers in legacy envelopes, but every dispatch must
    // keep using the originally negotiated W3C bindings.
    for _ in 0..3 {
        let handle = driver.window_handle().await.unwrap();
        assert_eq!(handle, "win-x");
    }

    let recorded = paths(&log);
    let window_gets: Vec<_> = recorded
        .iter()
        .filter(|(m, p)| m == "GET" && p.contains("/window"))
        .collect();
    assert_eq!(window_gets.len(), 3);
    for (_, path) in window_gets {
        assert_eq!(path, "/session/w3c-session-1/window");
    }
}

#[tokio::test]
async fn unsupported_command_never_reaches_the_wire() {
    let (url, log) = spawn_stub(StubMode::W3c).await;
    let driver = Driver::connect(&url, Capabilities::new()).await.unwrap();
    let element = driver.find_element(By::Css, "#ok").await.unwrap();
    let requests_before = log.lock().unwrap().len();

    // Legacy-only command under a W3C session.
    let err = element.toggle().await.unwrap_err();
    assert!(
        matches!(err, RudderError::UnsupportedCommand { .. }),
        "{err:?}"
    );
    // Legacy-only driver command too.
    let err = driver.send_keys_to_active_element("x").await.unwrap_err();
    assert!(
        matches!(err, RudderError::UnsupportedCommand { .. }),
        "{err:?}"
    );

    assert_eq!(log.lock().unwrap().len(), requests_before);
}

#[tokio::test]
async fn w3c_only_commands_are_unsupported_under_a_legacy_session() {
    let (url, _log) = spawn_stub(StubMode::Legacy).await;
    let driver = Driver::connect(&url, Capabilities::new()).await.unwrap();

    let err = driver.window_rect().await.unwrap_err();
    assert!(
        matches!(err, RudderError::UnsupportedCommand { .. }),
        "{err:?}"
    );
    let err = driver.release_actions().await.unwrap_err();
    assert!(
        matches!(err, RudderError::UnsupportedCommand { .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn remote_failure_slug_and_message_survive_verbatim() {
    let (url, _log) = spawn_stub(StubMode::W3c).await;
    let driver = Driver::connect(&url, Capabilities::new()).await.unwrap();

    let err = driver.find_element(By::Css, "#missing").await.unwrap_err();
    match err {
        RudderError::Remote { error, message } => {
            assert_eq!(error, "no such element");
            assert_eq!(message, "Unable to locate element: #missing");
        }
        other => panic!("expected Remote, got {other:?}"),
    }
}

#[tokio::test]
async fn zero_matches_is_an_empty_vec_not_an_error() {
    let (url, _log) = spawn_stub(StubMode::W3c).await;
    let driver = Driver::connect(&url, Capabilities::new()).await.unwrap();
    let elements = driver.find_elements(By::Css, ".nothing").await.unwrap();
    assert!(elements.is_empty());
}

#[tokio::test]
async fn endpoint_omitting_the_timeout_getter_reads_as_unsupported() {
    let (url, _log) = spawn_stub(StubMode::W3c).await;
    let driver = Driver::connect(&url, Capabilities::new()).await.unwrap();

    // The binding exists under W3C, but this endpoint answers "unknown
    // command" — callers must see the same unsupported outcome as a
    // missing binding, with no per-vendor special case.
    let err = driver.timeouts().await.unwrap_err();
    assert!(
        matches!(err, RudderError::UnsupportedCommand { .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn click_strategies_choose_the_documented_wire_calls() {
    use rudder::ClickStrategy;

    let (url, log) = spawn_stub(StubMode::W3c).await;
    let driver = Driver::connect(&url, Capabilities::new()).await.unwrap();
    let element = driver.find_element(By::Css, "#submit").await.unwrap();

    // Keyboard activation sends Enter to the element's value endpoint.
    element.click_with(ClickStrategy::Keyboard).await.unwrap();
    let keys = log.lock().unwrap().last().cloned().unwrap();
    assert_eq!(keys.path, "/session/w3c-session-1/element/elem-77/value");
    assert_eq!(keys.body["text"], json!("\u{e007}"));

    // Script strategy injects a DOM click keyed by the recorded selector.
    element.click_with(ClickStrategy::Script).await.unwrap();
    let script = log.lock().unwrap().last().cloned().unwrap();
    assert_eq!(script.path, "/session/w3c-session-1/execute/sync");
    assert_eq!(script.body["args"], json!(["#submit"]));

    // A handle found by tag name records no CSS selector, so the script
    // strategy fails closed into the plain wire click.
    let by_tag = driver.find_element(By::TagName, "body").await.unwrap();
    by_tag.click_with(ClickStrategy::Script).await.unwrap();
    let fallback = log.lock().unwrap().last().cloned().unwrap();
    assert_eq!(
        fallback.path,
        "/session/w3c-session-1/element/elem-77/click"
    );

    // Attribute reads template both the element id and the attribute name
    // into the path.
    element.attribute("href").await.unwrap();
    let attr = log.lock().unwrap().last().cloned().unwrap();
    assert_eq!(
        attr.path,
        "/session/w3c-session-1/element/elem-77/attribute/href"
    );
}

#[tokio::test]
async fn broken_endpoint_fails_negotiation() {
    let (url, _log) = spawn_stub(StubMode::Broken).await;
    let err = Driver::connect(&url, Capabilities::new()).await.unwrap_err();
    assert!(matches!(err, RudderError::Negotiation(_)), "{err:?}");
}
