#![allow(clippy::unwrap_used)]
// Integration tests for `Session` using wiremock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use fritzly_api::{Credentials, Error, Session, SessionOptions, SessionState};

// ── Helpers ─────────────────────────────────────────────────────────

const CHALLENGE: &str = "1234567z";
const SID: &str = "8d8e2d15e0c2b6f4";
/// `challenge_response("1234567z", "äbc")`
const RESPONSE: &str = "1234567z-9e224a41eeefa284df7bb0f26c2913e2";

fn session_info(sid: &str, challenge: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?><SessionInfo><SID>{sid}</SID>\
         <Challenge>{challenge}</Challenge><BlockTime>0</BlockTime><Rights></Rights></SessionInfo>"
    )
}

fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/xml")
}

async fn setup_with(options: SessionOptions) -> (MockServer, Session) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let credentials = Credentials::new(Some("admin".into()), "äbc".to_string().into());
    let session = Session::with_client(reqwest::Client::new(), base_url, credentials, options);
    (server, session)
}

async fn setup() -> (MockServer, Session) {
    setup_with(SessionOptions::default()).await
}

/// Challenge on GET, session id on a correct POST.
async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .respond_with(xml(session_info("0000000000000000", CHALLENGE)))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login_sid.lua"))
        .and(body_string_contains(format!("response={RESPONSE}")))
        .respond_with(xml(session_info(SID, CHALLENGE)))
        .mount(server)
        .await;
}

/// Answers `query.lua` like the router: one `"aN": "<cmd>=value"` per argument.
struct EchoQuery {
    seen: Arc<Mutex<Vec<usize>>>,
}

impl Respond for EchoQuery {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let fragments: Vec<String> = request
            .url
            .query_pairs()
            .filter(|(k, _)| k.starts_with('a'))
            .map(|(k, v)| format!("\"{k}\": \"{v}=value\""))
            .collect();
        self.seen.lock().unwrap().push(fragments.len());
        ResponseTemplate::new(200).set_body_string(format!("{{{}}}", fragments.join(",\n")))
    }
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, session) = setup().await;
    mount_login(&server).await;

    assert_eq!(session.state(), SessionState::Unauthenticated);
    session.login(&CancellationToken::new()).await.unwrap();

    assert_eq!(session.state(), SessionState::Authenticated);
    assert_eq!(session.sid().as_str(), SID);
    assert!(session.idle_for().is_some());
}

#[tokio::test]
async fn test_login_sends_username() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .respond_with(xml(session_info("0000000000000000", CHALLENGE)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login_sid.lua"))
        .and(body_string_contains("username=admin"))
        .respond_with(xml(session_info(SID, CHALLENGE)))
        .expect(1)
        .mount(&server)
        .await;

    session.login(&CancellationToken::new()).await.unwrap();
}

#[tokio::test]
async fn test_login_rejected() {
    let (server, session) = setup().await;

    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .respond_with(xml(session_info("0000000000000000", CHALLENGE)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login_sid.lua"))
        .respond_with(xml(session_info("0000000000000000", "99999999")))
        .mount(&server)
        .await;

    let result = session.login(&CancellationToken::new()).await;
    assert!(
        matches!(result, Err(Error::LoginFailed { .. })),
        "expected LoginFailed, got: {result:?}"
    );
    assert_eq!(session.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_relogin_adopts_live_session() {
    let (server, session) = setup().await;
    mount_login(&server).await;
    let cancel = CancellationToken::new();
    session.login(&cancel).await.unwrap();

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .and(query_param("sid", SID))
        .respond_with(xml(session_info(SID, CHALLENGE)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/login_sid.lua"))
        .respond_with(xml(session_info(SID, CHALLENGE)))
        .expect(0)
        .mount(&server)
        .await;

    session.login(&cancel).await.unwrap();
    assert_eq!(session.sid().as_str(), SID);
}

#[tokio::test]
async fn test_invalidate_reports_validity() {
    let (server, session) = setup().await;
    mount_login(&server).await;
    let cancel = CancellationToken::new();
    session.login(&cancel).await.unwrap();

    // The mounted GET answers with the zero sid: the router forgot us.
    assert!(!session.invalidate(&cancel).await.unwrap());
}

#[tokio::test]
async fn test_logout() {
    let (server, session) = setup().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/home/home.lua"))
        .and(query_param("sid", SID))
        .and(query_param("logout", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<script>location.href=\"/login.lua\"</script>"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    session.login(&cancel).await.unwrap();
    assert!(session.logout(&cancel).await.unwrap());
    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert!(session.idle_for().is_none());
}

#[tokio::test]
async fn test_logout_resets_even_on_transport_failure() {
    let (server, session) = setup().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/home/home.lua"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    session.login(&cancel).await.unwrap();
    let result = session.logout(&cancel).await;
    assert!(matches!(result, Err(Error::Transport(_))));
    assert_eq!(session.state(), SessionState::Unauthenticated);
}

// ── Session gate tests ──────────────────────────────────────────────

#[tokio::test]
async fn test_force_session_requires_login() {
    let (_server, session) = setup().await;
    let result = session.force_session(&CancellationToken::new()).await;
    assert!(matches!(result, Err(Error::InvalidSession { .. })));
}

#[tokio::test]
async fn test_idle_timeout_reconnects_once() {
    let (server, session) = setup_with(SessionOptions {
        idle_timeout: Duration::from_millis(50),
        ..SessionOptions::default()
    })
    .await;

    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .respond_with(xml(session_info("0000000000000000", CHALLENGE)))
        .mount(&server)
        .await;
    // Initial login + exactly one reconnect.
    Mock::given(method("POST"))
        .and(path("/login_sid.lua"))
        .respond_with(xml(session_info(SID, CHALLENGE)))
        .expect(2)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    session.login(&cancel).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;

    session.force_session(&cancel).await.unwrap();
    assert_eq!(session.state(), SessionState::Authenticated);
    // Freshly touched: no second reconnect.
    session.force_session(&cancel).await.unwrap();
}

#[tokio::test]
async fn test_idle_timeout_without_reconnect_fails() {
    let (server, session) = setup_with(SessionOptions {
        idle_timeout: Duration::from_millis(50),
        auto_reconnect: false,
        ..SessionOptions::default()
    })
    .await;
    mount_login(&server).await;

    let cancel = CancellationToken::new();
    session.login(&cancel).await.unwrap();
    tokio::time::sleep(Duration::from_millis(120)).await;

    match session.force_session(&cancel).await {
        Err(Error::InvalidSession { reason }) => assert!(reason.contains("timed out")),
        other => panic!("expected InvalidSession, got: {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_idle_session_still_valid_is_kept() {
    let (server, session) = setup_with(SessionOptions {
        idle_timeout: Duration::from_millis(50),
        ..SessionOptions::default()
    })
    .await;
    mount_login(&server).await;
    let cancel = CancellationToken::new();
    session.login(&cancel).await.unwrap();

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .and(query_param("sid", SID))
        .respond_with(xml(session_info(SID, "")))
        .expect(1)
        .mount(&server)
        .await;

    tokio::time::sleep(Duration::from_millis(120)).await;
    session.force_session(&cancel).await.unwrap();
    assert_eq!(session.sid().as_str(), SID);
}

// ── Query tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_query_returns_values_in_request_order() {
    let (server, session) = setup_with(SessionOptions {
        max_url_length: 200,
        ..SessionOptions::default()
    })
    .await;
    mount_login(&server).await;

    let seen = Arc::new(Mutex::new(Vec::new()));
    Mock::given(method("GET"))
        .and(path("/query.lua"))
        .and(query_param("sid", SID))
        .respond_with(EchoQuery {
            seen: Arc::clone(&seen),
        })
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    session.login(&cancel).await.unwrap();

    let commands: Vec<String> = (0..40).map(|i| format!("sar:status/value_{i}")).collect();
    let values = session.query(&commands, None, &cancel).await.unwrap();

    let expected: Vec<String> = commands.iter().map(|c| format!("{c}=value")).collect();
    assert_eq!(values, expected);

    let seen = seen.lock().unwrap();
    assert!(seen.len() > 1, "expected several partitions, got {seen:?}");
    assert_eq!(seen.iter().sum::<usize>(), 40);
}

#[tokio::test]
async fn test_query_reports_progress() {
    let (server, session) = setup_with(SessionOptions {
        max_url_length: 150,
        ..SessionOptions::default()
    })
    .await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/query.lua"))
        .respond_with(EchoQuery {
            seen: Arc::default(),
        })
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    session.login(&cancel).await.unwrap();

    let reports = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    let progress = move |done: usize, total: usize| sink.lock().unwrap().push((done, total));

    let commands: Vec<String> = (0..12).map(|i| format!("cmd_{i}")).collect();
    session
        .query(&commands, Some(&progress), &cancel)
        .await
        .unwrap();

    let reports = reports.lock().unwrap();
    assert_eq!(reports.last(), Some(&(12, 12)));
    assert!(reports.windows(2).all(|w| w[0].0 < w[1].0));
}

#[tokio::test]
async fn test_query_missing_value_is_protocol_error() {
    let (server, session) = setup().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/query.lua"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"a0": "1"}"#))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    session.login(&cancel).await.unwrap();
    let result = session.query(&["x", "y"], None, &cancel).await;
    assert!(matches!(result, Err(Error::Protocol { .. })), "got: {result:?}");
}

#[tokio::test]
async fn test_query_oversized_item_fails_before_network() {
    let (server, session) = setup().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let huge = "x".repeat(5000);
    let result = session
        .query(&[huge], None, &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(Error::ItemTooLong { .. })));
}

#[tokio::test]
async fn test_query_cancellation_aborts_in_flight_requests() {
    let (server, session) = setup().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/query.lua"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"a0": "1"}"#)
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    session.login(&cancel).await.unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = session.query(&["x"], None, &cancel).await;
    assert!(matches!(result, Err(Error::Cancelled)), "got: {result:?}");
}

// ── Command submission tests ────────────────────────────────────────

#[tokio::test]
async fn test_submit_posts_webcm_form() {
    let (server, session) = setup().await;
    mount_login(&server).await;
    Mock::given(method("POST"))
        .and(path("/cgi-bin/webcm"))
        .and(body_string_contains(format!("sid={SID}")))
        .and(body_string_contains("wlan%3Asettings%2Fap_enabled=1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    session.login(&cancel).await.unwrap();
    let body = session
        .submit(&[("wlan:settings/ap_enabled".into(), "1".into())], &cancel)
        .await
        .unwrap();
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn test_submit_without_session_fails() {
    let (_server, session) = setup().await;
    let result = session
        .submit(&[("k".into(), "v".into())], &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(Error::InvalidSession { .. })));
}
