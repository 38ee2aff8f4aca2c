use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use evently_api::mailer::Mailer;
use evently_api::payments::{ChargeRequest, FreeEventsGateway, PaymentGateway, PaymentResult};
use evently_api::uploads::UploadDir;
use evently_api::{AppState, AppStateInner, router};
use evently_crypto::TextCipher;
use evently_db::{Database, DocStore};
use evently_types::models::Role;

const ADMIN_EMAIL: &str = "admin@example.com";
const PASSWORD: &str = "hunter2hunter2";

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    fn last_token(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let (_, link) = sent.last()?;
        link.rsplit('/').next().map(str::to_string)
    }

    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, to: &str, link: &str) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push((to.to_string(), link.to_string()));
        Ok(())
    }
}

struct BrokenMailer;

#[async_trait]
impl Mailer for BrokenMailer {
    async fn send_password_reset(&self, _to: &str, _link: &str) -> anyhow::Result<()> {
        anyhow::bail!("smtp connection refused")
    }
}

struct ScriptedGateway(PaymentResult);

#[async_trait]
impl PaymentGateway for ScriptedGateway {
    async fn charge(&self, _req: &ChargeRequest) -> PaymentResult {
        self.0.clone()
    }
}

struct TestApp {
    app: Router,
    state: AppState,
    _public: TempDir,
}

fn build(mailer: Arc<dyn Mailer>, payments: Arc<dyn PaymentGateway>) -> TestApp {
    let public = tempfile::tempdir().unwrap();
    std::fs::write(public.path().join("index.html"), "<h1>Evently</h1>").unwrap();

    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        docs: DocStore::open_in_memory().unwrap(),
        jwt_secret: "test-jwt-secret".into(),
        cipher: TextCipher::from_secret("test-encryption-secret").unwrap(),
        uploads: UploadDir::new(public.path().join("uploads")),
        mailer,
        payments,
        public_dir: public.path().to_path_buf(),
        public_url: "http://evently.test/".into(),
        admin_email: Some(ADMIN_EMAIL.into()),
    });

    TestApp {
        app: router(state.clone()),
        state,
        _public: public,
    }
}

fn test_app() -> TestApp {
    build(Arc::new(RecordingMailer::default()), Arc::new(FreeEventsGateway))
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, headers, body)
}

async fn register(app: &Router, email: &str) -> (Uuid, String) {
    let (status, _, body) = send(
        app,
        request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Test User", "email": email, "password": PASSWORD })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["user_id"].as_str().unwrap().parse().unwrap();
    (id, body["token"].as_str().unwrap().to_string())
}

// -- Tags --

#[tokio::test]
async fn duplicate_tag_names_create_distinct_records() {
    let t = test_app();
    let mut ids = Vec::new();
    for _ in 0..2 {
        let (status, _, body) = send(
            &t.app,
            request(Method::POST, "/api/tags", None, Some(json!({ "name": "music" }))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["name"], "music");
        ids.push(body["id"].as_str().unwrap().to_string());
    }
    assert_ne!(ids[0], ids[1]);

    let (status, _, body) = send(&t.app, request(Method::GET, "/api/tags", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let tags = body.as_array().unwrap();
    assert_eq!(tags.len(), 2);
    assert_eq!(tags[0]["id"], ids[0].as_str());
}

#[tokio::test]
async fn create_tag_without_name_is_a_server_error() {
    let t = test_app();
    let (status, _, body) =
        send(&t.app, request(Method::POST, "/api/tags", None, Some(json!({})))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "message": "Failed to create tag" }));

    let (status, _, body) = send(&t.app, request(Method::POST, "/api/tags", None, None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "message": "Failed to create tag" }));
}

// -- Private messages --

#[tokio::test]
async fn scoped_mutations_collapse_missing_and_foreign_messages() {
    let t = test_app();
    let (_alice_id, alice) = register(&t.app, "alice@example.com").await;
    let (bob_id, bob) = register(&t.app, "bob@example.com").await;

    let (status, _, sent) = send(
        &t.app,
        request(
            Method::POST,
            "/api/messages",
            Some(&alice),
            Some(json!({ "recipient_id": bob_id, "content": "see you there" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let message_uri = format!("/api/messages/{}", sent["id"].as_str().unwrap());
    let missing_uri = format!("/api/messages/{}", Uuid::new_v4());
    let edit = json!({ "content": "edited" });

    // Bob is not the sender; a random id does not exist. Same answer for both.
    let foreign = send(&t.app, request(Method::PATCH, &message_uri, Some(&bob), Some(edit.clone()))).await;
    let missing = send(&t.app, request(Method::PATCH, &missing_uri, Some(&alice), Some(edit.clone()))).await;
    assert_eq!(foreign.0, StatusCode::OK);
    assert_eq!(foreign.0, missing.0);
    assert_eq!(foreign.2, json!({ "count": 0 }));
    assert_eq!(foreign.2, missing.2);

    let (status, _, body) = send(&t.app, request(Method::PATCH, &message_uri, Some(&alice), Some(edit))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": 1 }));

    let (_, _, inbox) = send(&t.app, request(Method::GET, "/api/messages", Some(&bob), None)).await;
    assert_eq!(inbox[0]["content"], "edited");

    let foreign = send(&t.app, request(Method::DELETE, &message_uri, Some(&bob), None)).await;
    let missing = send(&t.app, request(Method::DELETE, &missing_uri, Some(&alice), None)).await;
    assert_eq!(foreign.2, json!({ "count": 0 }));
    assert_eq!(foreign.2, missing.2);

    let (_, _, body) = send(&t.app, request(Method::DELETE, &message_uri, Some(&alice), None)).await;
    assert_eq!(body, json!({ "count": 1 }));

    let (_, _, inbox) = send(&t.app, request(Method::GET, "/api/messages", Some(&bob), None)).await;
    assert_eq!(inbox, json!([]));
}

#[tokio::test]
async fn message_bodies_are_encrypted_at_rest() {
    let t = test_app();
    let (alice_id, alice) = register(&t.app, "alice@example.com").await;
    let (bob_id, _) = register(&t.app, "bob@example.com").await;

    send(
        &t.app,
        request(
            Method::POST,
            "/api/messages",
            Some(&alice),
            Some(json!({ "recipient_id": bob_id, "content": "the door code is 4321" })),
        ),
    )
    .await;

    let rows = t.state.db.get_private_messages_for_user(&alice_id.to_string(), 10).unwrap();
    assert_eq!(rows.len(), 1);
    assert!(!rows[0].content.contains("4321"));
    assert_eq!(t.state.cipher.decrypt(&rows[0].content).unwrap(), "the door code is 4321");
}

#[tokio::test]
async fn messages_validate_input_and_require_auth() {
    let t = test_app();
    let (status, _, body) = send(&t.app, request(Method::GET, "/api/messages", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "unauthorized" }));

    let (_, alice) = register(&t.app, "alice@example.com").await;
    let (status, _, _) = send(
        &t.app,
        request(
            Method::POST,
            "/api/messages",
            Some(&alice),
            Some(json!({ "recipient_id": Uuid::new_v4(), "content": "hello?" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// -- Password reset --

#[tokio::test]
async fn password_reset_round_trip() {
    let mailer = Arc::new(RecordingMailer::default());
    let t = build(mailer.clone(), Arc::new(FreeEventsGateway));
    register(&t.app, "carol@example.com").await;

    let (status, _, body) = send(
        &t.app,
        request(Method::POST, "/api/forgot-password", None, Some(json!({ "email": "carol@example.com" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    assert_eq!(body.as_object().unwrap().len(), 1);

    let sent = mailer.sent.lock().unwrap().clone();
    assert_eq!(sent[0].0, "carol@example.com");
    assert!(sent[0].1.starts_with("http://evently.test/reset-password/"));
    let token = mailer.last_token().unwrap();

    let reset = json!({ "token": token, "password": "brand-new-password" });
    let (status, _, body) =
        send(&t.app, request(Method::POST, "/api/reset-password", None, Some(reset.clone()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Password has been reset" }));

    let (status, _, _) = send(
        &t.app,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "carol@example.com", "password": "brand-new-password" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Single use
    let (status, _, body) = send(&t.app, request(Method::POST, "/api/reset-password", None, Some(reset))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid or expired reset token" }));
}

#[tokio::test]
async fn forgot_password_for_unknown_email_sends_nothing() {
    let mailer = Arc::new(RecordingMailer::default());
    let t = build(mailer.clone(), Arc::new(FreeEventsGateway));

    let (status, _, body) = send(
        &t.app,
        request(Method::POST, "/api/forgot-password", None, Some(json!({ "email": "ghost@example.com" }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].is_string());
    assert_eq!(mailer.count(), 0);
}

#[tokio::test]
async fn forgot_password_mail_failure_is_500() {
    let t = build(Arc::new(BrokenMailer), Arc::new(FreeEventsGateway));
    register(&t.app, "dave@example.com").await;

    let (status, _, body) = send(
        &t.app,
        request(Method::POST, "/api/forgot-password", None, Some(json!({ "email": "dave@example.com" }))),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "Failed to send password reset email" }));
}

#[tokio::test]
async fn reset_password_failures_are_400() {
    let t = test_app();
    let (status, _, body) = send(
        &t.app,
        request(
            Method::POST,
            "/api/reset-password",
            None,
            Some(json!({ "token": "not-a-real-token", "password": "long-enough-pw" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "Invalid or expired reset token" }));

    let (status, _, body) = send(
        &t.app,
        request(Method::POST, "/api/reset-password", None, Some(json!({ "token": "x", "password": "short" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("at least 8"));
}

// -- Accounts --

#[tokio::test]
async fn register_and_login_rules() {
    let t = test_app();
    register(&t.app, "erin@example.com").await;

    let (status, _, _) = send(
        &t.app,
        request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Dup", "email": "ERIN@example.com", "password": PASSWORD })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _, _) = send(
        &t.app,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "erin@example.com", "password": "wrong-password" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, headers, body) = send(
        &t.app,
        request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "erin@example.com", "password": PASSWORD })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");
    let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("evently_session="));

    // The session cookie alone authenticates API calls
    let token = body["token"].as_str().unwrap();
    let req = Request::builder()
        .uri("/api/users/me")
        .header(header::COOKIE, format!("evently_session={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, me) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["email"], "erin@example.com");
}

// -- Route guard --

#[tokio::test]
async fn page_guard_redirects() {
    let t = test_app();

    let (status, headers, _) = send(&t.app, request(Method::GET, "/profile", None, None)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/login");

    let (status, _, body) = send(&t.app, request(Method::GET, "/", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<h1>Evently</h1>");

    let (_, token) = register(&t.app, "frank@example.com").await;
    let (status, headers, _) = send(&t.app, request(Method::GET, "/login", Some(&token), None)).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(headers[header::LOCATION], "/");

    let (status, _, _) = send(&t.app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
}

// -- Uploads --

#[tokio::test]
async fn avatar_upload_is_stored_and_served() {
    let t = test_app();
    let (_, token) = register(&t.app, "gina@example.com").await;

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/users/me/avatar?filename=me.png")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(&b"not really a png"[..]))
        .unwrap();
    let (status, _, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    let path = body["path"].as_str().unwrap().to_string();
    assert!(path.starts_with("/uploads/"));
    assert!(path.ends_with("-me.png"));

    let (status, _, served) = send(&t.app, request(Method::GET, &path, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(served, "not really a png");

    let (_, _, me) = send(&t.app, request(Method::GET, "/api/users/me", Some(&token), None)).await;
    assert_eq!(me["image"], path.as_str());

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/users/me/avatar?filename=me.png")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// -- Badges, events, trends --

#[tokio::test]
async fn only_admins_award_badges() {
    let t = test_app();
    let (_, admin) = register(&t.app, ADMIN_EMAIL).await;
    let (user_id, user) = register(&t.app, "hank@example.com").await;
    let uri = format!("/api/users/{user_id}/badges");
    let badge = json!({ "name": "Early bird", "description": "Bought in the first hour" });

    let (status, _, _) = send(&t.app, request(Method::POST, &uri, Some(&user), Some(badge.clone()))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, body) = send(&t.app, request(Method::POST, &uri, Some(&admin), Some(badge))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Early bird");

    let (status, _, body) = send(&t.app, request(Method::GET, &uri, None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let missing = format!("/api/users/{}/badges", Uuid::new_v4());
    let (status, _, _) = send(
        &t.app,
        request(Method::POST, &missing, Some(&admin), Some(json!({ "name": "Ghost" }))),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn event_views_feed_trends() {
    let t = test_app();
    let (_, token) = register(&t.app, "ivy@example.com").await;

    let (status, _, event) = send(
        &t.app,
        request(
            Method::POST,
            "/api/events",
            Some(&token),
            Some(json!({ "title": "Rust meetup", "starts_at": "2030-01-01T18:00:00Z" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let event_id = event["id"].as_str().unwrap().to_string();
    let uri = format!("/api/events/{event_id}");

    for _ in 0..2 {
        let (status, _, body) = send(&t.app, request(Method::GET, &uri, None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Rust meetup");
    }

    let (_, _, listed) = send(&t.app, request(Method::GET, "/api/events", None, None)).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (_, _, trends) = send(&t.app, request(Method::GET, "/api/trends?type=event", None, None)).await;
    assert_eq!(trends[0]["type"], "event");
    assert_eq!(trends[0]["name"], event_id.as_str());
    assert_eq!(trends[0]["count"], 2);

    let (status, _, _) = send(
        &t.app,
        request(Method::GET, &format!("/api/events/{}", Uuid::new_v4()), None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(
        &t.app,
        request(
            Method::POST,
            "/api/events",
            Some(&token),
            Some(json!({ "title": "  ", "starts_at": "2030-01-01T18:00:00Z" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upcoming_events_are_listed_before_past_ones() {
    let t = test_app();
    let (_, token) = register(&t.app, "kim@example.com").await;
    for (title, starts_at) in [("past", "2001-01-01T10:00:00Z"), ("future", "2099-01-01T10:00:00Z")] {
        let (status, _, _) = send(
            &t.app,
            request(
                Method::POST,
                "/api/events",
                Some(&token),
                Some(json!({ "title": title, "starts_at": starts_at })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, _, listed) = send(&t.app, request(Method::GET, "/api/events", None, None)).await;
    let titles: Vec<_> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, ["future", "past"]);
}

// -- Request validation --

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let t = test_app();
    let (_, token) = register(&t.app, "lee@example.com").await;

    let (status, _, body) = send(
        &t.app,
        request(
            Method::POST,
            "/api/messages",
            Some(&token),
            Some(json!({ "recipient_id": Uuid::new_v4() })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/users/me/avatar")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(&b"bytes"[..]))
        .unwrap();
    let (status, _, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, _, body) =
        send(&t.app, request(Method::GET, "/api/events/not-a-uuid", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, _, body) = send(
        &t.app,
        request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Lee" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
}

#[tokio::test]
async fn password_minimum_counts_characters() {
    let t = test_app();
    let (status, _, _) = send(
        &t.app,
        request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Mo", "email": "mo@example.com", "password": "ééééééé" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_email_hits_the_unique_index() {
    let t = test_app();
    register(&t.app, "nia@example.com").await;

    // Straight at the store: the unique index reports the clash
    let id = Uuid::new_v4().to_string();
    let inserted = t.state.db.create_user(&id, "Nia", "NIA@example.com", "h", Role::User).unwrap();
    assert!(!inserted);

    let (status, _, body) = send(
        &t.app,
        request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "name": "Nia", "email": "nia@example.com", "password": PASSWORD })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "email already registered" }));
}

// -- Payments --

async fn priced_event(app: &Router, token: &str) -> String {
    let (_, _, event) = send(
        app,
        request(
            Method::POST,
            "/api/events",
            Some(token),
            Some(json!({ "title": "Gala", "starts_at": "2030-06-01T19:00:00Z", "price_cents": 2500 })),
        ),
    )
    .await;
    event["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn checkout_branches_on_provider_result() {
    let t = build(
        Arc::new(RecordingMailer::default()),
        Arc::new(ScriptedGateway(PaymentResult::approved("ch_123"))),
    );
    let (_, token) = register(&t.app, "jade@example.com").await;
    let event_id = priced_event(&t.app, &token).await;

    let (status, _, body) = send(
        &t.app,
        request(Method::POST, "/api/payments/checkout", Some(&token), Some(json!({ "event_id": event_id }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reference"], "ch_123");

    let (_, _, payments) = send(&t.app, request(Method::GET, "/api/payments", Some(&token), None)).await;
    assert_eq!(payments[0]["amount_cents"], 2500);

    let (status, _, _) = send(
        &t.app,
        request(
            Method::POST,
            "/api/payments/checkout",
            Some(&token),
            Some(json!({ "event_id": Uuid::new_v4() })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn declined_checkout_is_402() {
    let t = build(
        Arc::new(RecordingMailer::default()),
        Arc::new(ScriptedGateway(PaymentResult::declined("card declined"))),
    );
    let (_, token) = register(&t.app, "kim@example.com").await;
    let event_id = priced_event(&t.app, &token).await;

    let (status, _, body) = send(
        &t.app,
        request(Method::POST, "/api/payments/checkout", Some(&token), Some(json!({ "event_id": event_id }))),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body, json!({ "error": "card declined" }));

    let (_, _, payments) = send(&t.app, request(Method::GET, "/api/payments", Some(&token), None)).await;
    assert_eq!(payments, json!([]));
}
