use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use campaign_hub::config::Config;
use campaign_hub::db;
use campaign_hub::routes::{app, AppState};
use campaign_hub::smtp::{MailError, MailSession, MailTransport, OutgoingEmail, SenderAccount};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::{Arc, Mutex};
use tower::ServiceExt; // for `app.oneshot()`

/// Transport that records every mail instead of talking SMTP.
#[derive(Clone, Default)]
struct RecordingTransport {
    delivered: Arc<Mutex<Vec<OutgoingEmail>>>,
}

struct RecordingSession {
    delivered: Arc<Mutex<Vec<OutgoingEmail>>>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn connect(&self, _account: &SenderAccount) -> Result<Box<dyn MailSession>, MailError> {
        Ok(Box::new(RecordingSession {
            delivered: self.delivered.clone(),
        }))
    }
}

#[async_trait]
impl MailSession for RecordingSession {
    async fn send(&mut self, mail: &OutgoingEmail) -> Result<(), MailError> {
        self.delivered.lock().unwrap().push(mail.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), MailError> {
        Ok(())
    }
}

async fn test_app() -> (Router, RecordingTransport) {
    // no inter-message pause in tests
    std::env::set_var("SEND_DELAY_SECS", "0");
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    db::run_migrations(&pool).await.expect("migrations");

    let transport = RecordingTransport::default();
    let state = AppState {
        pool,
        config: Arc::new(Config::from_env()),
        transport: Arc::new(transport.clone()),
    };
    (app(state), transport)
}

fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn register_payload() -> serde_json::Value {
    serde_json::json!({
        "email": "ann@example.com",
        "password": "hunter2",
        "smtp_username": "ann@example.com",
        "smtp_password": "app pass word",
        "daily_limit": 500
    })
}

async fn register(app: &Router) -> i64 {
    let res = app
        .clone()
        .oneshot(json_request("/api/register", register_payload()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    json_body(res).await["user_id"].as_i64().unwrap()
}

fn multipart_upload(user_id: i64, contacts: &str) -> Request<Body> {
    let boundary = "XBOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"user_id\"\r\n\r\n{user_id}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"subject\"\r\n\r\nHi {{{{NAME}}}}\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"body\"\r\n\r\n<p>Hello {{{{NAME}}}}</p>\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"contacts.json\"\r\n\
         Content-Type: application/json\r\n\r\n{contacts}\r\n\
         --{b}--\r\n",
        b = boundary
    );
    Request::builder()
        .method("POST")
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn register_then_login() {
    let (app, _) = test_app().await;
    let user_id = register(&app).await;
    assert!(user_id > 0);

    // duplicate registration is a validation error
    let res = app
        .clone()
        .oneshot(json_request("/api/register", register_payload()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .clone()
        .oneshot(json_request(
            "/api/login",
            serde_json::json!({"email": "ann@example.com", "password": "hunter2"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["user"]["id"].as_i64().unwrap(), user_id);
    // password hash never leaves the server
    assert!(body["user"].get("password_hash").is_none());

    let res = app
        .oneshot(json_request(
            "/api/login",
            serde_json::json!({"email": "ann@example.com", "password": "wrong"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stats_for_unknown_user_is_not_found() {
    let (app, _) = test_app().await;
    let res = app
        .oneshot(
            Request::builder()
                .uri("/api/users/999/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn upload_queue_run_and_stats_roundtrip() {
    let (app, transport) = test_app().await;
    let user_id = register(&app).await;

    let contacts = r#"[
        {"email": "a@example.com", "name": "Ann"},
        {"email": "b@example.com", "name": "Bob"}
    ]"#;
    let res = app
        .clone()
        .oneshot(multipart_upload(user_id, contacts))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await["queued"].as_u64().unwrap(), 2);

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/users/{user_id}/stats"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let stats = json_body(res).await["stats"].clone();
    assert_eq!(stats["pending"].as_i64().unwrap(), 2);
    assert_eq!(stats["remaining"].as_i64().unwrap(), 500);

    // drive one dispatch run through the manual trigger
    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/run")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let summary = json_body(res).await["summary"].clone();
    assert_eq!(summary["sent"].as_i64().unwrap(), 2);

    let res = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/users/{user_id}/stats"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let stats = json_body(res).await["stats"].clone();
    assert_eq!(stats["pending"].as_i64().unwrap(), 0);
    assert_eq!(stats["sent"].as_i64().unwrap(), 2);
    assert_eq!(stats["used_today"].as_i64().unwrap(), 2);

    // two personalized mails plus the owner's run report
    let delivered = transport.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 3);
    assert_eq!(delivered[0].subject, "Hi Ann");
    assert_eq!(delivered[1].subject, "Hi Bob");
    assert_eq!(delivered[2].to, "ann@example.com");
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let (app, _) = test_app().await;
    let user_id = register(&app).await;

    let boundary = "XBOUNDARY";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"user_id\"\r\n\r\n{user_id}\r\n--{b}--\r\n",
        b = boundary
    );
    let res = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn hook_create_and_trigger() {
    let (app, transport) = test_app().await;
    let user_id = register(&app).await;

    let res = app
        .clone()
        .oneshot(json_request(
            "/api/hooks",
            serde_json::json!({
                "user_id": user_id,
                "action": "send_email",
                "recipient_template": "{{EMAIL}}",
                "subject_template": "Welcome {{NAME}}",
                "body_template": "<p>Hi {{NAME}}</p>"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let hook_id = json_body(res).await["hook_id"].as_str().unwrap().to_string();

    let res = app
        .clone()
        .oneshot(json_request(
            &format!("/api/hooks/{hook_id}/trigger"),
            serde_json::json!({"email": "lead@example.com", "name": "Lee"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    {
        let delivered = transport.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].to, "lead@example.com");
        assert_eq!(delivered[0].subject, "Welcome Lee");
    }

    // payload without the recipient field leaves the token unresolved
    let res = app
        .clone()
        .oneshot(json_request(
            &format!("/api/hooks/{hook_id}/trigger"),
            serde_json::json!({"name": "Lee"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .oneshot(json_request(
            "/api/hooks/missing/trigger",
            serde_json::json!({"email": "x@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // unsupported action is rejected at creation
    let (app2, _) = test_app().await;
    let uid2 = register(&app2).await;
    let res = app2
        .oneshot(json_request(
            "/api/hooks",
            serde_json::json!({
                "user_id": uid2,
                "action": "launch_rocket",
                "recipient_template": "{{EMAIL}}",
                "subject_template": "s",
                "body_template": "b"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
