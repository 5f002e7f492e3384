pub mod auth;
pub mod hooks;
pub mod queue;
pub mod stats;

use crate::config::Config;
use crate::services::dispatch_service;
use crate::smtp::MailTransport;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::SqlitePool,
    pub config: Arc<Config>,
    pub transport: Arc<dyn MailTransport>,
}

impl axum::extract::FromRef<AppState> for sqlx::SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

/// Manual dispatch trigger; same code path as a scheduler tick.
async fn run_now(State(state): State<AppState>) -> impl IntoResponse {
    match dispatch_service::run(&state.pool, state.transport.as_ref(), &state.config.dispatch())
        .await
    {
        Ok(summary) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "message": "run finished",
                "summary": summary
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"status": "error", "message": e.to_string()})),
        )
            .into_response(),
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/upload", post(queue::upload))
        .route("/api/users/:id/stats", get(stats::user_stats))
        .route("/api/hooks", post(hooks::create_hook))
        .route("/api/hooks/:id/trigger", post(hooks::trigger_hook))
        .route("/api/run", post(run_now))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
