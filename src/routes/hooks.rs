use crate::models::webhook::CreateHookReq;
use crate::routes::AppState;
use crate::services::webhook_service::{self, TriggerOutcome};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

pub async fn create_hook(
    State(state): State<AppState>,
    Json(req): Json<CreateHookReq>,
) -> impl IntoResponse {
    match webhook_service::create_hook(&state.pool, req).await {
        Ok(hook) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "message": "hook created",
                "hook_id": hook.id
            })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"status": "error", "message": e.to_string()})),
        )
            .into_response(),
    }
}

/// Fire a hook: the JSON body's key/value pairs become the template fields.
pub async fn trigger_hook(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse {
    match webhook_service::trigger(&state.pool, state.transport.as_ref(), &id, &payload).await {
        Ok(Some(TriggerOutcome::Sent { recipient })) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "message": format!("sent to {recipient}")
            })),
        )
            .into_response(),
        Ok(Some(TriggerOutcome::Invalid(reason))) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"status": "error", "message": reason})),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"status": "error", "message": "unknown hook"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"status": "error", "message": e.to_string()})),
        )
            .into_response(),
    }
}
