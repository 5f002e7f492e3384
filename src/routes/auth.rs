use crate::models::user::{LoginReq, RegisterReq};
use crate::routes::AppState;
use crate::services::auth_service;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterReq>,
) -> impl IntoResponse {
    match auth_service::register_user(&state.pool, &state.config, req).await {
        Ok(user) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "message": "registered",
                "user_id": user.id
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

pub async fn login(State(state): State<AppState>, Json(req): Json<LoginReq>) -> impl IntoResponse {
    match auth_service::verify_user(&state.pool, &req.email, &req.password).await {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "message": "logged in",
                "user": user
            })),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"status": "error", "message": "Invalid credentials"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"status": "error", "message": e.to_string()})),
        )
            .into_response(),
    }
}
