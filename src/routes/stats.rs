use crate::db::{self, queries};
use crate::routes::AppState;
use crate::services::quota_service;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

pub async fn user_stats(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match load_stats(&state.pool, id).await {
        Ok(Some(stats)) => (
            StatusCode::OK,
            Json(serde_json::json!({"status": "success", "message": "ok", "stats": stats})),
        )
            .into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({"status": "error", "message": "unknown user"})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"status": "error", "message": e.to_string()})),
        )
            .into_response(),
    }
}

async fn load_stats(
    pool: &sqlx::SqlitePool,
    id: i64,
) -> Result<Option<serde_json::Value>, sqlx::Error> {
    let Some(user) = queries::get_user(pool, id).await? else {
        return Ok(None);
    };
    let pending = queries::count_by_status(pool, id, "pending").await?;
    let sent = queries::count_by_status(pool, id, "sent").await?;
    let failed = queries::count_by_status(pool, id, "failed").await?;
    Ok(Some(serde_json::json!({
        "pending": pending,
        "sent": sent,
        "failed": failed,
        "daily_limit": user.daily_limit,
        "used_today": user.used_today,
        "remaining": quota_service::remaining_snapshot(&user, db::now_epoch()),
    })))
}
