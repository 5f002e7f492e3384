use crate::routes::AppState;
use crate::services::upload_service;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Multipart form: `user_id`, `subject`, `body`, `file` (contact table as a
/// JSON array of objects, extracted upstream from the PDF).
pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> impl IntoResponse {
    let mut user_id: Option<i64> = None;
    let mut subject: Option<String> = None;
    let mut body: Option<String> = None;
    let mut file: Option<Vec<u8>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => return validation_error(format!("malformed multipart body: {e}")),
        };
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "user_id" => {
                user_id = field.text().await.ok().and_then(|v| v.trim().parse().ok());
            }
            "subject" => subject = field.text().await.ok(),
            "body" => body = field.text().await.ok(),
            "file" => file = field.bytes().await.ok().map(|b| b.to_vec()),
            _ => {}
        }
    }

    let Some(user_id) = user_id else {
        return validation_error("user_id is required".into());
    };
    let (Some(subject), Some(body)) = (subject, body) else {
        return validation_error("subject and body are required".into());
    };
    let Some(file) = file else {
        return validation_error("file is required".into());
    };

    match crate::db::queries::get_user(&state.pool, user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({"status": "error", "message": "unknown user"})),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"status": "error", "message": e.to_string()})),
            )
                .into_response()
        }
    }

    match upload_service::queue_contacts(&state.pool, user_id, &subject, &body, &file).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "success",
                "message": format!("queued {} message(s)", outcome.queued),
                "queued": outcome.queued,
                "skipped": outcome.skipped
            })),
        )
            .into_response(),
        Err(e) => validation_error(e.to_string()),
    }
}

fn validation_error(message: String) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({"status": "error", "message": message})),
    )
        .into_response()
}
