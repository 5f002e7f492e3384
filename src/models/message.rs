use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

impl MessageStatus {
    pub fn from_str(s: &str) -> Self {
        match s {
            "sent" => Self::Sent,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

/// One queued personalized email. Status moves one-way from `pending` to
/// `sent` or `failed`; sent rows are eventually removed by retention cleanup.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QueuedMessage {
    pub id: i64,
    pub user_id: i64,
    pub recipient_email: String,
    pub recipient_data: String, // JSON object text, field name -> value
    pub template_subject: String,
    pub template_body: String,
    pub status: String,
    pub error_log: Option<String>,
    pub created_at: i64,
}

impl QueuedMessage {
    pub fn status(&self) -> MessageStatus {
        MessageStatus::from_str(&self.status)
    }

    /// Per-recipient template fields. Malformed JSON yields no fields, which
    /// leaves every token in the template visible instead of blanking it.
    pub fn fields(&self) -> HashMap<String, String> {
        serde_json::from_str::<serde_json::Value>(&self.recipient_data)
            .map(|v| crate::services::template_service::fields_from_json(&v))
            .unwrap_or_default()
    }
}

/// Input row for a bulk queue insert.
#[derive(Debug, Clone)]
pub struct NewQueuedMessage {
    pub user_id: i64,
    pub recipient_email: String,
    pub recipient_data: String,
    pub template_subject: String,
    pub template_body: String,
}
