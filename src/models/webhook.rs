use serde::{Deserialize, Serialize};

/// External trigger definition. Read-only to the trigger path; the payload of
/// a trigger call supplies the template fields.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Webhook {
    pub id: String,
    pub user_id: i64,
    pub action: String, // only 'send_email' today
    pub recipient_template: String,
    pub subject_template: String,
    pub body_template: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateHookReq {
    pub user_id: i64,
    pub action: String,
    pub recipient_template: String,
    pub subject_template: String,
    pub body_template: String,
}
