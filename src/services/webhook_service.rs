use crate::db::queries;
use crate::models::webhook::{CreateHookReq, Webhook};
use crate::services::template_service;
use crate::smtp::{MailTransport, OutgoingEmail};
use anyhow::Result;
use sqlx::SqlitePool;

/// What a trigger call did. `Invalid` is a caller problem (missing payload
/// fields), distinct from transport failures which surface as errors.
#[derive(Debug)]
pub enum TriggerOutcome {
    Sent { recipient: String },
    Invalid(String),
}

pub async fn create_hook(pool: &SqlitePool, req: CreateHookReq) -> Result<Webhook> {
    if req.action != "send_email" {
        anyhow::bail!("unsupported action: {}", req.action);
    }
    if queries::get_user(pool, req.user_id).await?.is_none() {
        anyhow::bail!("unknown user: {}", req.user_id);
    }

    let hook = Webhook {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: req.user_id,
        action: req.action,
        recipient_template: req.recipient_template,
        subject_template: req.subject_template,
        body_template: req.body_template,
        created_at: crate::db::now_epoch(),
    };
    queries::insert_webhook(pool, &hook).await?;
    Ok(hook)
}

/// Run a hook with the caller-supplied payload as template fields. Sends
/// directly through the owner's account: the automation path bypasses the
/// queue and the daily quota. Returns `None` when the hook does not exist.
pub async fn trigger(
    pool: &SqlitePool,
    transport: &dyn MailTransport,
    hook_id: &str,
    payload: &serde_json::Value,
) -> Result<Option<TriggerOutcome>> {
    let Some(hook) = queries::get_webhook(pool, hook_id).await? else {
        return Ok(None);
    };
    let user = queries::get_user(pool, hook.user_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("hook owner missing: {}", hook.user_id))?;

    let fields = template_service::fields_from_json(payload);
    let recipient = template_service::render(&hook.recipient_template, &fields);
    if recipient.contains("{{") || recipient.trim().is_empty() {
        return Ok(Some(TriggerOutcome::Invalid(format!(
            "recipient unresolved: {recipient}"
        ))));
    }

    let mail = OutgoingEmail {
        to: recipient.trim().to_string(),
        subject: template_service::render(&hook.subject_template, &fields),
        body_html: template_service::render(&hook.body_template, &fields),
    };

    let account = user.sender_account()?;
    let mut session = transport.connect(&account).await?;
    let sent = session.send(&mail).await;
    let _ = session.close().await;
    sent?;

    tracing::info!(hook = %hook.id, to = %mail.to, "hook action delivered");
    Ok(Some(TriggerOutcome::Sent {
        recipient: mail.to,
    }))
}
