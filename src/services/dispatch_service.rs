use crate::db::{self, queries};
use crate::models::user::User;
use crate::services::{quota_service, report_service, retention_service, template_service};
use crate::smtp::{MailTransport, OutgoingEmail};
use serde::Serialize;
use sqlx::SqlitePool;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Pause after each successful send inside a batch.
    pub send_delay: Duration,
    /// Sent records kept per user after cleanup.
    pub retention_keep: usize,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
    #[error("sender credentials unusable: {0}")]
    Credentials(String),
}

/// Per-user outcome of one run.
#[derive(Debug)]
pub struct UserReport {
    pub sent_now: i64,
    pub failed_now: i64,
    pub remaining_before: i64,
    pub remaining_after: i64,
    pub session_error: Option<String>,
}

/// Whole-run totals.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub users_processed: usize,
    pub users_skipped: usize,
    pub sent: i64,
    pub failed: i64,
}

/// One full pass over all users. Fully sequential: users one at a time,
/// messages within a batch one at a time. A store error aborts only the
/// current user; the run carries on with the next one.
pub async fn run(
    pool: &SqlitePool,
    transport: &dyn MailTransport,
    cfg: &DispatchConfig,
) -> Result<RunSummary, DispatchError> {
    let users = queries::list_users(pool).await?;
    let mut summary = RunSummary::default();

    for mut user in users {
        match process_user(pool, transport, cfg, &mut user).await {
            Ok(Some(report)) => {
                summary.users_processed += 1;
                summary.sent += report.sent_now;
                summary.failed += report.failed_now;
                tracing::info!(
                    user = %user.email,
                    sent = report.sent_now,
                    failed = report.failed_now,
                    remaining = report.remaining_after,
                    "batch complete"
                );
            }
            Ok(None) => summary.users_skipped += 1,
            Err(e) => {
                tracing::warn!(user = %user.email, error = %e, "user aborted, continuing run");
            }
        }
    }

    Ok(summary)
}

/// Drive one user's batch. Returns `None` when the user had nothing to do
/// (quota exhausted or empty queue).
async fn process_user(
    pool: &SqlitePool,
    transport: &dyn MailTransport,
    cfg: &DispatchConfig,
    user: &mut User,
) -> Result<Option<UserReport>, DispatchError> {
    let now = db::now_epoch();
    let quota = quota_service::remaining(pool, user, now).await?;
    if quota.did_reset {
        tracing::info!(user = %user.email, limit = user.daily_limit, "new quota window");
    }
    if quota.remaining <= 0 {
        return Ok(None);
    }

    let batch = queries::fetch_pending(pool, user.id, quota.remaining).await?;
    if batch.is_empty() {
        return Ok(None);
    }

    let account = user
        .sender_account()
        .map_err(|e| DispatchError::Credentials(e.to_string()))?;

    // One session for the whole batch, not one per message.
    let mut session = match transport.connect(&account).await {
        Err(e) => {
            // The batch stays pending for the next run; tell the user why.
            tracing::warn!(user = %user.email, error = %e, "mail session failed, batch abandoned");
            report_service::notify(transport, user, "Send run failed", &e.to_string()).await;
            return Ok(Some(UserReport {
                sent_now: 0,
                failed_now: 0,
                remaining_before: quota.remaining,
                remaining_after: quota.remaining,
                session_error: Some(e.to_string()),
            }));
        }
        Ok(s) => s,
    };

    let mut sent_now = 0i64;
    let mut failed_now = 0i64;

    for msg in &batch {
        let fields = msg.fields();
        let mail = OutgoingEmail {
            to: msg.recipient_email.clone(),
            subject: template_service::render(&msg.template_subject, &fields),
            body_html: template_service::render(&msg.template_body, &fields),
        };
        match session.send(&mail).await {
            Ok(()) => {
                queries::mark_sent(pool, msg.id).await?;
                sent_now += 1;
                // Keep a gap between sends so the provider does not throttle us
                tokio::time::sleep(cfg.send_delay).await;
            }
            Err(e) => {
                let err = e.to_string();
                tracing::warn!(user = %user.email, to = %msg.recipient_email, error = %err, "send failed");
                queries::mark_failed(pool, msg.id, &err).await?;
                failed_now += 1;
            }
        }
    }

    let _ = session.close().await;

    quota_service::record_usage(pool, user, sent_now).await?;
    retention_service::cleanup(pool, user.id, cfg.retention_keep).await?;

    let remaining_after = quota.remaining - sent_now;
    let stamp = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC");
    let mut body = format!(
        "Run of {stamp}: sent {sent_now} message(s), {failed_now} failed.<br>Remaining today: {remaining_after}."
    );
    if remaining_after <= 0 {
        body.push_str("<br>Daily limit reached; the rest of the queue resumes after the next reset.");
    }
    report_service::notify(transport, user, "Your send run report", &body).await;

    Ok(Some(UserReport {
        sent_now,
        failed_now,
        remaining_before: quota.remaining,
        remaining_after,
        session_error: None,
    }))
}
