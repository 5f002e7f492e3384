use crate::models::message::{NewQueuedMessage, QueuedMessage};
use crate::models::user::User;
use crate::models::webhook::Webhook;
use sqlx::SqlitePool;

/// Rows per INSERT when queueing a contact list.
pub const INSERT_CHUNK_SIZE: usize = 100;

// ---- users ----

pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub credentials_encrypted: String,
    pub daily_limit: i64,
}

pub async fn insert_user(pool: &SqlitePool, new: &NewUser) -> Result<User, sqlx::Error> {
    let now = crate::db::now_epoch();
    let id = sqlx::query_scalar::<_, i64>(
        r#"INSERT INTO users (
            email, password_hash, smtp_host, smtp_port, credentials_encrypted,
            daily_limit, used_today, last_reset, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?) RETURNING id"#,
    )
    .bind(&new.email)
    .bind(&new.password_hash)
    .bind(&new.smtp_host)
    .bind(new.smtp_port)
    .bind(&new.credentials_encrypted)
    .bind(new.daily_limit)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    get_user(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Every user, in stable store order. The dispatch run iterates this once.
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id")
        .fetch_all(pool)
        .await
}

// ---- email queue ----

/// Bulk-queue messages in chunks so a big contact list does not build one
/// enormous statement.
pub async fn queue_messages(
    pool: &SqlitePool,
    rows: &[NewQueuedMessage],
) -> Result<u64, sqlx::Error> {
    let now = crate::db::now_epoch();
    let mut inserted = 0u64;
    for chunk in rows.chunks(INSERT_CHUNK_SIZE) {
        let mut qb = sqlx::QueryBuilder::new(
            "INSERT INTO email_queue (user_id, recipient_email, recipient_data, \
             template_subject, template_body, status, created_at) ",
        );
        qb.push_values(chunk, |mut b, row| {
            b.push_bind(row.user_id)
                .push_bind(&row.recipient_email)
                .push_bind(&row.recipient_data)
                .push_bind(&row.template_subject)
                .push_bind(&row.template_body)
                .push_bind("pending")
                .push_bind(now);
        });
        let res = qb.build().execute(pool).await?;
        inserted += res.rows_affected();
    }
    Ok(inserted)
}

/// Up to `limit` pending messages for one user, in insertion order so older
/// entries are never starved.
pub async fn fetch_pending(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<QueuedMessage>, sqlx::Error> {
    sqlx::query_as::<_, QueuedMessage>(
        "SELECT * FROM email_queue WHERE user_id = ? AND status = 'pending' \
         ORDER BY id LIMIT ?",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Transition a message to `sent`. The status guard makes the transition
/// one-way: a row already sent or failed is left untouched.
pub async fn mark_sent(pool: &SqlitePool, id: i64) -> Result<u64, sqlx::Error> {
    let res = sqlx::query("UPDATE email_queue SET status = 'sent' WHERE id = ? AND status = 'pending'")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}

pub async fn mark_failed(pool: &SqlitePool, id: i64, error: &str) -> Result<u64, sqlx::Error> {
    let res = sqlx::query(
        "UPDATE email_queue SET status = 'failed', error_log = ? WHERE id = ? AND status = 'pending'",
    )
    .bind(error)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(res.rows_affected())
}

/// Ids of this user's sent messages, newest first by creation order.
pub async fn sent_ids_newest_first(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT id FROM email_queue WHERE user_id = ? AND status = 'sent' ORDER BY id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn delete_messages(pool: &SqlitePool, ids: &[i64]) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }
    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("DELETE FROM email_queue WHERE id IN ({placeholders})");
    let mut q = sqlx::query(&sql);
    for id in ids {
        q = q.bind(id);
    }
    let res = q.execute(pool).await?;
    Ok(res.rows_affected())
}

pub async fn count_by_status(
    pool: &SqlitePool,
    user_id: i64,
    status: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM email_queue WHERE user_id = ? AND status = ?",
    )
    .bind(user_id)
    .bind(status)
    .fetch_one(pool)
    .await
}

// ---- webhooks ----

pub async fn insert_webhook(pool: &SqlitePool, hook: &Webhook) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO webhooks (
            id, user_id, action, recipient_template, subject_template, body_template, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
    )
    .bind(&hook.id)
    .bind(hook.user_id)
    .bind(&hook.action)
    .bind(&hook.recipient_template)
    .bind(&hook.subject_template)
    .bind(&hook.body_template)
    .bind(hook.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn get_webhook(pool: &SqlitePool, id: &str) -> Result<Option<Webhook>, sqlx::Error> {
    sqlx::query_as::<_, Webhook>("SELECT * FROM webhooks WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}
