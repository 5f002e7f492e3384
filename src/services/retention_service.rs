use crate::db::queries;
use sqlx::SqlitePool;

/// Delete a user's sent records beyond the `keep` most recent ones. Pending
/// and failed rows are never touched. Returns how many rows were removed.
pub async fn cleanup(pool: &SqlitePool, user_id: i64, keep: usize) -> Result<u64, sqlx::Error> {
    let sent = queries::sent_ids_newest_first(pool, user_id).await?;
    if sent.len() <= keep {
        return Ok(0);
    }
    let deleted = queries::delete_messages(pool, &sent[keep..]).await?;
    if deleted > 0 {
        tracing::debug!(user_id, deleted, "retired old sent records");
    }
    Ok(deleted)
}
