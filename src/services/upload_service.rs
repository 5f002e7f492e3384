use crate::db::queries;
use crate::models::message::NewQueuedMessage;
use anyhow::Result;
use sqlx::SqlitePool;

/// Outcome of queueing a contact list.
#[derive(Debug)]
pub struct UploadOutcome {
    pub queued: u64,
    pub skipped: usize,
}

/// Queue one personalized message per contact row. The file is the contact
/// table extracted upstream from the PDF: a JSON array of flat objects, each
/// holding the recipient address under an `email` key (any casing) plus
/// arbitrary template fields.
pub async fn queue_contacts(
    pool: &SqlitePool,
    user_id: i64,
    subject: &str,
    body: &str,
    file: &[u8],
) -> Result<UploadOutcome> {
    let parsed: serde_json::Value =
        serde_json::from_slice(file).map_err(|e| anyhow::anyhow!("contact file is not valid JSON: {e}"))?;
    let rows = parsed
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("contact file must be a JSON array of objects"))?;

    let mut new_rows = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in rows {
        let Some(obj) = row.as_object() else {
            skipped += 1;
            continue;
        };
        let recipient = obj
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("email"))
            .and_then(|(_, v)| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty());
        let Some(recipient) = recipient else {
            skipped += 1;
            continue;
        };
        new_rows.push(NewQueuedMessage {
            user_id,
            recipient_email: recipient.to_string(),
            recipient_data: row.to_string(),
            template_subject: subject.to_string(),
            template_body: body.to_string(),
        });
    }

    if new_rows.is_empty() {
        anyhow::bail!("no contact rows with a recipient address");
    }

    let queued = queries::queue_messages(pool, &new_rows).await?;
    tracing::info!(user_id, queued, skipped, "contact list queued");
    Ok(UploadOutcome { queued, skipped })
}
