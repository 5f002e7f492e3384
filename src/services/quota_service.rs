use crate::models::user::User;
use sqlx::SqlitePool;

/// Length of one quota window.
pub const QUOTA_PERIOD_SECS: i64 = 24 * 60 * 60;

pub struct QuotaStatus {
    pub remaining: i64,
    /// A full period had elapsed and the counter was reset before computing.
    pub did_reset: bool,
}

/// Remaining send allowance for the current window. When a full period has
/// passed since `last_reset` the counter is zeroed and persisted first, so a
/// caller always sees the allowance of the window that contains `now`.
pub async fn remaining(
    pool: &SqlitePool,
    user: &mut User,
    now: i64,
) -> Result<QuotaStatus, sqlx::Error> {
    let mut did_reset = false;
    if now - user.last_reset >= QUOTA_PERIOD_SECS {
        sqlx::query("UPDATE users SET used_today = 0, last_reset = ? WHERE id = ?")
            .bind(now)
            .bind(user.id)
            .execute(pool)
            .await?;
        user.used_today = 0;
        user.last_reset = now;
        did_reset = true;
        // Reset hook: log only. A "start of day" mail to the user would go here.
        tracing::debug!(user = %user.email, "quota window reset");
    }
    Ok(QuotaStatus {
        remaining: (user.daily_limit - user.used_today).max(0),
        did_reset,
    })
}

/// Add `count` successful sends to the user's window counter.
pub async fn record_usage(
    pool: &SqlitePool,
    user: &mut User,
    count: i64,
) -> Result<(), sqlx::Error> {
    if count <= 0 {
        return Ok(());
    }
    user.used_today += count;
    sqlx::query("UPDATE users SET used_today = ? WHERE id = ?")
        .bind(user.used_today)
        .bind(user.id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Read-only allowance snapshot for display; does not persist a reset.
pub fn remaining_snapshot(user: &User, now: i64) -> i64 {
    let used = if now - user.last_reset >= QUOTA_PERIOD_SECS {
        0
    } else {
        user.used_today
    };
    (user.daily_limit - used).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::{insert_user, get_user, NewUser};
    use crate::db::test_pool;

    async fn seed_user(pool: &SqlitePool, limit: i64) -> User {
        insert_user(
            pool,
            &NewUser {
                email: "quota@example.com".into(),
                password_hash: "x".into(),
                smtp_host: "smtp.example.com".into(),
                smtp_port: 587,
                credentials_encrypted: User::encode_credentials("quota@example.com", "pw"),
                daily_limit: limit,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn remaining_is_limit_minus_used() {
        let pool = test_pool().await;
        let mut user = seed_user(&pool, 500).await;
        user.used_today = 498;
        let now = user.last_reset;
        let status = remaining(&pool, &mut user, now).await.unwrap();
        assert_eq!(status.remaining, 2);
        assert!(!status.did_reset);
    }

    #[tokio::test]
    async fn remaining_never_goes_negative() {
        let pool = test_pool().await;
        let mut user = seed_user(&pool, 100).await;
        user.used_today = 150;
        let now = user.last_reset;
        let status = remaining(&pool, &mut user, now).await.unwrap();
        assert_eq!(status.remaining, 0);
    }

    #[tokio::test]
    async fn full_period_elapsed_resets_and_persists() {
        let pool = test_pool().await;
        let mut user = seed_user(&pool, 500).await;
        user.used_today = 500;
        sqlx::query("UPDATE users SET used_today = 500 WHERE id = ?")
            .bind(user.id)
            .execute(&pool)
            .await
            .unwrap();

        let now = user.last_reset + QUOTA_PERIOD_SECS + 3600;
        let status = remaining(&pool, &mut user, now).await.unwrap();
        assert!(status.did_reset);
        assert_eq!(status.remaining, 500);
        assert_eq!(user.used_today, 0);

        let stored = get_user(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(stored.used_today, 0);
        assert_eq!(stored.last_reset, now);
    }

    #[tokio::test]
    async fn record_usage_accumulates() {
        let pool = test_pool().await;
        let mut user = seed_user(&pool, 500).await;
        record_usage(&pool, &mut user, 3).await.unwrap();
        record_usage(&pool, &mut user, 2).await.unwrap();
        // zero and negative counts are ignored
        record_usage(&pool, &mut user, 0).await.unwrap();
        record_usage(&pool, &mut user, -4).await.unwrap();

        let stored = get_user(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(stored.used_today, 5);
    }
}
