use crate::config::Config;
use crate::db::queries::{self, NewUser};
use crate::models::user::{RegisterReq, User};
use anyhow::Result;
use bcrypt::{hash, verify, DEFAULT_COST};
use sqlx::SqlitePool;

pub async fn register_user(pool: &SqlitePool, config: &Config, req: RegisterReq) -> Result<User> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        anyhow::bail!("email and password are required");
    }
    if req.smtp_username.trim().is_empty() || req.smtp_password.is_empty() {
        anyhow::bail!("sending credentials are required");
    }

    let existing = queries::find_user_by_email(pool, req.email.trim()).await?;
    if existing.is_some() {
        anyhow::bail!("Account already exists: {}", req.email.trim());
    }

    let password_hash = hash(&req.password, DEFAULT_COST)?;
    let user = queries::insert_user(
        pool,
        &NewUser {
            email: req.email.trim().to_string(),
            password_hash,
            smtp_host: req
                .smtp_host
                .unwrap_or_else(|| config.default_smtp_host.clone()),
            smtp_port: req.smtp_port.unwrap_or(config.default_smtp_port),
            credentials_encrypted: User::encode_credentials(
                req.smtp_username.trim(),
                &req.smtp_password,
            ),
            daily_limit: req.daily_limit.unwrap_or(config.default_daily_limit),
        },
    )
    .await?;

    Ok(user)
}

pub async fn verify_user(pool: &SqlitePool, email: &str, password: &str) -> Result<Option<User>> {
    let user_opt = queries::find_user_by_email(pool, email).await?;
    if let Some(user) = user_opt {
        if verify(password, &user.password_hash)? {
            return Ok(Some(user));
        }
    }
    Ok(None)
}
