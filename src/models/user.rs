use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::smtp::SenderAccount;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip)] // never serialize password hash
    pub password_hash: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    #[serde(skip_serializing)]
    pub credentials_encrypted: String, // Base64 encoded "username:password"
    pub daily_limit: i64,
    pub used_today: i64,
    pub last_reset: i64,
    pub created_at: i64,
}

impl User {
    /// Encode sending credentials (simple base64, upgrade to OS keychain later)
    pub fn encode_credentials(username: &str, password: &str) -> String {
        use base64::Engine;
        let creds = format!("{}:{}", username, password);
        base64::engine::general_purpose::STANDARD.encode(creds.as_bytes())
    }

    pub fn decode_credentials(encoded: &str) -> Result<(String, String)> {
        use base64::Engine;
        let decoded = base64::engine::general_purpose::STANDARD.decode(encoded)?;
        let creds = String::from_utf8(decoded)?;
        let parts: Vec<&str> = creds.splitn(2, ':').collect();
        if parts.len() != 2 {
            anyhow::bail!("Invalid credentials format");
        }
        Ok((parts[0].to_string(), parts[1].to_string()))
    }

    /// The SMTP account this user sends through.
    pub fn sender_account(&self) -> Result<SenderAccount> {
        let (username, password) = Self::decode_credentials(&self.credentials_encrypted)?;
        Ok(SenderAccount {
            host: self.smtp_host.clone(),
            port: self.smtp_port,
            username,
            password,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterReq {
    pub email: String,
    pub password: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub daily_limit: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}
