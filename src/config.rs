use std::env;
use std::time::Duration;

/// Runtime configuration, read once at startup. Everything has a default so
/// the server comes up with nothing but a DATABASE_URL (and even that falls
/// back to a local file).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Seconds between dispatch runs. Must stay longer than the expected run
    /// duration: overlapping runs race on quota and queue claiming.
    pub run_interval_secs: u64,
    /// Pause between two sends inside one batch, to stay under provider
    /// throttling thresholds.
    pub send_delay_secs: u64,
    /// How many `sent` records to keep per user before cleanup deletes the rest.
    pub retention_keep: usize,
    pub default_smtp_host: String,
    pub default_smtp_port: u16,
    pub default_daily_limit: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://campaign_hub.db".into()),
            port: env_parse("PORT", 3030),
            run_interval_secs: env_parse("RUN_INTERVAL_SECS", 600),
            send_delay_secs: env_parse("SEND_DELAY_SECS", 2),
            retention_keep: env_parse("RETENTION_KEEP", 4),
            default_smtp_host: env::var("DEFAULT_SMTP_HOST")
                .unwrap_or_else(|_| "smtp.gmail.com".into()),
            default_smtp_port: env_parse("DEFAULT_SMTP_PORT", 587),
            default_daily_limit: env_parse("DEFAULT_DAILY_LIMIT", 500),
        }
    }

    pub fn run_interval(&self) -> Duration {
        Duration::from_secs(self.run_interval_secs)
    }

    pub fn dispatch(&self) -> crate::services::dispatch_service::DispatchConfig {
        crate::services::dispatch_service::DispatchConfig {
            send_delay: Duration::from_secs(self.send_delay_secs),
            retention_keep: self.retention_keep,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
