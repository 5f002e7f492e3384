use crate::config::Config;
use crate::services::dispatch_service;
use crate::smtp::MailTransport;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Starts the periodic dispatch trigger. Each tick drives one full run; the
/// next tick waits out the remainder of the interval so runs do not overlap
/// as long as a run finishes within it (the no-overlap assumption is not
/// otherwise enforced).
pub fn start(pool: SqlitePool, transport: Arc<dyn MailTransport>, config: Arc<Config>) {
    tokio::spawn(async move {
        info!(interval_secs = config.run_interval_secs, "dispatch scheduler started");
        loop {
            let tick_start = std::time::Instant::now();
            match dispatch_service::run(&pool, transport.as_ref(), &config.dispatch()).await {
                Ok(summary) => info!(
                    users = summary.users_processed,
                    skipped = summary.users_skipped,
                    sent = summary.sent,
                    failed = summary.failed,
                    "dispatch run completed"
                ),
                Err(e) => warn!("dispatch run failed: {}", e),
            }
            let elapsed = tick_start.elapsed();
            let sleep_for = config
                .run_interval()
                .saturating_sub(elapsed)
                .max(Duration::from_secs(1));
            tokio::time::sleep(sleep_for).await;
        }
    });
}
