//! `medpredict history`: recent audit entries for one user.

use anyhow::Result;

use medpredict_core::AuditSink;

use crate::audit_store::SqliteAuditLog;
use crate::config::Config;
use crate::db;
use crate::migrate;

pub async fn run_history(
    config: &Config,
    user: &str,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::migrate_pool(&pool).await?;
    let log = SqliteAuditLog::new(pool);

    let limit = limit.unwrap_or(config.api.history_default_limit);
    let entries = log.history(user, limit).await?;
    log.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No predictions recorded for {}.", user);
        return Ok(());
    }
    for e in &entries {
        println!(
            "{}  {}  {}  [{}]",
            e.timestamp.format("%Y-%m-%d %H:%M:%S"),
            e.id,
            e.predicted_disease.as_deref().unwrap_or("-").trim(),
            e.symptoms.join(", ")
        );
    }
    Ok(())
}
