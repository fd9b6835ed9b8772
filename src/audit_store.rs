//! SQLite-backed [`AuditSink`] implementation.
//!
//! Entries land in the `prediction_logs` table created by
//! [`crate::migrate`]. Symptoms and metadata are stored as JSON text;
//! timestamps as fixed-width RFC 3339 so that text order is time order.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqlitePool};

use medpredict_core::{AuditLogEntry, AuditSink};

pub struct SqliteAuditLog {
    pool: SqlitePool,
}

impl SqliteAuditLog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl AuditSink for SqliteAuditLog {
    async fn record(&self, entry: &AuditLogEntry) -> Result<Option<String>> {
        let id = uuid::Uuid::new_v4().to_string();
        let symptoms_json = serde_json::to_string(&entry.symptoms)?;
        let metadata_json = serde_json::to_string(&entry.metadata)?;

        sqlx::query(
            r#"
            INSERT INTO prediction_logs (id, user_id, symptoms_json, predicted_disease,
                                         confidence, success, timestamp, metadata_json)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&entry.user_id)
        .bind(&symptoms_json)
        .bind(&entry.predicted_disease)
        .bind(entry.confidence)
        .bind(entry.success)
        .bind(format_ts(&entry.timestamp))
        .bind(&metadata_json)
        .execute(&self.pool)
        .await
        .context("Failed to write prediction log")?;

        Ok(Some(id))
    }

    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<AuditLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, symptoms_json, predicted_disease, confidence, success,
                   timestamp, metadata_json
            FROM prediction_logs
            WHERE user_id = ?
            ORDER BY timestamp DESC, rowid DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to read prediction history")?;

        rows.iter()
            .map(|row| {
                let symptoms_json: String = row.get("symptoms_json");
                let metadata_json: String = row.get("metadata_json");
                let ts: String = row.get("timestamp");
                let symptoms: Vec<String> = serde_json::from_str(&symptoms_json)?;
                let metadata: BTreeMap<String, String> =
                    serde_json::from_str(&metadata_json).unwrap_or_default();
                let timestamp = DateTime::parse_from_rfc3339(&ts)
                    .with_context(|| format!("Bad timestamp in prediction_logs: {}", ts))?
                    .with_timezone(&Utc);

                Ok(AuditLogEntry {
                    id: row.get("id"),
                    user_id: row.get("user_id"),
                    symptoms,
                    predicted_disease: row.get("predicted_disease"),
                    confidence: row.get("confidence"),
                    success: row.get("success"),
                    timestamp,
                    metadata,
                })
            })
            .collect()
    }
}
