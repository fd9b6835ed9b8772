//! Prediction audit log abstraction.
//!
//! The engine itself never writes audit entries; the service layer records
//! successful predictions through an [`AuditSink`] and treats write failures
//! as non-fatal. Entries are append-only.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::PredictionResult;

/// User identifier recorded for unauthenticated callers.
pub const ANONYMOUS_USER: &str = "anonymous";

/// One recorded prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Assigned by the sink on write; empty before that.
    #[serde(default)]
    pub id: String,
    pub user_id: String,
    /// Symptoms exactly as the caller supplied them.
    pub symptoms: Vec<String>,
    pub predicted_disease: Option<String>,
    pub confidence: Option<f64>,
    pub success: bool,
    pub timestamp: DateTime<Utc>,
    /// Free-form context: `source`, `ip_address`, `user_agent`, ...
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl AuditLogEntry {
    pub fn new(
        user_id: Option<&str>,
        symptoms: &[String],
        result: &PredictionResult,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: String::new(),
            user_id: user_id.unwrap_or(ANONYMOUS_USER).to_string(),
            symptoms: symptoms.to_vec(),
            predicted_disease: result.predicted_disease.clone(),
            confidence: result.confidence,
            success: result.success,
            timestamp: Utc::now(),
            metadata,
        }
    }
}

/// Append-only store for prediction audit entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append an entry. Returns the entry identifier when the backend assigns
    /// one.
    async fn record(&self, entry: &AuditLogEntry) -> Result<Option<String>>;

    /// Most recent entries for `user_id`, newest first.
    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<AuditLogEntry>>;
}

/// In-memory audit log for tests and embedded use.
#[derive(Default)]
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    async fn record(&self, entry: &AuditLogEntry) -> Result<Option<String>> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut stored = entry.clone();
        stored.id = id.clone();
        self.entries
            .write()
            .map_err(|_| anyhow!("audit log lock poisoned"))?
            .push(stored);
        Ok(Some(id))
    }

    async fn history(&self, user_id: &str, limit: usize) -> Result<Vec<AuditLogEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| anyhow!("audit log lock poisoned"))?;
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
