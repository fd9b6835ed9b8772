//! `medpredict predict` and `medpredict validate`.

use std::collections::BTreeMap;

use anyhow::Result;
use tracing::warn;

use medpredict_core::{AuditLogEntry, AuditSink, PredictionResult};

use crate::assets;
use crate::audit_store::SqliteAuditLog;
use crate::config::Config;
use crate::db;
use crate::migrate;

/// Run one prediction and print it. Returns whether the prediction succeeded.
///
/// Successful predictions are appended to the audit log unless `no_log` is
/// set; a failed audit write is reported but does not fail the command.
pub async fn run_predict(
    config: &Config,
    symptoms: &[String],
    json: bool,
    user: Option<&str>,
    no_log: bool,
) -> Result<bool> {
    let (engine, _) = assets::load_engine(config)?;
    let result = engine.predict(symptoms);

    let prediction_id = if result.success && !no_log {
        record(config, user, symptoms, &result).await
    } else {
        None
    };

    if json {
        let mut value = serde_json::to_value(&result)?;
        if let (Some(id), Some(obj)) = (&prediction_id, value.as_object_mut()) {
            obj.insert("prediction_id".to_string(), id.clone().into());
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print_result(&result);
    }

    Ok(result.success)
}

async fn record(
    config: &Config,
    user: Option<&str>,
    symptoms: &[String],
    result: &PredictionResult,
) -> Option<String> {
    match write_entry(config, user, symptoms, result).await {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "failed to record prediction");
            None
        }
    }
}

async fn write_entry(
    config: &Config,
    user: Option<&str>,
    symptoms: &[String],
    result: &PredictionResult,
) -> Result<Option<String>> {
    let pool = db::connect(config).await?;
    migrate::migrate_pool(&pool).await?;
    let log = SqliteAuditLog::new(pool);
    let metadata = BTreeMap::from([("source".to_string(), "cli_prediction".to_string())]);
    let entry = AuditLogEntry::new(user, symptoms, result, metadata);
    let id = log.record(&entry).await?;
    log.close().await;
    Ok(id)
}

fn print_result(result: &PredictionResult) {
    if !result.invalid_symptoms.is_empty() {
        println!("Unrecognized: {}", result.invalid_symptoms.join(", "));
    }

    let (Some(disease), Some(enrichment)) = (&result.predicted_disease, &result.enrichment) else {
        if let Some(failure) = &result.failure {
            println!("{}: {}", failure.error, failure.message);
        }
        return;
    };

    println!("Disease:      {}", disease.trim());
    println!("Symptoms:     {}", result.symptoms_detected.join(", "));
    println!();
    println!("{}", enrichment.description);
    print_list("Precautions", &enrichment.precautions);
    print_list("Medications", &enrichment.medications);
    print_list("Diet", &enrichment.diet);
    print_list("Workout", &enrichment.workout);
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}:", title);
    for item in items {
        println!("  - {}", item);
    }
}

/// Check symptom names without classifying.
pub fn run_validate(config: &Config, symptoms: &[String], json: bool) -> Result<()> {
    let (engine, _) = assets::load_engine(config)?;
    let report = engine.validate(symptoms, config.api.suggestion_limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    for s in &report.valid_symptoms {
        println!("  ok       {}", s);
    }
    for s in &report.invalid_symptoms {
        match report.suggestions.get(s) {
            Some(similar) => println!("  unknown  {}  (did you mean: {})", s, similar.join(", ")),
            None => println!("  unknown  {}", s),
        }
    }
    println!(
        "{} of {} valid",
        report.validation_summary.valid, report.validation_summary.total
    );
    Ok(())
}
