//! Result types produced by the prediction engine.
//!
//! These are the shapes the HTTP layer serializes and the audit log records.
//! Field names match the JSON contract consumed by existing clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Confidence reported for every successful prediction. The model exposes no
/// calibrated score, so this is a fixed value kept for response compatibility.
pub const FIXED_CONFIDENCE: f64 = 1.0;

/// Enrichment attached to a resolved disease. Missing reference rows yield the
/// documented empty defaults rather than absent fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrichment {
    pub description: String,
    pub precautions: Vec<String>,
    pub medications: Vec<String>,
    pub diet: Vec<String>,
    pub workout: Vec<String>,
}

/// Why a prediction did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// None of the supplied tokens is a known symptom. Caller error.
    NoValidSymptoms,
    /// Classifier failure or model/catalog skew. Deployment defect.
    InternalError,
}

impl FailureKind {
    /// Whether the failure was caused by the caller's input.
    pub fn is_user_error(self) -> bool {
        matches!(self, FailureKind::NoValidSymptoms)
    }
}

/// Failure detail carried on an unsuccessful [`PredictionResult`].
///
/// Messages are generic on purpose for `InternalError`; the underlying cause
/// is only logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionFailure {
    pub kind: FailureKind,
    pub error: String,
    pub message: String,
}

/// Outcome of a single `predict` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_disease: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(flatten)]
    pub enrichment: Option<Enrichment>,
    pub symptoms_detected: Vec<String>,
    pub invalid_symptoms: Vec<String>,
    pub total_symptoms: usize,
    #[serde(flatten)]
    pub failure: Option<PredictionFailure>,
}

impl PredictionResult {
    pub(crate) fn success(
        disease: String,
        enrichment: Enrichment,
        valid: Vec<String>,
        invalid: Vec<String>,
    ) -> Self {
        Self {
            success: true,
            predicted_disease: Some(disease),
            confidence: Some(FIXED_CONFIDENCE),
            enrichment: Some(enrichment),
            total_symptoms: valid.len(),
            symptoms_detected: valid,
            invalid_symptoms: invalid,
            failure: None,
        }
    }

    pub(crate) fn no_valid_symptoms(invalid: Vec<String>) -> Self {
        Self {
            success: false,
            predicted_disease: None,
            confidence: None,
            enrichment: None,
            symptoms_detected: Vec::new(),
            invalid_symptoms: invalid,
            total_symptoms: 0,
            failure: Some(PredictionFailure {
                kind: FailureKind::NoValidSymptoms,
                error: "No valid symptoms provided".to_string(),
                message: "Please provide valid symptoms from the available list".to_string(),
            }),
        }
    }

    pub(crate) fn internal_error(valid: Vec<String>, invalid: Vec<String>) -> Self {
        Self {
            success: false,
            predicted_disease: None,
            confidence: None,
            enrichment: None,
            total_symptoms: valid.len(),
            symptoms_detected: valid,
            invalid_symptoms: invalid,
            failure: Some(PredictionFailure {
                kind: FailureKind::InternalError,
                error: "Prediction failed".to_string(),
                message: "Error in prediction process".to_string(),
            }),
        }
    }

    /// Failure kind, or `None` on success.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }
}

/// Per-token validation report with suggestions for unknown tokens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomValidation {
    pub valid_symptoms: Vec<String>,
    pub invalid_symptoms: Vec<String>,
    /// Unknown token → up to N vocabulary entries containing it.
    pub suggestions: BTreeMap<String, Vec<String>>,
    pub validation_summary: ValidationSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ValidationSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_enrichment() -> Enrichment {
        Enrichment {
            description: "A fungal infection.".into(),
            precautions: vec!["keep dry".into()],
            medications: vec![],
            diet: vec!["Probiotics".into()],
            workout: vec![],
        }
    }

    #[test]
    fn test_success_shape_flattens_enrichment() {
        let result = PredictionResult::success(
            "Fungal infection".into(),
            sample_enrichment(),
            vec!["itching".into()],
            vec!["bogus".into()],
        );
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["predicted_disease"], json!("Fungal infection"));
        assert_eq!(value["confidence"], json!(1.0));
        assert_eq!(value["description"], json!("A fungal infection."));
        assert_eq!(value["medications"], json!([]));
        assert_eq!(value["workout"], json!([]));
        assert_eq!(value["total_symptoms"], json!(1));
        assert!(value.get("kind").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_failure_shape_has_no_disease() {
        let result = PredictionResult::no_valid_symptoms(vec!["bogus".into()]);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["kind"], json!("no_valid_symptoms"));
        assert_eq!(value["invalid_symptoms"], json!(["bogus"]));
        assert!(value.get("predicted_disease").is_none());
        assert!(value.get("confidence").is_none());
        assert!(value.get("description").is_none());
    }

    #[test]
    fn test_failure_kind_classification() {
        assert!(FailureKind::NoValidSymptoms.is_user_error());
        assert!(!FailureKind::InternalError.is_user_error());
        let result = PredictionResult::internal_error(vec!["cough".into()], vec![]);
        assert_eq!(result.failure_kind(), Some(FailureKind::InternalError));
        assert_eq!(result.total_symptoms, 1);
    }
}
