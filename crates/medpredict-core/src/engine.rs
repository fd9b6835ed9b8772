//! Prediction engine: symptom tokens in, enriched disease prediction out.
//!
//! # Pipeline
//!
//! 1. Normalize each raw token (whitespace and stray `[`, `]`, `'` removed);
//!    drop tokens that end up empty.
//! 2. Partition tokens into known and unknown symptoms, keeping input order.
//!    No known symptoms → `NoValidSymptoms`, no classification.
//! 3. Build a binary feature vector over the vocabulary (set semantics, so
//!    input order and repeats do not matter).
//! 4. Classify and map the label through the disease catalog. A classifier
//!    failure or an unmapped label → `InternalError`, logged at error level.
//! 5. Enrich from the reference tables, each kind independently defaulted.
//!
//! The engine holds only immutable data and is `Send + Sync`; share it behind
//! an `Arc` and call [`PredictionEngine::predict`] from any number of tasks.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::catalog::{DiseaseCatalog, Label};
use crate::classifier::{Classifier, ClassifierError, ClassifierInfo, FeatureVector};
use crate::models::{PredictionResult, SymptomValidation, ValidationSummary};
use crate::reference::ReferenceStore;
use crate::search::search_symptoms;
use crate::vocabulary::SymptomVocabulary;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("classifier expects {model} features but the vocabulary has {vocabulary} symptoms")]
    FeatureCountMismatch { model: usize, vocabulary: usize },

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error("classifier returned label {0}, which is not in the disease catalog")]
    UnknownLabel(Label),
}

/// Strip whitespace and list-serialization debris (`[`, `]`, `'`) from both
/// ends of a raw symptom token.
pub fn normalize_token(raw: &str) -> &str {
    raw.trim_matches(|c: char| c.is_whitespace() || matches!(c, '[' | ']' | '\''))
}

/// Normalize every token and drop the ones that end up empty.
pub fn normalize_symptoms<S: AsRef<str>>(symptoms: &[S]) -> Vec<String> {
    symptoms
        .iter()
        .map(|s| normalize_token(s.as_ref()))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// The immutable prediction context, built once at startup.
pub struct PredictionEngine {
    vocabulary: SymptomVocabulary,
    catalog: DiseaseCatalog,
    reference: ReferenceStore,
    classifier: Box<dyn Classifier>,
}

impl PredictionEngine {
    /// Assemble an engine. Fails if the classifier declares a feature count
    /// different from the vocabulary size.
    pub fn new(
        vocabulary: SymptomVocabulary,
        catalog: DiseaseCatalog,
        reference: ReferenceStore,
        classifier: Box<dyn Classifier>,
    ) -> Result<Self, EngineError> {
        if let Some(n) = classifier.info().n_features {
            if n != vocabulary.len() {
                return Err(EngineError::FeatureCountMismatch {
                    model: n,
                    vocabulary: vocabulary.len(),
                });
            }
        }
        Ok(Self {
            vocabulary,
            catalog,
            reference,
            classifier,
        })
    }

    pub fn vocabulary(&self) -> &SymptomVocabulary {
        &self.vocabulary
    }

    pub fn catalog(&self) -> &DiseaseCatalog {
        &self.catalog
    }

    pub fn reference(&self) -> &ReferenceStore {
        &self.reference
    }

    pub fn classifier_info(&self) -> ClassifierInfo {
        self.classifier.info()
    }

    /// Labels the classifier declares that the catalog cannot name.
    ///
    /// Opaque classifiers declare nothing, so an empty result does not prove
    /// the two agree; unmapped labels are still caught per request.
    pub fn unmapped_labels(&self) -> Vec<Label> {
        self.classifier
            .info()
            .labels
            .into_iter()
            .filter(|l| !self.catalog.contains(*l))
            .collect()
    }

    pub fn all_symptoms(&self) -> Vec<&str> {
        self.vocabulary.iter().collect()
    }

    pub fn all_diseases(&self) -> Vec<&str> {
        self.catalog.all_diseases()
    }

    pub fn search(&self, query: &str, limit: usize) -> Vec<&str> {
        search_symptoms(&self.vocabulary, query, limit)
    }

    /// Feature vector for a set of known symptoms. Unknown names are ignored.
    pub fn features<S: AsRef<str>>(&self, symptoms: &[S]) -> FeatureVector {
        FeatureVector::from_indices(
            self.vocabulary.len(),
            symptoms
                .iter()
                .filter_map(|s| self.vocabulary.index_of(s.as_ref())),
        )
    }

    /// Run the full pipeline. Never panics and never returns an error: every
    /// outcome is a [`PredictionResult`].
    pub fn predict<S: AsRef<str>>(&self, symptoms: &[S]) -> PredictionResult {
        let (valid, invalid): (Vec<String>, Vec<String>) = normalize_symptoms(symptoms)
            .into_iter()
            .partition(|s| self.vocabulary.contains(s));

        if valid.is_empty() {
            debug!(invalid = ?invalid, "no known symptoms in request");
            return PredictionResult::no_valid_symptoms(invalid);
        }

        let disease = match self.resolve(&valid) {
            Ok(disease) => disease,
            Err(err) => {
                error!(error = %err, symptoms = ?valid, "prediction failed");
                return PredictionResult::internal_error(valid, invalid);
            }
        };

        let missing = self.reference.missing_kinds(&disease);
        if !missing.is_empty() {
            warn!(disease = %disease, missing = ?missing, "reference data incomplete");
        }
        let enrichment = self.reference.enrich(&disease);

        debug!(disease = %disease, valid = valid.len(), invalid = invalid.len(), "prediction");
        PredictionResult::success(disease, enrichment, valid, invalid)
    }

    /// Classify `valid` and resolve the label to a disease name.
    fn resolve(&self, valid: &[String]) -> Result<String, EngineError> {
        let features = self.features(valid);
        let label = catch_unwind(AssertUnwindSafe(|| self.classifier.classify(&features)))
            .map_err(|_| ClassifierError::Panicked)??;
        self.catalog
            .name(label)
            .map(str::to_string)
            .ok_or(EngineError::UnknownLabel(label))
    }

    /// Check tokens against the vocabulary without classifying, suggesting up
    /// to `suggestion_limit` known symptoms for each unknown token.
    pub fn validate<S: AsRef<str>>(
        &self,
        symptoms: &[S],
        suggestion_limit: usize,
    ) -> SymptomValidation {
        let mut valid = Vec::new();
        let mut invalid = Vec::new();
        let mut suggestions = BTreeMap::new();

        for token in normalize_symptoms(symptoms) {
            if self.vocabulary.contains(&token) {
                valid.push(token);
                continue;
            }
            let similar: Vec<String> = self
                .search(&token, suggestion_limit)
                .into_iter()
                .map(str::to_string)
                .collect();
            if !similar.is_empty() {
                suggestions.insert(token.clone(), similar);
            }
            invalid.push(token);
        }

        SymptomValidation {
            validation_summary: ValidationSummary {
                total: valid.len() + invalid.len(),
                valid: valid.len(),
                invalid: invalid.len(),
            },
            valid_symptoms: valid,
            invalid_symptoms: invalid,
            suggestions,
        }
    }
}
