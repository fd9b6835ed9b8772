//! Serialized classifier artifacts.
//!
//! A model file is a JSON document tagged by `kind`:
//!
//! | `kind` | Decision rule |
//! |--------|---------------|
//! | `linear_ovr` | one weight row per label; highest `w·x + b` wins |
//! | `linear_ovo` | one linear separator per label pair; majority vote wins |
//!
//! `linear_ovo` is the shape a linear-kernel support vector classifier
//! exports. Both formats declare `n_features`, which must equal the symptom
//! vocabulary size.
//!
//! ```json
//! {
//!   "kind": "linear_ovr",
//!   "n_features": 3,
//!   "labels": [10, 20],
//!   "weights": [[1.0, 0.0, 0.0], [0.0, 1.0, 1.0]],
//!   "intercepts": [0.0, -0.5],
//!   "metadata": { "algorithm": "linear", "version": "1.0.0" }
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::Label;
use crate::classifier::{Classifier, ClassifierError, ClassifierInfo, FeatureVector};

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to parse model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

fn invalid(msg: impl Into<String>) -> ModelError {
    ModelError::Invalid(msg.into())
}

/// One-vs-rest linear model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearOvrModel {
    pub n_features: usize,
    pub labels: Vec<Label>,
    pub weights: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Linear separator between `labels[i]` (positive side) and `labels[j]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairwiseSeparator {
    pub i: usize,
    pub j: usize,
    pub weights: Vec<f64>,
    pub intercept: f64,
}

/// One-vs-one linear model with majority voting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearOvoModel {
    pub n_features: usize,
    pub labels: Vec<Label>,
    pub separators: Vec<PairwiseSeparator>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A loaded classifier artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LinearOvr(LinearOvrModel),
    LinearOvo(LinearOvoModel),
}

impl ModelArtifact {
    /// Parse and validate an artifact from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ModelError> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes)?;
        artifact.validate()?;
        Ok(artifact)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Self::from_slice(json.as_bytes())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ModelArtifact::LinearOvr(_) => "linear_ovr",
            ModelArtifact::LinearOvo(_) => "linear_ovo",
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            ModelArtifact::LinearOvr(m) => m.n_features,
            ModelArtifact::LinearOvo(m) => m.n_features,
        }
    }

    pub fn labels(&self) -> &[Label] {
        match self {
            ModelArtifact::LinearOvr(m) => &m.labels,
            ModelArtifact::LinearOvo(m) => &m.labels,
        }
    }

    pub fn metadata(&self) -> &serde_json::Value {
        match self {
            ModelArtifact::LinearOvr(m) => &m.metadata,
            ModelArtifact::LinearOvo(m) => &m.metadata,
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        let labels = self.labels();
        if self.n_features() == 0 {
            return Err(invalid("n_features must be > 0"));
        }
        if labels.is_empty() {
            return Err(invalid("model declares no labels"));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = labels.iter().find(|l| !seen.insert(**l)) {
            return Err(invalid(format!("label {} is declared twice", dup)));
        }

        match self {
            ModelArtifact::LinearOvr(m) => {
                if m.weights.len() != m.labels.len() || m.intercepts.len() != m.labels.len() {
                    return Err(invalid(format!(
                        "expected {} weight rows and intercepts, got {} and {}",
                        m.labels.len(),
                        m.weights.len(),
                        m.intercepts.len()
                    )));
                }
                if let Some(row) = m.weights.iter().position(|w| w.len() != m.n_features) {
                    return Err(invalid(format!(
                        "weight row {} has {} entries, expected {}",
                        row,
                        m.weights[row].len(),
                        m.n_features
                    )));
                }
            }
            ModelArtifact::LinearOvo(m) => {
                if m.labels.len() > 1 && m.separators.is_empty() {
                    return Err(invalid("one-vs-one model has no separators"));
                }
                for (k, sep) in m.separators.iter().enumerate() {
                    if sep.i >= m.labels.len() || sep.j >= m.labels.len() || sep.i == sep.j {
                        return Err(invalid(format!(
                            "separator {} references classes ({}, {}) with {} labels",
                            k,
                            sep.i,
                            sep.j,
                            m.labels.len()
                        )));
                    }
                    if sep.weights.len() != m.n_features {
                        return Err(invalid(format!(
                            "separator {} has {} weights, expected {}",
                            k,
                            sep.weights.len(),
                            m.n_features
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

/// `w·x + b` for a binary `x`: only the active positions contribute.
fn decision(weights: &[f64], intercept: f64, features: &FeatureVector) -> f64 {
    features
        .active()
        .filter_map(|i| weights.get(i))
        .fold(intercept, |acc, w| acc + w)
}

impl LinearOvrModel {
    fn predict(&self, features: &FeatureVector) -> Label {
        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (k, (w, b)) in self.weights.iter().zip(&self.intercepts).enumerate() {
            let score = decision(w, *b, features);
            if score > best_score {
                best = k;
                best_score = score;
            }
        }
        self.labels[best]
    }
}

impl LinearOvoModel {
    fn predict(&self, features: &FeatureVector) -> Label {
        let mut votes = vec![0usize; self.labels.len()];
        for sep in &self.separators {
            if decision(&sep.weights, sep.intercept, features) > 0.0 {
                votes[sep.i] += 1;
            } else {
                votes[sep.j] += 1;
            }
        }
        let mut best = 0;
        for (k, v) in votes.iter().enumerate() {
            if *v > votes[best] {
                best = k;
            }
        }
        self.labels[best]
    }
}

impl Classifier for ModelArtifact {
    fn classify(&self, features: &FeatureVector) -> Result<Label, ClassifierError> {
        if features.len() != self.n_features() {
            return Err(ClassifierError::DimensionMismatch {
                expected: self.n_features(),
                actual: features.len(),
            });
        }
        Ok(match self {
            ModelArtifact::LinearOvr(m) => m.predict(features),
            ModelArtifact::LinearOvo(m) => m.predict(features),
        })
    }

    fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            kind: self.kind().to_string(),
            n_features: Some(self.n_features()),
            labels: self.labels().to_vec(),
            metadata: self.metadata().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVR: &str = r#"{
        "kind": "linear_ovr",
        "n_features": 3,
        "labels": [10, 20],
        "weights": [[1.0, 0.0, 0.0], [0.0, 1.0, 1.0]],
        "intercepts": [0.0, -0.5],
        "metadata": { "version": "1.0.0" }
    }"#;

    const OVO: &str = r#"{
        "kind": "linear_ovo",
        "n_features": 3,
        "labels": [1, 2, 3],
        "separators": [
            { "i": 0, "j": 1, "weights": [1.0, -1.0, 0.0], "intercept": 0.0 },
            { "i": 0, "j": 2, "weights": [1.0, 0.0, -1.0], "intercept": 0.0 },
            { "i": 1, "j": 2, "weights": [0.0, 1.0, -1.0], "intercept": 0.0 }
        ]
    }"#;

    #[test]
    fn test_ovr_highest_score_wins() {
        let model = ModelArtifact::from_json(OVR).unwrap();
        assert_eq!(model.kind(), "linear_ovr");
        let x = FeatureVector::from_indices(3, [0]);
        assert_eq!(model.classify(&x), Ok(10));
        let x = FeatureVector::from_indices(3, [1, 2]);
        assert_eq!(model.classify(&x), Ok(20));
    }

    #[test]
    fn test_ovr_tie_goes_to_first_label() {
        let model = ModelArtifact::from_json(
            r#"{"kind":"linear_ovr","n_features":3,"labels":[10,20],
                "weights":[[0.0,0.0,0.0],[0.0,1.0,0.0]],"intercepts":[0.0,-1.0]}"#,
        )
        .unwrap();
        assert_eq!(model.classify(&FeatureVector::from_indices(3, [1])), Ok(10));
    }

    #[test]
    fn test_ovo_majority_vote() {
        let model = ModelArtifact::from_json(OVO).unwrap();
        assert_eq!(model.classify(&FeatureVector::from_indices(3, [0])), Ok(1));
        assert_eq!(model.classify(&FeatureVector::from_indices(3, [1])), Ok(2));
        assert_eq!(model.classify(&FeatureVector::from_indices(3, [2])), Ok(3));
    }

    #[test]
    fn test_dimension_mismatch() {
        let model = ModelArtifact::from_json(OVR).unwrap();
        assert_eq!(
            model.classify(&FeatureVector::zeros(4)),
            Err(ClassifierError::DimensionMismatch {
                expected: 3,
                actual: 4
            })
        );
    }

    #[test]
    fn test_info_reports_metadata() {
        let info = ModelArtifact::from_json(OVR).unwrap().info();
        assert_eq!(info.kind, "linear_ovr");
        assert_eq!(info.n_features, Some(3));
        assert_eq!(info.labels, vec![10, 20]);
        assert_eq!(info.metadata["version"], "1.0.0");
    }

    #[test]
    fn test_rejects_malformed_artifacts() {
        assert!(matches!(
            ModelArtifact::from_json("not json"),
            Err(ModelError::Parse(_))
        ));
        assert!(matches!(
            ModelArtifact::from_json(r#"{"kind": "random_forest"}"#),
            Err(ModelError::Parse(_))
        ));

        let short_row = r#"{"kind":"linear_ovr","n_features":3,"labels":[1],
            "weights":[[1.0]],"intercepts":[0.0]}"#;
        assert!(matches!(
            ModelArtifact::from_json(short_row),
            Err(ModelError::Invalid(_))
        ));

        let dup_labels = r#"{"kind":"linear_ovr","n_features":1,"labels":[1,1],
            "weights":[[1.0],[1.0]],"intercepts":[0.0,0.0]}"#;
        assert!(matches!(
            ModelArtifact::from_json(dup_labels),
            Err(ModelError::Invalid(_))
        ));

        let bad_pair = r#"{"kind":"linear_ovo","n_features":1,"labels":[1,2],
            "separators":[{"i":0,"j":5,"weights":[1.0],"intercept":0.0}]}"#;
        assert!(matches!(
            ModelArtifact::from_json(bad_pair),
            Err(ModelError::Invalid(_))
        ));
    }
}
