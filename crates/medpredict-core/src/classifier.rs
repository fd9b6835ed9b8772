//! Classifier abstraction.
//!
//! The engine only sees [`Classifier::classify`]: a pure, deterministic map
//! from a binary [`FeatureVector`] to a catalog [`Label`]. Concrete model
//! formats live in [`crate::model`]; tests can pass a closure.

use serde::Serialize;
use thiserror::Error;

use crate::catalog::Label;

/// Fixed-length binary encoding of which symptoms are present.
///
/// Position `i` corresponds to vocabulary index `i`. Setting the same index
/// twice is harmless, so construction has set semantics over the input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeatureVector {
    bits: Vec<u8>,
}

impl FeatureVector {
    pub fn zeros(len: usize) -> Self {
        Self { bits: vec![0; len] }
    }

    /// Build a vector of length `len` with the given positions set to 1.
    /// Out-of-range positions are ignored.
    pub fn from_indices<I>(len: usize, indices: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut v = Self::zeros(len);
        for i in indices {
            v.set(i);
        }
        v
    }

    pub fn set(&mut self, index: usize) {
        if let Some(bit) = self.bits.get_mut(index) {
            *bit = 1;
        }
    }

    pub fn is_set(&self, index: usize) -> bool {
        self.bits.get(index).is_some_and(|b| *b == 1)
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Indices of the set positions, ascending.
    pub fn active(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == 1)
            .map(|(i, _)| i)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bits
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("feature vector has {actual} positions, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("classifier panicked")]
    Panicked,

    #[error("classification failed: {0}")]
    Failed(String),
}

/// Descriptive information about a loaded classifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassifierInfo {
    /// Format identifier, e.g. `"linear_ovo"`.
    pub kind: String,
    /// Expected feature-vector length, when the model declares it.
    pub n_features: Option<usize>,
    /// Labels the model can emit, when known.
    pub labels: Vec<Label>,
    /// Free-form training metadata carried by the artifact.
    pub metadata: serde_json::Value,
}

/// A pre-trained decision function.
///
/// Implementations must be pure: the same vector always yields the same
/// label, and concurrent calls from multiple threads are allowed.
pub trait Classifier: Send + Sync {
    fn classify(&self, features: &FeatureVector) -> Result<Label, ClassifierError>;

    fn info(&self) -> ClassifierInfo {
        ClassifierInfo {
            kind: "opaque".to_string(),
            ..Default::default()
        }
    }
}

impl<F> Classifier for F
where
    F: Fn(&FeatureVector) -> Label + Send + Sync,
{
    fn classify(&self, features: &FeatureVector) -> Result<Label, ClassifierError> {
        Ok(self(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_indices_set_semantics() {
        let a = FeatureVector::from_indices(5, [3, 1, 3]);
        let b = FeatureVector::from_indices(5, [1, 3]);
        assert_eq!(a, b);
        assert_eq!(a.as_slice(), &[0, 1, 0, 1, 0]);
        assert_eq!(a.active().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_out_of_range_ignored() {
        let v = FeatureVector::from_indices(3, [0, 7]);
        assert_eq!(v.len(), 3);
        assert!(v.is_set(0));
        assert!(!v.is_set(7));
    }

    #[test]
    fn test_closure_classifier() {
        let c = |fv: &FeatureVector| fv.active().count() as Label;
        let fv = FeatureVector::from_indices(4, [0, 2]);
        assert_eq!(c.classify(&fv), Ok(2));
        assert_eq!(c.info().kind, "opaque");
    }
}
