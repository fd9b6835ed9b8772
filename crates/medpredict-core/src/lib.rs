//! # medpredict core
//!
//! I/O-free prediction logic: symptom vocabulary, disease catalog, reference
//! tables, the classifier seam, the prediction engine, symptom search, and
//! the audit-sink trait.
//!
//! This crate contains no tokio, sqlx, or filesystem access. The application
//! crate loads assets from disk and hands the parsed data to
//! [`engine::PredictionEngine::new`].

pub mod audit;
pub mod catalog;
pub mod classifier;
pub mod engine;
pub mod model;
pub mod models;
pub mod reference;
pub mod search;
pub mod vocabulary;

pub use audit::{AuditLogEntry, AuditSink, InMemoryAuditLog, ANONYMOUS_USER};
pub use catalog::{DiseaseCatalog, Label};
pub use classifier::{Classifier, ClassifierError, ClassifierInfo, FeatureVector};
pub use engine::{EngineError, PredictionEngine};
pub use model::{ModelArtifact, ModelError};
pub use models::{Enrichment, FailureKind, PredictionResult, SymptomValidation};
pub use reference::{AttributeKind, ReferenceRow, ReferenceStore};
pub use vocabulary::SymptomVocabulary;
