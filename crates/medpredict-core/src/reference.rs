//! In-memory reference tables used to enrich a predicted disease.
//!
//! Five independent tables, each keyed by disease display name. Lookups never
//! fail: a disease with no row in a table gets that table's empty default, so
//! a missing workout plan cannot abort a prediction.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::models::Enrichment;

/// Placeholder returned when a disease has no description row.
pub const NO_DESCRIPTION: &str = "No description available";

/// The five reference tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Description,
    Precautions,
    Medications,
    Diet,
    Workout,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 5] = [
        AttributeKind::Description,
        AttributeKind::Precautions,
        AttributeKind::Medications,
        AttributeKind::Diet,
        AttributeKind::Workout,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AttributeKind::Description => "description",
            AttributeKind::Precautions => "precautions",
            AttributeKind::Medications => "medications",
            AttributeKind::Diet => "diet",
            AttributeKind::Workout => "workout",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of one attribute kind for one disease.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReferenceRow {
    /// Free text (description). Multiple source rows are joined with a space.
    Text(String),
    /// Ordered values; duplicates from the source rows are preserved.
    List(Vec<String>),
}

impl ReferenceRow {
    pub fn is_empty(&self) -> bool {
        match self {
            ReferenceRow::Text(text) => text.is_empty(),
            ReferenceRow::List(values) => values.is_empty(),
        }
    }

    fn into_text(self) -> String {
        match self {
            ReferenceRow::Text(text) => text,
            ReferenceRow::List(values) => values.join(" "),
        }
    }

    fn into_list(self) -> Vec<String> {
        match self {
            ReferenceRow::Text(text) if text.is_empty() => Vec::new(),
            ReferenceRow::Text(text) => vec![text],
            ReferenceRow::List(values) => values,
        }
    }
}

/// Immutable-after-load reference data. Build with [`ReferenceStore::insert`]
/// during startup, then share read-only.
#[derive(Debug, Clone, Default)]
pub struct ReferenceStore {
    tables: HashMap<AttributeKind, HashMap<String, Vec<String>>>,
}

impl ReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one source row's values for `disease` to the `kind` table.
    ///
    /// Blank values are dropped; row order and repeats are kept. A row whose
    /// values are all blank still registers the disease in the table.
    pub fn insert<I, S>(&mut self, kind: AttributeKind, disease: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self
            .tables
            .entry(kind)
            .or_default()
            .entry(disease.to_string())
            .or_default();
        entry.extend(
            values
                .into_iter()
                .map(Into::into)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        );
    }

    /// Look up one attribute kind for a disease. Never fails.
    pub fn lookup(&self, disease: &str, kind: AttributeKind) -> ReferenceRow {
        let values = self.tables.get(&kind).and_then(|t| t.get(disease));
        match kind {
            AttributeKind::Description => match values {
                Some(v) if !v.is_empty() => ReferenceRow::Text(v.join(" ")),
                _ => ReferenceRow::Text(NO_DESCRIPTION.to_string()),
            },
            _ => ReferenceRow::List(values.cloned().unwrap_or_default()),
        }
    }

    /// Whether `disease` has at least one non-blank value in the `kind` table.
    pub fn has_row(&self, disease: &str, kind: AttributeKind) -> bool {
        self.tables
            .get(&kind)
            .and_then(|t| t.get(disease))
            .is_some_and(|v| !v.is_empty())
    }

    /// Kinds for which `disease` only gets the empty default.
    pub fn missing_kinds(&self, disease: &str) -> Vec<AttributeKind> {
        AttributeKind::ALL
            .into_iter()
            .filter(|kind| !self.has_row(disease, *kind))
            .collect()
    }

    /// Number of diseases present in the `kind` table.
    pub fn disease_count(&self, kind: AttributeKind) -> usize {
        self.tables.get(&kind).map_or(0, HashMap::len)
    }

    /// All five attribute kinds for `disease`, each independently defaulted.
    pub fn enrich(&self, disease: &str) -> Enrichment {
        Enrichment {
            description: self
                .lookup(disease, AttributeKind::Description)
                .into_text(),
            precautions: self
                .lookup(disease, AttributeKind::Precautions)
                .into_list(),
            medications: self
                .lookup(disease, AttributeKind::Medications)
                .into_list(),
            diet: self.lookup(disease, AttributeKind::Diet).into_list(),
            workout: self.lookup(disease, AttributeKind::Workout).into_list(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ReferenceStore {
        let mut store = ReferenceStore::new();
        store.insert(
            AttributeKind::Description,
            "Flu",
            ["Viral infection of the airways."],
        );
        store.insert(
            AttributeKind::Precautions,
            "Flu",
            ["rest", "", "drink fluids", "  "],
        );
        store.insert(AttributeKind::Medications, "Flu", ["Oseltamivir"]);
        store.insert(AttributeKind::Medications, "Flu", ["Oseltamivir"]);
        store.insert(AttributeKind::Diet, "Flu", ["Soup", "Tea"]);
        store
    }

    #[test]
    fn test_lookup_present_rows() {
        let store = store();
        assert_eq!(
            store.lookup("Flu", AttributeKind::Description),
            ReferenceRow::Text("Viral infection of the airways.".into())
        );
        assert_eq!(
            store.lookup("Flu", AttributeKind::Precautions),
            ReferenceRow::List(vec!["rest".into(), "drink fluids".into()])
        );
    }

    #[test]
    fn test_medication_multiplicity_preserved() {
        let store = store();
        assert_eq!(
            store.lookup("Flu", AttributeKind::Medications),
            ReferenceRow::List(vec!["Oseltamivir".into(), "Oseltamivir".into()])
        );
    }

    #[test]
    fn test_missing_rows_default() {
        let store = store();
        assert_eq!(
            store.lookup("Flu", AttributeKind::Workout),
            ReferenceRow::List(vec![])
        );
        assert_eq!(
            store.lookup("Unknown", AttributeKind::Description),
            ReferenceRow::Text(NO_DESCRIPTION.into())
        );
        assert_eq!(store.missing_kinds("Flu"), vec![AttributeKind::Workout]);
        assert_eq!(store.missing_kinds("Unknown").len(), 5);
    }

    #[test]
    fn test_enrich_is_independent_per_kind() {
        let store = store();
        let e = store.enrich("Flu");
        assert_eq!(e.description, "Viral infection of the airways.");
        assert_eq!(e.precautions, vec!["rest", "drink fluids"]);
        assert_eq!(e.diet, vec!["Soup", "Tea"]);
        assert!(e.workout.is_empty());

        let empty = store.enrich("Unknown");
        assert_eq!(empty.description, NO_DESCRIPTION);
        assert!(empty.precautions.is_empty());
        assert!(empty.medications.is_empty());
    }

    #[test]
    fn test_multiple_description_rows_joined() {
        let mut store = ReferenceStore::new();
        store.insert(AttributeKind::Description, "Flu", ["Part one."]);
        store.insert(AttributeKind::Description, "Flu", ["Part two."]);
        assert_eq!(store.enrich("Flu").description, "Part one. Part two.");
        assert_eq!(store.disease_count(AttributeKind::Description), 1);
        assert_eq!(store.disease_count(AttributeKind::Workout), 0);
    }

    #[test]
    fn test_disease_names_match_exactly() {
        let mut store = ReferenceStore::new();
        store.insert(AttributeKind::Diet, "Diabetes ", ["Low sugar"]);
        assert!(store.has_row("Diabetes ", AttributeKind::Diet));
        assert!(!store.has_row("Diabetes", AttributeKind::Diet));
    }
}
