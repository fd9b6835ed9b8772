//! Disease catalog: classifier output labels to display names.
//!
//! Labels come from the training process and are neither contiguous nor
//! guaranteed to start at zero. Display names are kept verbatim, including
//! trailing spaces and spelling quirks, because the reference tables are
//! keyed by the same strings.

use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

/// Raw classifier output.
pub type Label = i64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("disease catalog is empty")]
    Empty,

    #[error("label {0} is listed more than once")]
    DuplicateLabel(Label),

    #[error("label {0} has a blank disease name")]
    BlankName(Label),
}

/// Immutable label → disease-name mapping.
#[derive(Debug, Clone)]
pub struct DiseaseCatalog {
    names: BTreeMap<Label, String>,
}

impl DiseaseCatalog {
    pub fn from_entries<I, S>(entries: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = (Label, S)>,
        S: Into<String>,
    {
        let mut names = BTreeMap::new();
        for (label, name) in entries {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(CatalogError::BlankName(label));
            }
            if names.insert(label, name).is_some() {
                return Err(CatalogError::DuplicateLabel(label));
            }
        }
        if names.is_empty() {
            return Err(CatalogError::Empty);
        }
        Ok(Self { names })
    }

    /// The catalog matching the built-in vocabulary's model (41 diseases).
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_DISEASES.iter().map(|(l, n)| (*l, *n)))
            .unwrap_or_else(|e| unreachable!("built-in catalog is well-formed: {e}"))
    }

    /// Display name for `label`, or `None` when the model and catalog disagree.
    pub fn name(&self, label: Label) -> Option<&str> {
        self.names.get(&label).map(String::as_str)
    }

    pub fn contains(&self, label: Label) -> bool {
        self.names.contains_key(&label)
    }

    /// Number of labels (not distinct names).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.names.keys().copied()
    }

    /// Every distinct disease name, in label order, first occurrence wins.
    pub fn all_diseases(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.names
            .values()
            .map(String::as_str)
            .filter(|name| seen.insert(*name))
            .collect()
    }
}

impl Default for DiseaseCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

const BUILTIN_DISEASES: [(Label, &str); 41] = [
    (0, "(vertigo) Paroymsal  Positional Vertigo"),
    (1, "AIDS"),
    (2, "Acne"),
    (3, "Alcoholic hepatitis"),
    (4, "Allergy"),
    (5, "Arthritis"),
    (6, "Bronchial Asthma"),
    (7, "Cervical spondylosis"),
    (8, "Chicken pox"),
    (9, "Chronic cholestasis"),
    (10, "Common Cold"),
    (11, "Dengue"),
    (12, "Diabetes "),
    (13, "Dimorphic hemmorhoids(piles)"),
    (14, "Drug Reaction"),
    (15, "Fungal infection"),
    (16, "GERD"),
    (17, "Gastroenteritis"),
    (18, "Heart attack"),
    (19, "Hepatitis B"),
    (20, "Hepatitis C"),
    (21, "Hepatitis D"),
    (22, "Hepatitis E"),
    (23, "Hypertension "),
    (24, "Hyperthyroidism"),
    (25, "Hypoglycemia"),
    (26, "Hypothyroidism"),
    (27, "Impetigo"),
    (28, "Jaundice"),
    (29, "Malaria"),
    (30, "Migraine"),
    (31, "Osteoarthristis"),
    (32, "Paralysis (brain hemorrhage)"),
    (33, "Peptic ulcer diseae"),
    (34, "Pneumonia"),
    (35, "Psoriasis"),
    (36, "Tuberculosis"),
    (37, "Typhoid"),
    (38, "Urinary tract infection"),
    (39, "Varicose veins"),
    (40, "hepatitis A"),
];
