//! Startup asset loading.
//!
//! Builds the [`PredictionEngine`] from files on disk, once, before anything
//! is served. Any missing or unreadable required file aborts startup with an
//! error naming the file; an empty reference table only logs a warning.
//!
//! # Directory search
//!
//! `[assets].search_dirs` is tried in order and the first existing directory
//! wins. The defaults are the backend asset directory, a top-level
//! `ml_assets/`, then the project root.
//!
//! # Files
//!
//! | File | Columns |
//! |------|---------|
//! | `model.json` | classifier artifact, see [`medpredict_core::model`] |
//! | `description.csv` | `Disease`, `Description` |
//! | `precautions_df.csv` | `Disease`, `Precaution_1` .. `Precaution_4` |
//! | `medications.csv` | `Disease`, `Medication` |
//! | `diets.csv` | `Disease`, `Diet` |
//! | `workout_df.csv` | `disease`, `workout` |
//!
//! Header names match case-insensitively; extra columns (such as a pandas
//! index column) are ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use medpredict_core::{
    AttributeKind, DiseaseCatalog, Label, ModelArtifact, PredictionEngine, ReferenceStore,
    SymptomVocabulary,
};

use crate::config::{AssetsConfig, Config};

/// Column layout of one reference table.
struct TableLayout {
    kind: AttributeKind,
    disease_column: &'static str,
    value_columns: &'static [&'static str],
}

const TABLES: [TableLayout; 5] = [
    TableLayout {
        kind: AttributeKind::Description,
        disease_column: "Disease",
        value_columns: &["Description"],
    },
    TableLayout {
        kind: AttributeKind::Precautions,
        disease_column: "Disease",
        value_columns: &["Precaution_1", "Precaution_2", "Precaution_3", "Precaution_4"],
    },
    TableLayout {
        kind: AttributeKind::Medications,
        disease_column: "Disease",
        value_columns: &["Medication"],
    },
    TableLayout {
        kind: AttributeKind::Diet,
        disease_column: "Disease",
        value_columns: &["Diet"],
    },
    TableLayout {
        kind: AttributeKind::Workout,
        disease_column: "disease",
        value_columns: &["workout"],
    },
];

/// Summary of what was loaded, for `medpredict check` and startup logs.
#[derive(Debug, Clone)]
pub struct AssetSummary {
    pub asset_dir: PathBuf,
    pub model_kind: String,
    pub symptoms: usize,
    pub diseases: usize,
    /// Rows read per reference table.
    pub table_rows: Vec<(AttributeKind, usize)>,
    pub unmapped_labels: Vec<Label>,
}

/// First directory in `search_dirs` that exists.
pub fn locate_asset_dir(assets: &AssetsConfig) -> Result<PathBuf> {
    assets
        .search_dirs
        .iter()
        .find(|dir| dir.is_dir())
        .cloned()
        .with_context(|| {
            format!(
                "No asset directory found; searched: {}",
                display_dirs(&assets.search_dirs)
            )
        })
}

fn display_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn file_name_for(assets: &AssetsConfig, kind: AttributeKind) -> &str {
    match kind {
        AttributeKind::Description => &assets.description,
        AttributeKind::Precautions => &assets.precautions,
        AttributeKind::Medications => &assets.medications,
        AttributeKind::Diet => &assets.diet,
        AttributeKind::Workout => &assets.workout,
    }
}

/// Resolve a required file inside `dir`, failing with its full path.
fn require_file(dir: &Path, name: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    if !path.is_file() {
        bail!("Required asset file not found: {}", path.display());
    }
    Ok(path)
}

/// Load every asset and assemble the engine.
pub fn load_engine(config: &Config) -> Result<(PredictionEngine, AssetSummary)> {
    let assets = &config.assets;
    let dir = locate_asset_dir(assets)?;

    let model_path = require_file(&dir, &assets.model)?;
    let model = load_model(&model_path)?;
    let model_kind = model.kind().to_string();

    let vocabulary = match &assets.vocabulary {
        Some(name) => load_vocabulary(&require_file(&dir, name)?)?,
        None => SymptomVocabulary::builtin(),
    };
    let catalog = match &assets.catalog {
        Some(name) => load_catalog(&require_file(&dir, name)?)?,
        None => DiseaseCatalog::builtin(),
    };

    let mut reference = ReferenceStore::new();
    let mut table_rows = Vec::with_capacity(TABLES.len());
    for layout in &TABLES {
        let path = require_file(&dir, file_name_for(assets, layout.kind))?;
        let rows = load_reference_table(&path, layout, &mut reference)?;
        if rows == 0 {
            warn!(table = %layout.kind, path = %path.display(), "reference table is empty");
        }
        table_rows.push((layout.kind, rows));
    }

    let engine = PredictionEngine::new(vocabulary, catalog, reference, Box::new(model))
        .with_context(|| format!("Model {} does not match the vocabulary", model_path.display()))?;

    let unmapped_labels = engine.unmapped_labels();
    if !unmapped_labels.is_empty() {
        warn!(labels = ?unmapped_labels, "model declares labels missing from the disease catalog");
    }

    let summary = AssetSummary {
        asset_dir: dir,
        model_kind,
        symptoms: engine.vocabulary().len(),
        diseases: engine.all_diseases().len(),
        table_rows,
        unmapped_labels,
    };
    info!(
        asset_dir = %summary.asset_dir.display(),
        model = %summary.model_kind,
        symptoms = summary.symptoms,
        diseases = summary.diseases,
        "prediction assets loaded"
    );

    Ok((engine, summary))
}

pub fn load_model(path: &Path) -> Result<ModelArtifact> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read model file: {}", path.display()))?;
    ModelArtifact::from_slice(&bytes)
        .with_context(|| format!("Failed to load model file: {}", path.display()))
}

/// Vocabulary override file: `{ "symptom_name": feature_index, ... }`.
pub fn load_vocabulary(path: &Path) -> Result<SymptomVocabulary> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read vocabulary file: {}", path.display()))?;
    let map: HashMap<String, usize> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse vocabulary file: {}", path.display()))?;
    SymptomVocabulary::from_indexed(map)
        .with_context(|| format!("Invalid vocabulary file: {}", path.display()))
}

/// Catalog override file: `{ "label": "Disease name", ... }`.
pub fn load_catalog(path: &Path) -> Result<DiseaseCatalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
    let map: HashMap<String, String> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse catalog file: {}", path.display()))?;

    let mut entries = Vec::with_capacity(map.len());
    for (key, name) in map {
        let label: Label = key.trim().parse().with_context(|| {
            format!(
                "Catalog key '{}' is not an integer label in {}",
                key,
                path.display()
            )
        })?;
        entries.push((label, name));
    }
    DiseaseCatalog::from_entries(entries)
        .with_context(|| format!("Invalid catalog file: {}", path.display()))
}

/// Read one CSV reference table into `store`. Returns the number of data rows.
fn load_reference_table(
    path: &Path,
    layout: &TableLayout,
    store: &mut ReferenceStore,
) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open reference table: {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of {}", path.display()))?
        .clone();
    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .with_context(|| format!("Column '{}' missing from {}", name, path.display()))
    };

    let disease_idx = column(layout.disease_column)?;
    let value_idx = layout
        .value_columns
        .iter()
        .map(|c| column(*c))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = 0;
    for (line, record) in reader.records().enumerate() {
        let record = record
            .with_context(|| format!("Malformed row {} in {}", line + 2, path.display()))?;
        let Some(disease) = record.get(disease_idx).filter(|d| !d.trim().is_empty()) else {
            continue;
        };
        let values = value_idx.iter().filter_map(|i| record.get(*i));
        store.insert(layout.kind, disease, values);
        rows += 1;
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_precautions_layout_with_index_column() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "p.csv",
            ",Disease,Precaution_1,Precaution_2,Precaution_3,Precaution_4\n\
             0,Flu,rest,,drink fluids,\n",
        );
        let mut store = ReferenceStore::new();
        let rows =
            load_reference_table(&tmp.path().join("p.csv"), &TABLES[1], &mut store).unwrap();
        assert_eq!(rows, 1);
        assert_eq!(
            store.enrich("Flu").precautions,
            vec!["rest".to_string(), "drink fluids".to_string()]
        );
    }

    #[test]
    fn test_quoted_fields_and_lowercase_headers() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "w.csv",
            "Unnamed: 0,disease,workout\n0,Flu,\"Rest, then walk\"\n1,Flu,Hydrate\n",
        );
        let mut store = ReferenceStore::new();
        load_reference_table(&tmp.path().join("w.csv"), &TABLES[4], &mut store).unwrap();
        assert_eq!(store.enrich("Flu").workout, vec!["Rest, then walk", "Hydrate"]);
    }

    #[test]
    fn test_missing_column_names_file() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "d.csv", "Name,Text\nFlu,Viral\n");
        let mut store = ReferenceStore::new();
        let err = load_reference_table(&tmp.path().join("d.csv"), &TABLES[0], &mut store)
            .unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("Disease"));
        assert!(msg.contains("d.csv"));
    }

    #[test]
    fn test_locate_asset_dir_search_order() {
        let tmp = TempDir::new().unwrap();
        let secondary = tmp.path().join("secondary");
        fs::create_dir_all(&secondary).unwrap();
        let assets = AssetsConfig {
            search_dirs: vec![tmp.path().join("primary"), secondary.clone(), tmp.path().into()],
            ..Default::default()
        };
        assert_eq!(locate_asset_dir(&assets).unwrap(), secondary);

        let none = AssetsConfig {
            search_dirs: vec![tmp.path().join("nope")],
            ..Default::default()
        };
        assert!(locate_asset_dir(&none)
            .unwrap_err()
            .to_string()
            .contains("nope"));
    }

    #[test]
    fn test_catalog_override_parses_integer_keys() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "c.json", r#"{"7": "Flu", "42": "Cold"}"#);
        let catalog = load_catalog(&tmp.path().join("c.json")).unwrap();
        assert_eq!(catalog.name(42), Some("Cold"));

        write(tmp.path(), "bad.json", r#"{"seven": "Flu"}"#);
        assert!(load_catalog(&tmp.path().join("bad.json")).is_err());
    }

    #[test]
    fn test_vocabulary_override() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "v.json", r#"{"cough": 1, "fever": 0}"#);
        let vocab = load_vocabulary(&tmp.path().join("v.json")).unwrap();
        assert_eq!(vocab.all_symptoms(), &["fever", "cough"]);
    }
}
