#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Four symptoms, three diseases. `itching`/`skin_rash` score for label 0,
/// `high_fever` for 2, `headache` for 1.
pub const VOCABULARY: &str = r#"{"itching": 0, "skin_rash": 1, "high_fever": 2, "headache": 3}"#;

pub const CATALOG: &str = r#"{"0": "Fungal infection", "1": "Migraine", "2": "Malaria"}"#;

pub const MODEL: &str = r#"{
  "kind": "linear_ovr",
  "n_features": 4,
  "labels": [0, 1, 2],
  "weights": [[1.0, 1.0, 0.0, 0.0], [0.0, 0.0, 0.0, 1.0], [0.0, 0.0, 1.0, 0.0]],
  "intercepts": [0.0, 0.0, 0.0],
  "metadata": {"algorithm": "linear", "version": "2.1.0"}
}"#;

/// Always answers label 7, which the catalog does not know.
pub const SKEWED_MODEL: &str = r#"{
  "kind": "linear_ovr",
  "n_features": 4,
  "labels": [0, 7],
  "weights": [[0.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0]],
  "intercepts": [0.0, 5.0]
}"#;

pub fn write_assets(dir: &Path, model: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join("vocabulary.json"), VOCABULARY).unwrap();
    fs::write(dir.join("catalog.json"), CATALOG).unwrap();
    fs::write(dir.join("model.json"), model).unwrap();
    fs::write(
        dir.join("description.csv"),
        "Disease,Description\n\
         Fungal infection,Fungal infection is a common skin condition caused by fungi.\n\
         Migraine,A migraine is a headache that can cause severe throbbing pain.\n",
    )
    .unwrap();
    fs::write(
        dir.join("precautions_df.csv"),
        ",Disease,Precaution_1,Precaution_2,Precaution_3,Precaution_4\n\
         0,Fungal infection,bath twice,use detol or neem in bathing water,keep infected area dry,use clean cloths\n\
         1,Migraine,meditation,reduce stress,,\n",
    )
    .unwrap();
    fs::write(
        dir.join("medications.csv"),
        "Disease,Medication\n\
         Fungal infection,\"['Antifungal Cream', 'Fluconazole']\"\n",
    )
    .unwrap();
    fs::write(
        dir.join("diets.csv"),
        "Disease,Diet\nFungal infection,\"['Antifungal Diet', 'Probiotics']\"\n",
    )
    .unwrap();
    fs::write(
        dir.join("workout_df.csv"),
        "Unnamed: 0,disease,workout\n\
         0,Fungal infection,Avoid sugary foods\n\
         1,Fungal infection,Consume probiotics\n",
    )
    .unwrap();
}

pub fn config_toml(root: &Path, bind: &str) -> String {
    format!(
        r#"[assets]
search_dirs = ["{root}/backend/ml_assets", "{root}/ml_assets"]
vocabulary = "vocabulary.json"
catalog = "catalog.json"

[db]
path = "{root}/data/medpredict.sqlite"

[server]
bind = "{bind}"

[api]
max_symptoms = 3
"#,
        root = root.display(),
        bind = bind
    )
}

/// Temp project with assets under `ml_assets/` and a config file.
pub fn setup_project(model: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();
    write_assets(&root.join("ml_assets"), model);

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("medpredict.toml");
    fs::write(&config_path, config_toml(&root, "127.0.0.1:0")).unwrap();

    (tmp, config_path)
}
