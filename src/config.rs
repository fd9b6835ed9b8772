//! TOML configuration.
//!
//! ```toml
//! [assets]
//! search_dirs = ["./backend/ml_assets", "./ml_assets", "."]
//! model = "model.json"
//!
//! [db]
//! path = "./data/medpredict.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:5000"
//! ```
//!
//! Every key except `db.path` and `server.bind` has a default. See
//! [`load_config`] for validation rules.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub assets: AssetsConfig,
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where startup assets live and what they are called.
///
/// `search_dirs` is tried in order; the first directory that exists is the
/// asset directory. All required files must then be present in it.
#[derive(Debug, Deserialize, Clone)]
pub struct AssetsConfig {
    #[serde(default = "default_search_dirs")]
    pub search_dirs: Vec<PathBuf>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_precautions")]
    pub precautions: String,
    #[serde(default = "default_medications")]
    pub medications: String,
    #[serde(default = "default_diet")]
    pub diet: String,
    #[serde(default = "default_workout")]
    pub workout: String,
    /// Optional JSON `{ "symptom": index, ... }`; built-in list when absent.
    #[serde(default)]
    pub vocabulary: Option<String>,
    /// Optional JSON `{ "label": "Disease", ... }`; built-in list when absent.
    #[serde(default)]
    pub catalog: Option<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            search_dirs: default_search_dirs(),
            model: default_model(),
            description: default_description(),
            precautions: default_precautions(),
            medications: default_medications(),
            diet: default_diet(),
            workout: default_workout(),
            vocabulary: None,
            catalog: None,
        }
    }
}

fn default_search_dirs() -> Vec<PathBuf> {
    vec![
        PathBuf::from("./backend/ml_assets"),
        PathBuf::from("./ml_assets"),
        PathBuf::from("."),
    ]
}
fn default_model() -> String {
    "model.json".to_string()
}
fn default_description() -> String {
    "description.csv".to_string()
}
fn default_precautions() -> String {
    "precautions_df.csv".to_string()
}
fn default_medications() -> String {
    "medications.csv".to_string()
}
fn default_diet() -> String {
    "diets.csv".to_string()
}
fn default_workout() -> String {
    "workout_df.csv".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

/// Request limits enforced by the HTTP layer.
#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_max_symptoms")]
    pub max_symptoms: usize,
    #[serde(default = "default_search_limit")]
    pub search_default_limit: usize,
    #[serde(default = "default_search_max_limit")]
    pub search_max_limit: usize,
    #[serde(default = "default_search_min_query_len")]
    pub search_min_query_len: usize,
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    #[serde(default = "default_history_limit")]
    pub history_default_limit: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_symptoms: default_max_symptoms(),
            search_default_limit: default_search_limit(),
            search_max_limit: default_search_max_limit(),
            search_min_query_len: default_search_min_query_len(),
            suggestion_limit: default_suggestion_limit(),
            history_default_limit: default_history_limit(),
        }
    }
}

fn default_max_symptoms() -> usize {
    20
}
fn default_search_limit() -> usize {
    10
}
fn default_search_max_limit() -> usize {
    50
}
fn default_search_min_query_len() -> usize {
    2
}
fn default_suggestion_limit() -> usize {
    3
}
fn default_history_limit() -> usize {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive. `MEDPREDICT_LOG` wins.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.assets.search_dirs.is_empty() {
        anyhow::bail!("assets.search_dirs must list at least one directory");
    }

    let api = &config.api;
    if api.max_symptoms == 0 {
        anyhow::bail!("api.max_symptoms must be >= 1");
    }
    if api.search_max_limit == 0 {
        anyhow::bail!("api.search_max_limit must be >= 1");
    }
    if api.search_default_limit > api.search_max_limit {
        anyhow::bail!(
            "api.search_default_limit ({}) must not exceed api.search_max_limit ({})",
            api.search_default_limit,
            api.search_max_limit
        );
    }
    if api.history_default_limit == 0 {
        anyhow::bail!("api.history_default_limit must be >= 1");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    const MINIMAL: &str = r#"
[db]
path = "./data/medpredict.sqlite"

[server]
bind = "127.0.0.1:5000"
"#;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = parse(MINIMAL).unwrap();
        assert_eq!(config.assets.search_dirs.len(), 3);
        assert_eq!(config.assets.model, "model.json");
        assert_eq!(config.assets.workout, "workout_df.csv");
        assert!(config.assets.vocabulary.is_none());
        assert_eq!(config.api.max_symptoms, 20);
        assert_eq!(config.api.search_max_limit, 50);
        assert_eq!(config.logging.filter, "info");
        assert!(config.server.cors_origins.is_empty());
    }

    #[test]
    fn test_rejects_empty_search_dirs() {
        let toml_str = format!("{}\n[assets]\nsearch_dirs = []\n", MINIMAL);
        let err = parse(&toml_str).unwrap_err();
        assert!(err.to_string().contains("search_dirs"));
    }

    #[test]
    fn test_rejects_inverted_search_limits() {
        let toml_str = format!(
            "{}\n[api]\nsearch_default_limit = 60\nsearch_max_limit = 50\n",
            MINIMAL
        );
        let err = parse(&toml_str).unwrap_err();
        assert!(err.to_string().contains("search_default_limit"));
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = load_config(Path::new("/nonexistent/medpredict.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/medpredict.toml"));
    }
}
