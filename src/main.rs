//! # medpredict CLI
//!
//! ```bash
//! medpredict --config ./config/medpredict.toml <command>
//! ```
//!
//! | Command | Description |
//! |---------|-------------|
//! | `medpredict init` | Create the audit database schema |
//! | `medpredict check` | Load all assets and print a summary |
//! | `medpredict predict <symptom>...` | Predict a disease from symptoms |
//! | `medpredict validate <symptom>...` | Check symptom names, with suggestions |
//! | `medpredict symptoms list` | List known symptoms |
//! | `medpredict symptoms search <query>` | Substring search over symptoms |
//! | `medpredict diseases` | List known diseases |
//! | `medpredict history --user <id>` | Recent predictions for a user |
//! | `medpredict serve` | Start the HTTP API |
//!
//! `predict` exits with status 2 when the prediction does not succeed, so
//! scripts can tell an unrecognized-symptom result from a startup error
//! (status 1).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use medpredict::{config, history, migrate, predict, server, symptoms, telemetry};

/// Symptom-based disease prediction with reference-data enrichment.
///
/// All commands read a TOML configuration file. See
/// `config/medpredict.example.toml` for every key.
#[derive(Parser)]
#[command(name = "medpredict", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/medpredict.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the audit database schema. Safe to run repeatedly.
    Init,

    /// Load every asset file and print a summary. Fails on the first
    /// missing or malformed file.
    Check,

    /// Predict a disease from one or more symptom names.
    Predict {
        /// Symptom names, e.g. `itching skin_rash`.
        #[arg(required = true)]
        symptoms: Vec<String>,

        /// Print the full result as JSON.
        #[arg(long)]
        json: bool,

        /// Record the prediction under this user id (default: anonymous).
        #[arg(long)]
        user: Option<String>,

        /// Do not write to the audit log.
        #[arg(long)]
        no_log: bool,
    },

    /// Check symptom names against the vocabulary without predicting.
    Validate {
        #[arg(required = true)]
        symptoms: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Inspect the symptom vocabulary.
    Symptoms {
        #[command(subcommand)]
        action: SymptomsAction,
    },

    /// List every disease the model can predict.
    Diseases,

    /// Show recent predictions recorded for a user, newest first.
    History {
        #[arg(long)]
        user: String,

        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP API.
    Serve,
}

#[derive(Subcommand)]
enum SymptomsAction {
    /// List all symptoms alphabetically.
    List,
    /// Case-insensitive substring search.
    Search {
        query: String,

        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    telemetry::init_tracing(&cfg.logging.filter);

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Check => {
            symptoms::run_check(&cfg)?;
        }
        Commands::Predict {
            symptoms,
            json,
            user,
            no_log,
        } => {
            let ok = predict::run_predict(&cfg, &symptoms, json, user.as_deref(), no_log).await?;
            if !ok {
                std::process::exit(2);
            }
        }
        Commands::Validate { symptoms, json } => {
            predict::run_validate(&cfg, &symptoms, json)?;
        }
        Commands::Symptoms { action } => match action {
            SymptomsAction::List => symptoms::run_symptoms_list(&cfg)?,
            SymptomsAction::Search { query, limit } => {
                symptoms::run_symptoms_search(&cfg, &query, limit)?
            }
        },
        Commands::Diseases => {
            symptoms::run_diseases(&cfg)?;
        }
        Commands::History { user, limit, json } => {
            history::run_history(&cfg, &user, limit, json).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
