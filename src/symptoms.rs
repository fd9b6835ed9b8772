//! Listing commands: `symptoms list`, `symptoms search`, `diseases`, `check`.

use anyhow::{bail, Result};

use crate::assets;
use crate::config::Config;

pub fn run_symptoms_list(config: &Config) -> Result<()> {
    let (engine, _) = assets::load_engine(config)?;
    let mut symptoms = engine.all_symptoms();
    symptoms.sort_unstable();
    for s in &symptoms {
        println!("{}", s);
    }
    println!("\n{} symptoms", symptoms.len());
    Ok(())
}

pub fn run_symptoms_search(config: &Config, query: &str, limit: Option<usize>) -> Result<()> {
    let query = query.trim();
    let api = &config.api;
    if query.chars().count() < api.search_min_query_len {
        bail!(
            "Query must be at least {} characters long",
            api.search_min_query_len
        );
    }
    let limit = limit
        .unwrap_or(api.search_default_limit)
        .min(api.search_max_limit);

    let (engine, _) = assets::load_engine(config)?;
    let matches = engine.search(query, limit);
    if matches.is_empty() {
        println!("No matching symptoms.");
        return Ok(());
    }
    for s in matches {
        println!("{}", s);
    }
    Ok(())
}

pub fn run_diseases(config: &Config) -> Result<()> {
    let (engine, _) = assets::load_engine(config)?;
    let mut diseases = engine.all_diseases();
    diseases.sort_unstable();
    for d in &diseases {
        println!("{}", d.trim());
    }
    println!("\n{} diseases", diseases.len());
    Ok(())
}

/// Load every asset and print what was found.
pub fn run_check(config: &Config) -> Result<()> {
    let (_, summary) = assets::load_engine(config)?;

    println!("Assets OK");
    println!("  Directory:   {}", summary.asset_dir.display());
    println!("  Model:       {}", summary.model_kind);
    println!("  Symptoms:    {}", summary.symptoms);
    println!("  Diseases:    {}", summary.diseases);
    for (kind, rows) in &summary.table_rows {
        println!("  {:<12} {} rows", format!("{}:", kind), rows);
    }
    if !summary.unmapped_labels.is_empty() {
        println!(
            "  Warning: model labels missing from catalog: {:?}",
            summary.unmapped_labels
        );
    }
    Ok(())
}
