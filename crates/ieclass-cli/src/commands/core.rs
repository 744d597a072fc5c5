//! Core command implementations and shared utilities
//!
//! This module contains:
//! - `open_db` - Shared utility to open the database
//! - `load_heuristic` - Resolve and load the heuristic keyword tables
//! - `parse_label` - Parse an income/expense label argument
//! - `cmd_init` - Initialize the database

use std::path::Path;

use anyhow::{Context, Result};
use ieclass_core::{Database, HeuristicClassifier, HeuristicConfig, IeType, RuleStore};

/// Open (or create) the rule database
pub fn open_db(db_path: &Path) -> Result<Database> {
    let path_str = db_path
        .to_str()
        .context("Database path is not valid UTF-8")?;
    Database::new(path_str).context("Failed to open database")
}

/// Load heuristic tables from an explicit path, the data dir override, or the built-in defaults
pub fn load_heuristic(config_path: Option<&Path>) -> Result<HeuristicClassifier> {
    if let Some(path) = config_path {
        if !path.exists() {
            anyhow::bail!("Heuristic config not found: {}", path.display());
        }
    }
    let config = HeuristicConfig::load(config_path).context("Failed to load heuristic config")?;
    Ok(HeuristicClassifier::with_config(config))
}

/// Parse a label argument (income, expense, 소득, 지출)
pub fn parse_label(label: &str) -> Result<IeType> {
    label.parse().map_err(|e: String| anyhow::anyhow!(e))
}

pub fn cmd_init(db_path: &Path, seed: bool, heuristic_config: Option<&Path>) -> Result<()> {
    println!("🔧 Initializing database at {}...", db_path.display());

    let db = open_db(db_path)?;

    if seed {
        let heuristic = load_heuristic(heuristic_config)?;
        let stats = db
            .seed_keywords(heuristic.config().tier_keywords())
            .context("Failed to seed keyword rules")?;
        println!(
            "   Seeded {} keyword rules ({} already present)",
            stats.inserted, stats.skipped
        );
    }

    let rules = db.get_all_rules()?;
    println!("   Rules stored: {}", rules.len());

    println!("✅ Database initialized successfully!");
    println!();
    println!("Next steps:");
    if rules.is_empty() {
        println!("  1. Seed default rules: ieclass init --seed");
    } else {
        println!("  1. Review rules: ieclass rules list");
    }
    println!("  2. Classify a line: ieclass classify \"급여: 3,000,000원\"");

    Ok(())
}
