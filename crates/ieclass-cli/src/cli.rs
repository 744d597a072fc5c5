//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ieclass - Classify financial line items as income or expense
#[derive(Parser)]
#[command(name = "ieclass")]
#[command(about = "Income/expense classifier for financial document line items", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Database path
    #[arg(long, env = "IECLASS_DB", default_value = "ieclass.db", global = true)]
    pub db: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Heuristic keyword table (defaults to the data dir override, then built-in)
    #[arg(long, global = true)]
    pub heuristic_config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database
    Init {
        /// Seed the rule store with the heuristic tier keywords
        #[arg(long)]
        seed: bool,
    },

    /// Classify a single "<field>: <amount>" line
    Classify {
        /// Line to classify, e.g. "급여: 3,000,000원"
        line: String,

        /// Document type hint (e.g. 소득, 지출, income, expense)
        #[arg(long)]
        hint: Option<String>,

        /// Don't store fallback labels as new rules
        #[arg(long)]
        no_learn: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Classify every line of a text document
    Parse {
        /// Text file with one "<field>: <amount>" item per line
        #[arg(short, long)]
        file: PathBuf,

        /// Document type hint (e.g. 소득, 지출, income, expense)
        #[arg(long)]
        hint: Option<String>,

        /// Don't store fallback labels as new rules
        #[arg(long)]
        no_learn: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store a field as a keyword rule with the given label
    Learn {
        /// Field name (stored trimmed and lower-cased)
        field: String,

        /// Label: income, expense, 소득 or 지출
        label: String,
    },

    /// Manage keyword rules
    Rules {
        #[command(subcommand)]
        action: Option<RulesAction>,
    },

    /// Show rule counts and external classifier health
    Status,
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// List all keyword rules
    List,

    /// Add a keyword rule
    Add {
        /// Keyword to match by containment
        keyword: String,

        /// Label: income, expense, 소득 or 지출
        label: String,
    },

    /// Show how a field name is scored without storing anything
    Test {
        /// Field name to test
        field: String,

        /// Document type hint
        #[arg(long)]
        hint: Option<String>,
    },

    /// Export rules to CSV
    Export {
        /// Output file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Import rules from CSV (keyword,ie_type columns)
    Import {
        /// Input file
        #[arg(short, long)]
        file: PathBuf,
    },
}
