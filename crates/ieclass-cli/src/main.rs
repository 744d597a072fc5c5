//! ieclass CLI - Income/expense classifier for financial line items
//!
//! Usage:
//!   ieclass init --seed                 Initialize database with default rules
//!   ieclass classify "급여: 3,000,000원"  Classify one line
//!   ieclass parse --file slip.txt       Classify a whole document
//!   ieclass rules list                  Show stored keyword rules

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use commands::ResolveOptions;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let heuristic_config = cli.heuristic_config.as_deref();

    match cli.command {
        Commands::Init { seed } => commands::cmd_init(&cli.db, seed, heuristic_config),
        Commands::Classify {
            line,
            hint,
            no_learn,
            json,
        } => {
            let db = commands::open_db(&cli.db)?;
            let opts = ResolveOptions {
                hint: hint.as_deref(),
                learn: !no_learn,
                json,
                heuristic_config,
                external: ieclass_core::AIClient::from_env(),
            };
            commands::cmd_classify(&db, &line, &opts).await
        }
        Commands::Parse {
            file,
            hint,
            no_learn,
            json,
        } => {
            let db = commands::open_db(&cli.db)?;
            let opts = ResolveOptions {
                hint: hint.as_deref(),
                learn: !no_learn,
                json,
                heuristic_config,
                external: ieclass_core::AIClient::from_env(),
            };
            commands::cmd_parse(&db, &file, &opts).await
        }
        Commands::Learn { field, label } => {
            let db = commands::open_db(&cli.db)?;
            commands::cmd_learn(&db, &field, &label)
        }
        Commands::Rules { action } => {
            let db = commands::open_db(&cli.db)?;
            match action {
                None | Some(RulesAction::List) => commands::cmd_rules_list(&db),
                Some(RulesAction::Add { keyword, label }) => {
                    commands::cmd_rules_add(&db, &keyword, &label)
                }
                Some(RulesAction::Test { field, hint }) => {
                    commands::cmd_rules_test(&db, &field, hint.as_deref(), heuristic_config)
                }
                Some(RulesAction::Export { file }) => commands::cmd_rules_export(&db, &file),
                Some(RulesAction::Import { file }) => commands::cmd_rules_import(&db, &file),
            }
        }
        Commands::Status => {
            commands::cmd_status(&cli.db, heuristic_config, ieclass_core::AIClient::from_env())
                .await
        }
    }
}
