//! Status command implementation

use std::path::Path;

use anyhow::Result;
use ieclass_core::heuristic::default_config_path;
use ieclass_core::{AIClient, ExternalClassifier};

use super::open_db;

pub async fn cmd_status(
    db_path: &Path,
    heuristic_config: Option<&Path>,
    external: Option<AIClient>,
) -> Result<()> {
    println!();
    println!("📊 ieclass Status");
    println!("   ─────────────────────────────────────────────────────────────");

    // Database path
    println!("   Database: {}", db_path.display());

    if db_path.exists() {
        if let Ok(metadata) = std::fs::metadata(db_path) {
            let size_kb = metadata.len() as f64 / 1024.0;
            if size_kb < 1024.0 {
                println!("   Size: {:.1} KB", size_kb);
            } else {
                println!("   Size: {:.1} MB", size_kb / 1024.0);
            }
        }

        match open_db(db_path).and_then(|db| Ok(db.count_rules()?)) {
            Ok(counts) => {
                println!();
                println!("   Rules: {}", counts.total());
                println!("     Income:  {}", counts.income);
                println!("     Expense: {}", counts.expense);
            }
            Err(e) => {
                println!();
                println!("   ❌ Error opening database: {}", e);
            }
        }
    } else {
        println!("   Size: (database not initialized)");
    }

    // Which heuristic tables would be used
    println!();
    let override_path = heuristic_config
        .map(Path::to_path_buf)
        .or_else(default_config_path)
        .filter(|p| p.exists());
    match override_path {
        Some(p) => println!("   Heuristic tables: {}", p.display()),
        None => println!("   Heuristic tables: built-in"),
    }

    match external {
        Some(client) => {
            let healthy = client.health_check().await;
            let icon = if healthy { "✅" } else { "❌" };
            println!(
                "   {} External classifier: {} at {}{}",
                icon,
                client.model(),
                client.host(),
                if healthy { "" } else { " (unreachable)" }
            );
        }
        None => {
            println!("   External classifier: not configured");
            println!("      Set OLLAMA_HOST (or AI_BACKEND=mock) to enable");
        }
    }

    println!();
    Ok(())
}
