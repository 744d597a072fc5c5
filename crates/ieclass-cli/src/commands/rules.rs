//! Keyword rule management commands

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ieclass_core::{Database, ExactMatchClassifier, RuleStore};

use super::{load_heuristic, parse_label, truncate};

pub fn cmd_rules_list(db: &Database) -> Result<()> {
    let rules = db.get_all_rules()?;

    if rules.is_empty() {
        println!("No rules found. Run 'ieclass init --seed' to add default keywords.");
        return Ok(());
    }

    println!();
    println!("📚 Keyword Rules ({})", rules.len());
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {:>4}  {:<24} {:<8} Added", "ID", "Keyword", "Type");

    for rule in &rules {
        println!(
            "   {:>4}  {:<24} {:<8} {}",
            rule.id,
            truncate(&rule.keyword, 24),
            rule.ie_type,
            rule.created_at.format("%Y-%m-%d")
        );
    }

    let counts = db.count_rules()?;
    println!();
    println!(
        "   Income: {}   Expense: {}",
        counts.income, counts.expense
    );

    Ok(())
}

pub fn cmd_rules_add(db: &Database, keyword: &str, label: &str) -> Result<()> {
    let ie_type = parse_label(label)?;

    if db.save_keyword(keyword, ie_type)? {
        println!("✅ Added rule '{}' → {}", keyword.trim(), ie_type);
    } else {
        let existing = db.find_by_keyword(keyword.trim())?;
        match existing {
            Some(t) => println!("   Keyword '{}' already stored as {}", keyword.trim(), t),
            None => println!("   Keyword '{}' already stored", keyword.trim()),
        }
    }

    Ok(())
}

/// Show the exact-match verdict and heuristic scores for a field
pub fn cmd_rules_test(
    db: &Database,
    field: &str,
    hint: Option<&str>,
    heuristic_config: Option<&Path>,
) -> Result<()> {
    let exact = ExactMatchClassifier::new(Arc::new(db.clone()));
    let heuristic = load_heuristic(heuristic_config)?;

    println!();
    println!("🔍 Testing field: {}", field);
    if let Some(h) = hint {
        println!("   Hint: {}", h);
    }
    println!("   ─────────────────────────────────────────────────────────────");

    let verdict = exact.classify(field, hint);
    match verdict.ie_type {
        Some(t) => println!(
            "   📚 Exact:     {} (keyword '{}')",
            t,
            verdict.matched_keyword()
        ),
        None => println!("   📚 Exact:     no stored keyword matches"),
    }

    let scores = heuristic.score(field, hint);
    println!(
        "   ⚖️  Heuristic: income {:.2} {:?}, expense {:.2} {:?}",
        scores.income_score, scores.income_matches, scores.expense_score, scores.expense_matches
    );

    let decision = heuristic.classify(field, hint);
    match decision.ie_type {
        Some(t) => println!(
            "      → {} (confidence {:.2}, threshold {:.2})",
            t,
            decision.confidence,
            heuristic.config().threshold
        ),
        None => println!(
            "      → undecided (best {:.2}, threshold {:.2})",
            decision.confidence,
            heuristic.config().threshold
        ),
    }
    println!();

    Ok(())
}

pub fn cmd_rules_export(db: &Database, file: &Path) -> Result<()> {
    let out = File::create(file).with_context(|| format!("Failed to create {}", file.display()))?;
    let count = db.export_rules_csv(out)?;
    println!("✅ Exported {} rules to {}", count, file.display());
    Ok(())
}

pub fn cmd_rules_import(db: &Database, file: &Path) -> Result<()> {
    let input = File::open(file).with_context(|| format!("Failed to open {}", file.display()))?;
    let stats = db
        .import_rules_csv(input)
        .with_context(|| format!("Failed to import rules from {}", file.display()))?;

    println!(
        "✅ Imported {} rules ({} already present)",
        stats.inserted, stats.skipped
    );
    Ok(())
}
