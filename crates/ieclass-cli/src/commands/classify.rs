//! Classification commands (classify, parse, learn)

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use ieclass_core::{
    extract_line, AIClient, Database, ExternalClassifier, HybridClassifier, ParsingStats,
    Resolution, ResolutionMethod, Resolver,
};
use tracing::debug;

use super::{load_heuristic, parse_label};

/// Options shared by `classify` and `parse`
pub struct ResolveOptions<'a> {
    pub hint: Option<&'a str>,
    /// Store heuristic/external labels as new rules
    pub learn: bool,
    pub json: bool,
    pub heuristic_config: Option<&'a Path>,
    pub external: Option<AIClient>,
}

/// Build a resolver over `db` with the heuristic and any configured external classifier
pub fn build_resolver(db: &Database, opts: &ResolveOptions<'_>) -> Result<Resolver> {
    let hybrid = Arc::new(HybridClassifier::new(Arc::new(db.clone())));
    let heuristic = load_heuristic(opts.heuristic_config)?;

    let mut resolver = Resolver::new(hybrid)
        .with_heuristic(heuristic)
        .with_learning(opts.learn);

    match &opts.external {
        Some(client) => {
            debug!(model = %client.model(), host = %client.host(), "External classifier enabled");
            resolver = resolver.with_external(Arc::new(client.clone()));
        }
        None => debug!("No external classifier configured"),
    }

    Ok(resolver)
}

fn method_icon(method: ResolutionMethod) -> &'static str {
    match method {
        ResolutionMethod::Exact => "📚",
        ResolutionMethod::Heuristic => "⚖️ ",
        ResolutionMethod::External => "🤖",
        ResolutionMethod::Unresolved => "❓",
    }
}

fn print_resolution(r: &Resolution) {
    let label = match r.ie_type {
        Some(t) => format!("{} ({})", t, t.category_label()),
        None => "unknown".to_string(),
    };
    let detail = match (&r.category, &r.matched_keyword) {
        (Some(c), Some(k)) => format!(" [{}, keyword '{}']", c, k),
        (Some(c), None) => format!(" [{}]", c),
        (None, Some(k)) => format!(" [keyword '{}']", k),
        (None, None) => String::new(),
    };
    let learned = if r.learned { " 🎓 learned" } else { "" };

    println!(
        "   {} {:<20} {:>14}  {} via {} ({:.2}){}{}",
        method_icon(r.method),
        super::truncate(&r.field, 20),
        r.amount,
        label,
        r.method,
        r.confidence,
        detail,
        learned
    );
}

fn print_stats(stats: &ParsingStats) {
    println!();
    println!("📊 Statistics");
    println!("   ─────────────────────────────");
    println!("   Items processed: {}", stats.total_processed);
    println!(
        "   Exact rule hits: {} ({:.1}%)",
        stats.exact_success,
        stats.exact_match_rate * 100.0
    );
    println!(
        "   Fallbacks:       {} ({:.1}%)",
        stats.fallback,
        stats.fallback_rate * 100.0
    );
    println!("   Keywords learned: {}", stats.learned_keywords);
}

pub async fn cmd_classify(db: &Database, line: &str, opts: &ResolveOptions<'_>) -> Result<()> {
    let (field, amount) = extract_line(line)
        .with_context(|| format!("No '<field>: <amount>' item found in: {}", line))?;

    let resolver = build_resolver(db, opts)?;
    let resolution = resolver.resolve_item(&field, &amount, opts.hint).await?;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&resolution)?);
        return Ok(());
    }

    println!();
    print_resolution(&resolution);
    if resolution.method == ResolutionMethod::Unresolved {
        println!();
        println!("   💡 Tip: Set OLLAMA_HOST to ask a local model, or add a rule:");
        println!("      ieclass learn \"{}\" income|expense", field);
    }
    println!();

    Ok(())
}

pub async fn cmd_parse(db: &Database, file: &Path, opts: &ResolveOptions<'_>) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let resolver = build_resolver(db, opts)?;
    let resolutions = resolver.resolve_document(&text, opts.hint).await?;
    let stats = resolver.hybrid().get_statistics();

    if opts.json {
        let output = serde_json::json!({
            "items": resolutions,
            "stats": stats,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if resolutions.is_empty() {
        println!("No '<field>: <amount>' items found in {}", file.display());
        return Ok(());
    }

    println!();
    println!("🧾 {} ({} items)", file.display(), resolutions.len());
    println!("   ─────────────────────────────────────────────────────────────");
    for r in &resolutions {
        print_resolution(r);
    }

    let unresolved = resolutions
        .iter()
        .filter(|r| r.method == ResolutionMethod::Unresolved)
        .count();
    if unresolved > 0 {
        println!();
        println!("⚠️  {} items could not be classified.", unresolved);
    }

    print_stats(&stats);
    println!();

    Ok(())
}

pub fn cmd_learn(db: &Database, field: &str, label: &str) -> Result<()> {
    let ie_type = parse_label(label)?;
    let hybrid = HybridClassifier::new(Arc::new(db.clone()));

    if hybrid.learn_from_external_result(field, ie_type)? {
        println!(
            "🎓 Learned '{}' → {}",
            ieclass_core::hybrid::core_keyword(field),
            ie_type
        );
    } else {
        println!(
            "   Keyword '{}' is already stored, nothing changed",
            ieclass_core::hybrid::core_keyword(field)
        );
    }

    Ok(())
}
