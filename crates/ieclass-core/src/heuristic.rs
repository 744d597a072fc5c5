//! Weighted heuristic income/expense classifier
//!
//! Scores a field name against tiered keyword tables for both sides, adds a
//! bonus when the document type hint names a side, applies forced-expense
//! overrides, and only returns a verdict when the winning score is strictly
//! higher than the other side and reaches the threshold.
//!
//! ## Configuration Resolution
//!
//! Tables are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/ieclass/config/heuristic.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::extract::{extract_amount, extract_field_name};
use crate::models::{Classification, IeType, ParsedTransaction};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/heuristic.toml");

pub const DEFAULT_THRESHOLD: f64 = 0.40;
pub const DEFAULT_HINT_BONUS: f64 = 0.20;
pub const DEFAULT_OVERRIDE_BONUS: f64 = 0.40;
pub const DEFAULT_EXEMPTION: &str = "공제대상";

/// Prefix recorded in expense matches for forced-override hits
pub const FORCED_PREFIX: &str = "forced:";

/// One confidence bucket of a keyword table
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordTier {
    /// Tier label, e.g. "very_high"
    pub tier: String,
    pub keywords: Vec<String>,
    pub weight: f64,
    #[serde(default)]
    pub category: Option<String>,
}

impl KeywordTier {
    pub fn new(tier: &str, weight: f64, category: Option<&str>, keywords: &[&str]) -> Self {
        Self {
            tier: tier.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            weight,
            category: category.map(str::to_string),
        }
    }
}

/// Scoring tables and constants for the heuristic classifier
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicConfig {
    /// Income tiers, most specific first
    pub income: Vec<KeywordTier>,
    /// Expense tiers, most specific first
    pub expense: Vec<KeywordTier>,
    pub threshold: f64,
    pub hint_bonus: f64,
    pub override_bonus: f64,
    /// Keywords that push a field toward expense
    pub forced_expense: Vec<String>,
    /// A field containing this substring is exempt from forced overrides
    pub exemption: String,
    /// Hint substrings that name the income side
    pub income_hints: Vec<String>,
    /// Hint substrings that name the expense side
    pub expense_hints: Vec<String>,
}

impl Default for HeuristicConfig {
    /// Scalars and hint markers only; tables are empty
    fn default() -> Self {
        Self {
            income: Vec::new(),
            expense: Vec::new(),
            threshold: DEFAULT_THRESHOLD,
            hint_bonus: DEFAULT_HINT_BONUS,
            override_bonus: DEFAULT_OVERRIDE_BONUS,
            forced_expense: Vec::new(),
            exemption: DEFAULT_EXEMPTION.to_string(),
            income_hints: vec!["income".to_string(), "소득".to_string()],
            expense_hints: vec!["expense".to_string(), "지출".to_string()],
        }
    }
}

impl HeuristicConfig {
    /// Load config (explicit path, then data dir override, then embedded)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path(),
        };

        let content = match path {
            Some(p) if p.exists() => {
                debug!(path = %p.display(), "Loading heuristic config override");
                fs::read_to_string(&p)
                    .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
            }
            _ => DEFAULT_CONFIG.to_string(),
        };

        parse_config(&content)
    }

    /// The tables compiled into the binary
    pub fn embedded() -> Result<Self> {
        parse_config(DEFAULT_CONFIG)
    }

    /// Every tier keyword with its side, for seeding the exact-match store
    pub fn tier_keywords(&self) -> Vec<(&str, IeType)> {
        let income = self
            .income
            .iter()
            .flat_map(|t| t.keywords.iter().map(|k| (k.as_str(), IeType::Income)));
        let expense = self
            .expense
            .iter()
            .flat_map(|t| t.keywords.iter().map(|k| (k.as_str(), IeType::Expense)));
        income.chain(expense).collect()
    }

    fn validate(&self) -> Result<()> {
        let check = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(Error::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, v
                )))
            }
        };

        check("threshold", self.threshold)?;
        check("hint_bonus", self.hint_bonus)?;
        check("override_bonus", self.override_bonus)?;

        for tier in self.income.iter().chain(self.expense.iter()) {
            check(format!("weight of tier '{}'", tier.tier).as_str(), tier.weight)?;
            if tier.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(Error::Config(format!(
                    "Tier '{}' has an empty keyword",
                    tier.tier
                )));
            }
        }

        if self.forced_expense.iter().any(|k| k.trim().is_empty()) {
            return Err(Error::Config("Empty forced_expense keyword".into()));
        }

        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("ieclass").join("config").join("heuristic.toml"))
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
struct RawConfig {
    scoring: Option<RawScoring>,
    hints: Option<RawHints>,
    overrides: Option<RawOverrides>,
    #[serde(default)]
    income: Vec<KeywordTier>,
    #[serde(default)]
    expense: Vec<KeywordTier>,
}

#[derive(Debug, Deserialize)]
struct RawScoring {
    threshold: Option<f64>,
    hint_bonus: Option<f64>,
    override_bonus: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawHints {
    income: Option<Vec<String>>,
    expense: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawOverrides {
    forced_expense: Option<Vec<String>>,
    exemption: Option<String>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<HeuristicConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid heuristic config TOML: {}", e)))?;

    let mut config = HeuristicConfig {
        income: raw.income,
        expense: raw.expense,
        ..Default::default()
    };

    if let Some(scoring) = raw.scoring {
        if let Some(threshold) = scoring.threshold {
            config.threshold = threshold;
        }
        if let Some(bonus) = scoring.hint_bonus {
            config.hint_bonus = bonus;
        }
        if let Some(bonus) = scoring.override_bonus {
            config.override_bonus = bonus;
        }
    }

    if let Some(hints) = raw.hints {
        if let Some(income) = hints.income {
            config.income_hints = income;
        }
        if let Some(expense) = hints.expense {
            config.expense_hints = expense;
        }
    }

    if let Some(overrides) = raw.overrides {
        if let Some(forced) = overrides.forced_expense {
            config.forced_expense = forced;
        }
        if let Some(exemption) = overrides.exemption {
            config.exemption = exemption;
        }
    }

    config.validate()?;
    Ok(config)
}

/// Raw per-side scores behind a heuristic verdict
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeuristicScores {
    pub income_score: f64,
    pub expense_score: f64,
    pub income_matches: Vec<String>,
    pub expense_matches: Vec<String>,
    /// Category of the first matched income tier that has one
    pub income_category: Option<String>,
}

/// Tiered, weighted keyword scorer
#[derive(Debug, Clone)]
pub struct HeuristicClassifier {
    config: HeuristicConfig,
}

impl HeuristicClassifier {
    /// Create with an explicit configuration
    pub fn with_config(mut config: HeuristicConfig) -> Self {
        // Matching is done against the lower-cased field
        for tier in config.income.iter_mut().chain(config.expense.iter_mut()) {
            for keyword in tier.keywords.iter_mut() {
                *keyword = keyword.to_lowercase();
            }
        }
        for keyword in config.forced_expense.iter_mut() {
            *keyword = keyword.to_lowercase();
        }
        config.exemption = config.exemption.to_lowercase();

        Self { config }
    }

    pub fn config(&self) -> &HeuristicConfig {
        &self.config
    }

    /// Score both sides without deciding
    pub fn score(&self, field_name: &str, doc_type_hint: Option<&str>) -> HeuristicScores {
        let config = &self.config;
        let field_lower = field_name.to_lowercase();
        let mut scores = HeuristicScores::default();

        for tier in &config.income {
            if let Some(keyword) = tier.keywords.iter().find(|k| field_lower.contains(k.as_str())) {
                scores.income_score += tier.weight;
                scores.income_matches.push(keyword.clone());
                if scores.income_category.is_none() {
                    scores.income_category = tier.category.clone();
                }
                debug!(
                    keyword = %keyword,
                    field = %field_name,
                    tier = %tier.tier,
                    weight = tier.weight,
                    "Income keyword match"
                );
            }
        }

        for tier in &config.expense {
            if let Some(keyword) = tier.keywords.iter().find(|k| field_lower.contains(k.as_str())) {
                scores.expense_score += tier.weight;
                scores.expense_matches.push(keyword.clone());
                debug!(
                    keyword = %keyword,
                    field = %field_name,
                    tier = %tier.tier,
                    weight = tier.weight,
                    "Expense keyword match"
                );
            }
        }

        if let Some(hint) = doc_type_hint {
            let hint_lower = hint.to_lowercase();
            let names = |markers: &[String]| {
                markers
                    .iter()
                    .any(|m| hint_lower.contains(m.to_lowercase().as_str()))
            };

            if names(config.income_hints.as_slice()) {
                scores.income_score += config.hint_bonus;
                debug!(hint = %hint, bonus = config.hint_bonus, "Document hint: income");
            } else if names(config.expense_hints.as_slice()) {
                scores.expense_score += config.hint_bonus;
                debug!(hint = %hint, bonus = config.hint_bonus, "Document hint: expense");
            }
        }

        // Every forced keyword present adds the full bonus again
        if !field_lower.contains(config.exemption.as_str()) {
            for keyword in &config.forced_expense {
                if field_lower.contains(keyword.as_str()) {
                    scores.expense_score += config.override_bonus;
                    scores
                        .expense_matches
                        .push(format!("{}{}", FORCED_PREFIX, keyword));
                    debug!(
                        keyword = %keyword,
                        field = %field_name,
                        bonus = config.override_bonus,
                        "Forced expense override"
                    );
                }
            }
        }

        scores
    }

    /// Classify a field name; `ie_type` is `None` when no side wins clearly
    ///
    /// Equal scores never produce a verdict, whatever their magnitude.
    pub fn classify(&self, field_name: &str, doc_type_hint: Option<&str>) -> Classification {
        let scores = self.score(field_name, doc_type_hint);
        let threshold = self.config.threshold;
        let (income, expense) = (scores.income_score, scores.expense_score);

        let verdict = if income > expense && income >= threshold {
            Classification {
                ie_type: Some(IeType::Income),
                confidence: income.min(1.0),
                matched_keywords: scores.income_matches,
                category: scores.income_category,
            }
        } else if expense > income && expense >= threshold {
            Classification {
                ie_type: Some(IeType::Expense),
                confidence: expense.min(1.0),
                matched_keywords: scores.expense_matches,
                category: None,
            }
        } else {
            debug!(
                field = %field_name,
                income = %format!("{:.2}", income),
                expense = %format!("{:.2}", expense),
                "Heuristic score below threshold or tied"
            );
            Classification::unknown(income.max(expense))
        };

        debug!(
            field = %field_name,
            ie_type = ?verdict.ie_type,
            confidence = %format!("{:.2}", verdict.confidence),
            "Heuristic verdict"
        );
        verdict
    }

    /// Parse a `"<field>: <amount>"` line and classify its field
    ///
    /// Returns `None` when extraction misses or the verdict is unknown.
    pub fn parse_line(&self, line: &str, doc_type_hint: Option<&str>) -> Option<ParsedTransaction> {
        let amount = extract_amount(line)?;
        let field_name = extract_field_name(line)?;

        let verdict = self.classify(&field_name, doc_type_hint);
        let transaction_type = verdict.ie_type?;

        Some(ParsedTransaction {
            field_name,
            amount,
            transaction_type,
            confidence: verdict.confidence,
            matched_keywords: verdict.matched_keywords,
            category: verdict.category,
        })
    }
}
