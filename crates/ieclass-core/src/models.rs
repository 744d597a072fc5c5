//! Data models for ieclass

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Income/expense label attached to a line item or keyword rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IeType {
    Income,
    Expense,
}

impl IeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    /// Display category used in orchestrator results ("소득" / "지출")
    pub fn category_label(&self) -> &'static str {
        match self {
            Self::Income => "소득",
            Self::Expense => "지출",
        }
    }
}

impl std::fmt::Display for IeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::str::FromStr for IeType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "소득" => Ok(Self::Income),
            "expense" | "지출" => Ok(Self::Expense),
            _ => Err(format!("Unknown income/expense type: {}", s)),
        }
    }
}

/// Outcome of a single classifier call
///
/// `ie_type` is `None` when the classifier could not reach a verdict
/// (an "unknown" result that signals the caller to fall back).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub ie_type: Option<IeType>,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Keywords that produced the verdict, in match order
    pub matched_keywords: Vec<String>,
    /// Category of the matched tier, when the classifier knows one
    pub category: Option<String>,
}

impl Classification {
    /// Unknown verdict carrying the best score seen
    pub fn unknown(confidence: f64) -> Self {
        Self {
            ie_type: None,
            confidence,
            matched_keywords: Vec::new(),
            category: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.ie_type.is_none()
    }

    /// First matched keyword, or "" for an unknown verdict
    pub fn matched_keyword(&self) -> &str {
        self.matched_keywords
            .first()
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// A line item successfully parsed and classified
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedTransaction {
    /// Item label (trimmed, underscores replaced with spaces)
    pub field_name: String,
    /// Amount as a digit string without separators
    pub amount: String,
    pub transaction_type: IeType,
    pub confidence: f64,
    pub matched_keywords: Vec<String>,
    pub category: Option<String>,
}

impl ParsedTransaction {
    /// First matched keyword (the single keyword for exact-match verdicts)
    pub fn matched_keyword(&self) -> &str {
        self.matched_keywords
            .first()
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// A persisted keyword rule (ie_rule row)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordRule {
    pub id: i64,
    pub ie_type: IeType,
    /// Globally unique across both types
    pub keyword: String,
    pub created_at: DateTime<Utc>,
}

/// Keyword counts in an exact-match snapshot or in the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuleCounts {
    pub income: usize,
    pub expense: usize,
}

impl RuleCounts {
    pub fn total(&self) -> usize {
        self.income + self.expense
    }
}
