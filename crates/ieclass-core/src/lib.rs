//! ieclass Core Library
//!
//! Income/expense classification for line items of Korean financial
//! documents:
//! - Amount and field extraction from `"<field>: <amount>"` lines
//! - Exact-match classifier over a learnable SQLite keyword store
//! - Weighted heuristic classifier with TOML-configured keyword tiers
//! - Hybrid orchestrator with learn-back and statistics
//! - Pluggable external classifier backends (Ollama, mock)
//! - Resolver chaining all of the above

pub mod ai;
pub mod db;
pub mod error;
pub mod exact;
pub mod extract;
pub mod heuristic;
pub mod hybrid;
pub mod models;
pub mod resolver;
pub mod store;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{AIClient, ExternalClassifier, MockBackend, OllamaBackend};
pub use db::{Database, ImportStats};
pub use error::{Error, Result};
pub use exact::ExactMatchClassifier;
pub use extract::{extract_amount, extract_field_name, extract_line};
pub use heuristic::{HeuristicClassifier, HeuristicConfig, HeuristicScores, KeywordTier};
pub use hybrid::{ClassificationMetadata, HybridClassifier, ItemClassification, Method, ParsingStats};
pub use models::{Classification, IeType, KeywordRule, ParsedTransaction, RuleCounts};
pub use resolver::{Resolution, ResolutionMethod, Resolver};
pub use store::RuleStore;
