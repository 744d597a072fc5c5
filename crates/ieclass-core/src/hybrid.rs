//! Hybrid orchestrator: exact-match rules first, external fallback signalled
//!
//! Every item goes through the exact-match classifier. A miss is reported as
//! `needs_external` so the caller can ask a slower classifier, and the label
//! it returns can be fed back with [`HybridClassifier::learn_from_external_result`]
//! so the next occurrence of the same field is an exact hit.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::exact::ExactMatchClassifier;
use crate::models::IeType;
use crate::store::RuleStore;

/// Reason reported when the exact-match store has no keyword for a field
pub const NO_KEYWORD_REASON: &str = "no matching keyword in rule store";

/// How an item was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Stored keyword rule matched
    Exact,
    /// No rule matched; an external classifier is needed
    NeedsExternal,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Exact => "exact",
            Method::NeedsExternal => "needs_external",
        }
    }
}

/// Details attached to every orchestrator verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationMetadata {
    pub method: Method,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub original_field: String,
    pub amount: String,
}

/// Orchestrator verdict for one (field, amount) item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemClassification {
    pub ie_type: Option<IeType>,
    /// "소득" / "지출" on a hit
    pub category: Option<String>,
    pub metadata: ClassificationMetadata,
}

impl ItemClassification {
    pub fn is_hit(&self) -> bool {
        self.metadata.method == Method::Exact
    }
}

/// Counters snapshot with derived rates (all rates are 0.0 before any item)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ParsingStats {
    pub total_processed: u64,
    pub exact_success: u64,
    pub fallback: u64,
    pub learned_keywords: u64,
    pub exact_match_rate: f64,
    pub fallback_rate: f64,
    /// Share of items that never needed the external classifier
    pub cost_saving_rate: f64,
}

/// Exact-match-first classifier with learn-back
pub struct HybridClassifier {
    store: Arc<dyn RuleStore>,
    exact: ExactMatchClassifier,
    total: AtomicU64,
    exact_success: AtomicU64,
    fallback: AtomicU64,
    learned: AtomicU64,
}

impl HybridClassifier {
    /// Create an orchestrator over `store`, loading its keywords
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        let exact = ExactMatchClassifier::new(store.clone());
        Self {
            store,
            exact,
            total: AtomicU64::new(0),
            exact_success: AtomicU64::new(0),
            fallback: AtomicU64::new(0),
            learned: AtomicU64::new(0),
        }
    }

    /// The exact-match classifier this orchestrator consults
    pub fn exact(&self) -> &ExactMatchClassifier {
        &self.exact
    }

    /// Classify one item by stored keyword rules
    pub fn classify_item(
        &self,
        field_name: &str,
        amount: &str,
        doc_type_hint: Option<&str>,
    ) -> ItemClassification {
        self.total.fetch_add(1, Ordering::Relaxed);

        let line = synthetic_line(field_name, amount);
        match self.exact.parse_line(&line, doc_type_hint) {
            Some(parsed) => {
                self.exact_success.fetch_add(1, Ordering::Relaxed);
                info!(
                    field = %field_name,
                    ie_type = %parsed.transaction_type,
                    keyword = %parsed.matched_keyword(),
                    "Exact rule hit"
                );

                ItemClassification {
                    ie_type: Some(parsed.transaction_type),
                    category: Some(parsed.transaction_type.category_label().to_string()),
                    metadata: ClassificationMetadata {
                        method: Method::Exact,
                        confidence: parsed.confidence,
                        matched_keyword: Some(parsed.matched_keyword().to_string()),
                        reason: None,
                        original_field: field_name.to_string(),
                        amount: amount.to_string(),
                    },
                }
            }
            None => {
                self.fallback.fetch_add(1, Ordering::Relaxed);
                warn!(field = %field_name, "No exact rule, needs external classifier");

                ItemClassification {
                    ie_type: None,
                    category: None,
                    metadata: ClassificationMetadata {
                        method: Method::NeedsExternal,
                        confidence: 0.0,
                        matched_keyword: None,
                        reason: Some(NO_KEYWORD_REASON.to_string()),
                        original_field: field_name.to_string(),
                        amount: amount.to_string(),
                    },
                }
            }
        }
    }

    /// Persist an externally decided label for `field_name`
    ///
    /// The stored keyword is the whole field, normalized by [`core_keyword`].
    /// Returns `Ok(false)` when that keyword is already stored (with either
    /// label); only an actual insert bumps the learned counter and reloads
    /// the exact-match keywords.
    pub fn learn_from_external_result(&self, field_name: &str, label: IeType) -> Result<bool> {
        let keyword = core_keyword(field_name);

        if self.store.keyword_exists(&keyword)? {
            debug!(keyword = %keyword, "Keyword already known, nothing to learn");
            return Ok(false);
        }

        // A concurrent learner may have inserted it since the check
        let saved = self.store.save_keyword(&keyword, label)?;
        if saved {
            self.learned.fetch_add(1, Ordering::Relaxed);
            info!(keyword = %keyword, ie_type = %label, "Learned new keyword");
            self.exact.reload_keywords();
        }

        Ok(saved)
    }

    pub fn get_statistics(&self) -> ParsingStats {
        let total = self.total.load(Ordering::Relaxed);
        let exact_success = self.exact_success.load(Ordering::Relaxed);
        let fallback = self.fallback.load(Ordering::Relaxed);
        let learned_keywords = self.learned.load(Ordering::Relaxed);

        let rate = |n: u64| {
            if total == 0 {
                0.0
            } else {
                n as f64 / total as f64
            }
        };

        ParsingStats {
            total_processed: total,
            exact_success,
            fallback,
            learned_keywords,
            exact_match_rate: rate(exact_success),
            fallback_rate: rate(fallback),
            cost_saving_rate: rate(exact_success),
        }
    }

    pub fn reset_statistics(&self) {
        self.total.store(0, Ordering::Relaxed);
        self.exact_success.store(0, Ordering::Relaxed);
        self.fallback.store(0, Ordering::Relaxed);
        self.learned.store(0, Ordering::Relaxed);
    }
}

/// Keyword under which a field is learned
///
/// Underscores become spaces, as in [`crate::extract::extract_field_name`].
pub fn core_keyword(field_name: &str) -> String {
    field_name.replace('_', " ").trim().to_lowercase()
}

/// Rebuild a parseable line from a field and an amount
///
/// A bare number gets a `원` suffix so the amount extractor recognizes it.
fn synthetic_line(field_name: &str, amount: &str) -> String {
    let amount = amount.trim();
    let has_marker = amount.ends_with('원') || amount.starts_with('₩') || amount.starts_with("KRW");
    if has_marker {
        format!("{}: {}", field_name, amount)
    } else {
        format!("{}: {}원", field_name, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    use crate::db::Database;
    use crate::exact::tests::UnavailableStore;
    use crate::models::KeywordRule;

    /// Database whose next income read returns, then sits on, stale keywords
    struct StallingStore {
        db: Database,
        stall_next_read: AtomicBool,
    }

    impl RuleStore for StallingStore {
        fn find_all_keywords_by_type(&self, ie_type: IeType) -> Result<Vec<String>> {
            let keywords = self.db.find_all_keywords_by_type(ie_type)?;
            if ie_type == IeType::Income && self.stall_next_read.swap(false, Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(400));
            }
            Ok(keywords)
        }
        fn keyword_exists(&self, keyword: &str) -> Result<bool> {
            self.db.keyword_exists(keyword)
        }
        fn save_keyword(&self, keyword: &str, ie_type: IeType) -> Result<bool> {
            self.db.save_keyword(keyword, ie_type)
        }
        fn find_by_keyword(&self, keyword: &str) -> Result<Option<IeType>> {
            self.db.find_by_keyword(keyword)
        }
        fn get_all_rules(&self) -> Result<Vec<KeywordRule>> {
            self.db.get_all_rules()
        }
    }

    fn hybrid_with(income: &[&str], expense: &[&str]) -> (Arc<Database>, HybridClassifier) {
        let db = Arc::new(Database::in_memory().unwrap());
        for k in income {
            db.save_keyword(k, IeType::Income).unwrap();
        }
        for k in expense {
            db.save_keyword(k, IeType::Expense).unwrap();
        }
        let hybrid = HybridClassifier::new(db.clone());
        (db, hybrid)
    }

    #[test]
    fn test_synthetic_line() {
        assert_eq!(synthetic_line("급여", "3000000"), "급여: 3000000원");
        assert_eq!(synthetic_line("급여", "3,000,000원"), "급여: 3,000,000원");
        assert_eq!(synthetic_line("급여", "₩3,000,000"), "급여: ₩3,000,000");
    }

    #[test]
    fn test_exact_hit() {
        let (_db, hybrid) = hybrid_with(&["급여"], &[]);

        let result = hybrid.classify_item("급여", "3000000", None);
        assert!(result.is_hit());
        assert_eq!(result.ie_type, Some(IeType::Income));
        assert_eq!(result.category.as_deref(), Some("소득"));
        assert_eq!(result.metadata.confidence, 1.0);
        assert_eq!(result.metadata.matched_keyword.as_deref(), Some("급여"));
        assert_eq!(result.metadata.original_field, "급여");
        assert_eq!(result.metadata.amount, "3000000");
    }

    #[test]
    fn test_miss_needs_external() {
        let (_db, hybrid) = hybrid_with(&["급여"], &[]);

        let result = hybrid.classify_item("기타수당", "50000", Some("소득"));
        assert_eq!(result.metadata.method, Method::NeedsExternal);
        assert_eq!(result.ie_type, None);
        assert_eq!(result.category, None);
        assert_eq!(result.metadata.confidence, 0.0);
        assert_eq!(result.metadata.reason.as_deref(), Some(NO_KEYWORD_REASON));
    }

    #[test]
    fn test_unparseable_amount_is_a_miss() {
        let (_db, hybrid) = hybrid_with(&["급여"], &[]);
        let result = hybrid.classify_item("급여", "0", None);
        assert_eq!(result.metadata.method, Method::NeedsExternal);
    }

    #[test]
    fn test_learn_then_hit() {
        let (db, hybrid) = hybrid_with(&[], &[]);
        assert!(!hybrid.classify_item("기타수당", "50000", None).is_hit());

        assert!(hybrid
            .learn_from_external_result(" 기타수당 ", IeType::Income)
            .unwrap());
        assert_eq!(hybrid.get_statistics().learned_keywords, 1);
        assert_eq!(db.find_by_keyword("기타수당").unwrap(), Some(IeType::Income));

        let result = hybrid.classify_item("기타수당", "50000", None);
        assert!(result.is_hit());
        assert_eq!(result.ie_type, Some(IeType::Income));
    }

    #[test]
    fn test_learn_underscored_field_then_hit() {
        let (db, hybrid) = hybrid_with(&[], &[]);

        assert!(hybrid
            .learn_from_external_result("기타_수당", IeType::Income)
            .unwrap());
        assert!(db.keyword_exists("기타 수당").unwrap());

        let result = hybrid.classify_item("기타_수당", "50000", None);
        assert!(result.is_hit());
        assert_eq!(result.metadata.matched_keyword.as_deref(), Some("기타 수당"));
    }

    #[test]
    fn test_overlapping_learns_keep_both_keywords() {
        let store = Arc::new(StallingStore {
            db: Database::in_memory().unwrap(),
            stall_next_read: AtomicBool::new(false),
        });
        let hybrid = Arc::new(HybridClassifier::new(store.clone()));
        store.stall_next_read.store(true, Ordering::SeqCst);

        let first = {
            let hybrid = hybrid.clone();
            std::thread::spawn(move || {
                hybrid
                    .learn_from_external_result("알파수당", IeType::Income)
                    .unwrap()
            })
        };
        std::thread::sleep(Duration::from_millis(100));
        let second = {
            let hybrid = hybrid.clone();
            std::thread::spawn(move || {
                hybrid
                    .learn_from_external_result("베타수당", IeType::Income)
                    .unwrap()
            })
        };
        assert!(first.join().unwrap());
        assert!(second.join().unwrap());

        assert_eq!(hybrid.get_statistics().learned_keywords, 2);
        assert_eq!(hybrid.exact().rule_counts().income, 2);
        assert!(hybrid.classify_item("알파수당", "10000", None).is_hit());
        assert!(hybrid.classify_item("베타수당", "10000", None).is_hit());
    }

    #[test]
    fn test_learn_lowercases_key() {
        let (db, hybrid) = hybrid_with(&[], &[]);
        assert!(hybrid
            .learn_from_external_result("Netflix", IeType::Expense)
            .unwrap());
        assert!(db.keyword_exists("netflix").unwrap());
        assert!(hybrid.classify_item("NETFLIX", "17000", None).is_hit());
    }

    #[test]
    fn test_learn_existing_key_is_noop() {
        let (_db, hybrid) = hybrid_with(&["급여"], &[]);

        assert!(!hybrid
            .learn_from_external_result("급여", IeType::Expense)
            .unwrap());
        assert_eq!(hybrid.get_statistics().learned_keywords, 0);
        // Original label is kept
        assert_eq!(
            hybrid.classify_item("급여", "1000", None).ie_type,
            Some(IeType::Income)
        );
    }

    #[test]
    fn test_statistics() {
        let (_db, hybrid) = hybrid_with(&["급여"], &["보험료"]);

        let empty = hybrid.get_statistics();
        assert_eq!(empty, ParsingStats::default());

        hybrid.classify_item("급여", "3000000", None);
        hybrid.classify_item("보험료", "120000", None);
        hybrid.classify_item("기타", "1000", None);
        hybrid.classify_item("잡비", "2000", None);

        let stats = hybrid.get_statistics();
        assert_eq!(stats.total_processed, 4);
        assert_eq!(stats.exact_success, 2);
        assert_eq!(stats.fallback, 2);
        assert_eq!(stats.exact_match_rate, 0.5);
        assert_eq!(stats.fallback_rate, 0.5);
        assert_eq!(stats.cost_saving_rate, stats.exact_match_rate);

        hybrid.reset_statistics();
        assert_eq!(hybrid.get_statistics(), ParsingStats::default());
    }

    #[test]
    fn test_store_outage() {
        let hybrid = HybridClassifier::new(Arc::new(UnavailableStore));

        let result = hybrid.classify_item("급여", "3000000", None);
        assert_eq!(result.metadata.method, Method::NeedsExternal);
        assert!(hybrid
            .learn_from_external_result("급여", IeType::Income)
            .is_err());
        assert_eq!(hybrid.get_statistics().learned_keywords, 0);
    }

    #[test]
    fn test_concurrent_counting() {
        let (_db, hybrid) = hybrid_with(&["급여"], &[]);
        let hybrid = Arc::new(hybrid);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let hybrid = hybrid.clone();
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        hybrid.classify_item("급여", "1000", None);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = hybrid.get_statistics();
        assert_eq!(stats.total_processed, 100);
        assert_eq!(stats.exact_success, 100);
    }

    #[test]
    fn test_metadata_serializes_snake_case() {
        let (_db, hybrid) = hybrid_with(&[], &[]);
        let result = hybrid.classify_item("기타", "1000", None);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["metadata"]["method"], "needs_external");
        assert!(json["metadata"].get("matched_keyword").is_none());
    }
}
