//! Exact-match keyword classifier backed by the rule store
//!
//! Keywords are loaded from a [`RuleStore`] into an immutable snapshot.
//! `reload_keywords` builds a complete new snapshot before publishing it, so
//! concurrent readers see either the old or the new keyword sets, never a mix.
//! Reloads are serialized from the store read through the publish, so a
//! slow reload can never overwrite a newer snapshot with an older one.
//!
//! A store failure while loading leaves the classifier with empty keyword
//! sets: every lookup misses and the caller falls back to other classifiers.

use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, error, info};

use crate::error::Result;
use crate::extract::{extract_amount, extract_field_name};
use crate::models::{Classification, IeType, ParsedTransaction, RuleCounts};
use crate::store::RuleStore;

/// Income and expense keywords as loaded from the store
#[derive(Debug, Default)]
struct KeywordSnapshot {
    income: Vec<String>,
    expense: Vec<String>,
}

impl KeywordSnapshot {
    fn load(store: &dyn RuleStore) -> Result<Self> {
        Ok(Self {
            income: store.find_all_keywords_by_type(IeType::Income)?,
            expense: store.find_all_keywords_by_type(IeType::Expense)?,
        })
    }
}

/// Keyword-containment classifier with full confidence on any hit
pub struct ExactMatchClassifier {
    store: Arc<dyn RuleStore>,
    snapshot: RwLock<Arc<KeywordSnapshot>>,
    /// Held for the whole read-then-publish of a reload
    reload_lock: Mutex<()>,
}

impl ExactMatchClassifier {
    /// Create a classifier and load keywords from the store
    ///
    /// Never fails: if the store is unavailable the classifier starts empty.
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        let (snapshot, _) = Self::load_or_empty(store.as_ref());
        Self {
            store,
            snapshot: RwLock::new(Arc::new(snapshot)),
            reload_lock: Mutex::new(()),
        }
    }

    fn load_or_empty(store: &dyn RuleStore) -> (KeywordSnapshot, bool) {
        match KeywordSnapshot::load(store) {
            Ok(snapshot) => {
                info!(
                    income = snapshot.income.len(),
                    expense = snapshot.expense.len(),
                    "Loaded keyword rules"
                );
                (snapshot, true)
            }
            Err(e) => {
                error!(error = %e, "Failed to load keyword rules, continuing with none");
                (KeywordSnapshot::default(), false)
            }
        }
    }

    /// Re-fetch both keyword sets and publish them as one snapshot
    ///
    /// Returns false if the store could not be read (the classifier is then
    /// left with empty keyword sets).
    pub fn reload_keywords(&self) -> bool {
        let _reload = self.reload_lock.lock().unwrap_or_else(|e| e.into_inner());
        debug!("Reloading keyword rules");
        let (snapshot, ok) = Self::load_or_empty(self.store.as_ref());

        let mut guard = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::new(snapshot);
        ok
    }

    fn current(&self) -> Arc<KeywordSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Classify a field name by keyword containment
    ///
    /// Income keywords are tested first, in store order; the first keyword
    /// contained in the lower-cased field wins. The document hint is
    /// accepted for interface parity with the heuristic classifier and is
    /// not used.
    pub fn classify(&self, field_name: &str, _doc_type_hint: Option<&str>) -> Classification {
        let snapshot = self.current();
        let field_lower = field_name.to_lowercase();

        let sides = [
            (IeType::Income, &snapshot.income),
            (IeType::Expense, &snapshot.expense),
        ];
        for (ie_type, keywords) in sides {
            if let Some(keyword) = keywords
                .iter()
                .find(|k| field_lower.contains(&k.to_lowercase()))
            {
                debug!(
                    keyword = %keyword,
                    field = %field_name,
                    ie_type = %ie_type,
                    "Exact keyword match"
                );
                return Classification {
                    ie_type: Some(ie_type),
                    confidence: 1.0,
                    matched_keywords: vec![keyword.clone()],
                    category: None,
                };
            }
        }

        debug!(field = %field_name, "No exact keyword match");
        Classification::unknown(0.0)
    }

    /// Parse a `"<field>: <amount>"` line and classify its field
    ///
    /// Returns `None` when the amount or field cannot be extracted, or when
    /// no keyword matches.
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

    /// Keyword counts in the current snapshot
    pub fn rule_counts(&self) -> RuleCounts {
        let snapshot = self.current();
        RuleCounts {
            income: snapshot.income.len(),
            expense: snapshot.expense.len(),
        }
    }
}
