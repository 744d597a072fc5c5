//! End-to-end resolution: exact rules, then heuristic, then external
//!
//! The resolver closes the loop the hybrid orchestrator leaves open. Items
//! the keyword rules miss are tried against the heuristic scorer and then
//! the external classifier; a label from either is learned back so later
//! items with the same field hit the rules directly.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::ai::ExternalClassifier;
use crate::error::Result;
use crate::extract::extract_line;
use crate::heuristic::HeuristicClassifier;
use crate::hybrid::HybridClassifier;
use crate::models::IeType;

/// Which stage produced a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    Exact,
    Heuristic,
    External,
    Unresolved,
}

impl ResolutionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionMethod::Exact => "exact",
            ResolutionMethod::Heuristic => "heuristic",
            ResolutionMethod::External => "external",
            ResolutionMethod::Unresolved => "unresolved",
        }
    }
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final verdict for one item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub field: String,
    pub amount: String,
    pub ie_type: Option<IeType>,
    pub category: Option<String>,
    pub method: ResolutionMethod,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_keyword: Option<String>,
    /// Whether this resolution added a rule to the store
    pub learned: bool,
}

impl Resolution {
    fn unresolved(field: &str, amount: &str) -> Self {
        Self {
            field: field.to_string(),
            amount: amount.to_string(),
            ie_type: None,
            category: None,
            method: ResolutionMethod::Unresolved,
            confidence: 0.0,
            matched_keyword: None,
            learned: false,
        }
    }
}

/// Chains the hybrid orchestrator with optional fallbacks
pub struct Resolver {
    hybrid: Arc<HybridClassifier>,
    heuristic: Option<HeuristicClassifier>,
    external: Option<Arc<dyn ExternalClassifier>>,
    learn: bool,
}

impl Resolver {
    /// Resolver with no fallbacks; learning enabled
    pub fn new(hybrid: Arc<HybridClassifier>) -> Self {
        Self {
            hybrid,
            heuristic: None,
            external: None,
            learn: true,
        }
    }

    pub fn with_heuristic(mut self, heuristic: HeuristicClassifier) -> Self {
        self.heuristic = Some(heuristic);
        self
    }

    pub fn with_external(mut self, external: Arc<dyn ExternalClassifier>) -> Self {
        self.external = Some(external);
        self
    }

    /// Enable or disable writing fallback labels back to the rule store
    pub fn with_learning(mut self, learn: bool) -> Self {
        self.learn = learn;
        self
    }

    pub fn hybrid(&self) -> &HybridClassifier {
        &self.hybrid
    }

    /// Resolve one (field, amount) item
    pub async fn resolve_item(
        &self,
        field_name: &str,
        amount: &str,
        doc_type_hint: Option<&str>,
    ) -> Result<Resolution> {
        let item = self.hybrid.classify_item(field_name, amount, doc_type_hint);
        if let Some(ie_type) = item.ie_type {
            return Ok(Resolution {
                field: field_name.to_string(),
                amount: amount.to_string(),
                ie_type: Some(ie_type),
                category: item.category,
                method: ResolutionMethod::Exact,
                confidence: item.metadata.confidence,
                matched_keyword: item.metadata.matched_keyword,
                learned: false,
            });
        }

        if let Some(heuristic) = &self.heuristic {
            let verdict = heuristic.classify(field_name, doc_type_hint);
            if let Some(ie_type) = verdict.ie_type {
                let learned = self.learn(field_name, ie_type);
                debug!(
                    field = %field_name,
                    ie_type = %ie_type,
                    confidence = verdict.confidence,
                    "Resolved by heuristic"
                );
                return Ok(Resolution {
                    field: field_name.to_string(),
                    amount: amount.to_string(),
                    ie_type: Some(ie_type),
                    category: verdict
                        .category
                        .clone()
                        .or_else(|| Some(ie_type.category_label().to_string())),
                    method: ResolutionMethod::Heuristic,
                    confidence: verdict.confidence,
                    matched_keyword: verdict.matched_keywords.first().cloned(),
                    learned,
                });
            }
        }

        if let Some(external) = &self.external {
            match external.classify_field(field_name, doc_type_hint).await {
                Ok(ie_type) => {
                    let learned = self.learn(field_name, ie_type);
                    info!(
                        field = %field_name,
                        ie_type = %ie_type,
                        model = %external.model(),
                        "Resolved by external classifier"
                    );
                    return Ok(Resolution {
                        field: field_name.to_string(),
                        amount: amount.to_string(),
                        ie_type: Some(ie_type),
                        category: Some(ie_type.category_label().to_string()),
                        method: ResolutionMethod::External,
                        confidence: 0.0,
                        matched_keyword: None,
                        learned,
                    });
                }
                Err(e) => {
                    warn!(field = %field_name, error = %e, "External classifier failed");
                }
            }
        }

        Ok(Resolution::unresolved(field_name, amount))
    }

    /// Resolve every `"<field>: <amount>"` line of a document
    ///
    /// Lines without an extractable field and amount are skipped.
    pub async fn resolve_document(
        &self,
        text: &str,
        doc_type_hint: Option<&str>,
    ) -> Result<Vec<Resolution>> {
        let mut resolutions = Vec::new();
        for line in text.lines() {
            let Some((field, amount)) = extract_line(line) else {
                if !line.trim().is_empty() {
                    debug!(line = %line, "Skipping line without field and amount");
                }
                continue;
            };
            resolutions.push(self.resolve_item(&field, &amount, doc_type_hint).await?);
        }
        Ok(resolutions)
    }

    /// Store a fallback label; a store failure keeps the verdict unlearned
    fn learn(&self, field_name: &str, ie_type: IeType) -> bool {
        if !self.learn {
            return false;
        }
        match self.hybrid.learn_from_external_result(field_name, ie_type) {
            Ok(learned) => learned,
            Err(e) => {
                error!(field = %field_name, error = %e, "Failed to learn keyword");
                false
            }
        }
    }
}
