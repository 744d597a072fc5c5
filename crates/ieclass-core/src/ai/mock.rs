//! Mock backend for testing
//!
//! Labels fields without a running LLM server. Useful for unit tests and
//! development.

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::models::IeType;

use super::ExternalClassifier;

/// Field substrings the mock treats as income
const INCOME_MARKERS: &[&str] = &[
    "급여", "월급", "수당", "상여", "보너스", "성과급", "환급", "이자", "배당", "입금", "수입",
    "income", "salary", "bonus", "refund", "interest",
];

/// Income when the field contains an income marker, otherwise expense
pub(crate) fn label_by_markers(field_name: &str) -> IeType {
    let field = field_name.to_lowercase();
    if INCOME_MARKERS.iter().any(|m| field.contains(m)) {
        IeType::Income
    } else {
        IeType::Expense
    }
}

/// Mock external classifier for testing
///
/// By default labels a field Income when it contains a known income marker
/// and Expense otherwise. Can be pinned to a fixed label or made to fail.
#[derive(Clone)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    /// Label returned for every field, overriding the marker lookup
    pub fixed: Option<IeType>,
    /// Whether classify_field should return an error
    pub failing: bool,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            healthy: true,
            fixed: None,
            failing: false,
        }
    }

    /// Create an unhealthy mock backend
    pub fn unhealthy() -> Self {
        Self {
            healthy: false,
            ..Self::new()
        }
    }

    /// Mock that labels everything `ie_type`
    pub fn fixed(ie_type: IeType) -> Self {
        Self {
            fixed: Some(ie_type),
            ..Self::new()
        }
    }

    /// Mock whose classification always errors
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl ExternalClassifier for MockBackend {
    async fn classify_field(
        &self,
        field_name: &str,
        _doc_type_hint: Option<&str>,
    ) -> Result<IeType> {
        if self.failing {
            return Err(Error::Ai("mock backend configured to fail".into()));
        }
        if let Some(ie_type) = self.fixed {
            return Ok(ie_type);
        }

        Ok(label_by_markers(field_name))
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }
}
