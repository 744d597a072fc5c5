//! Keyword rule store contract
//!
//! The exact-match classifier and the learn-back path only talk to the
//! store through this trait. `Database` is the SQLite implementation.

use crate::error::Result;
use crate::models::{IeType, KeywordRule};

/// Persistent keyword → income/expense mapping
///
/// Keywords are unique across both types; implementations enforce that on
/// write, so `save_keyword` is the final word on duplicate-learn races.
pub trait RuleStore: Send + Sync {
    /// All keywords of one type, in insertion order
    fn find_all_keywords_by_type(&self, ie_type: IeType) -> Result<Vec<String>>;

    /// Whether the exact keyword is already stored (any type)
    fn keyword_exists(&self, keyword: &str) -> Result<bool>;

    /// Store a keyword. Returns false if it already existed.
    fn save_keyword(&self, keyword: &str, ie_type: IeType) -> Result<bool>;

    /// Type of an exact keyword, if stored
    fn find_by_keyword(&self, keyword: &str) -> Result<Option<IeType>>;

    /// Every rule, oldest first
    fn get_all_rules(&self) -> Result<Vec<KeywordRule>>;
}
