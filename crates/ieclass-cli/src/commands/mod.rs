//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Init and shared utilities (open_db, heuristic loading)
//! - `classify` - Classification commands (classify, parse, learn)
//! - `rules` - Keyword rule management (list, add, test, export, import)
//! - `status` - Rule counts and external classifier health

pub mod classify;
pub mod core;
pub mod rules;
pub mod status;

// Re-export command functions for main.rs
pub use classify::*;
pub use core::*;
pub use rules::*;
pub use status::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
