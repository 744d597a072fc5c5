//! Amount and field extraction from raw statement lines
//!
//! Lines look like `"<field>: <amount>[<unit>]"`, e.g. `"급여: 3,000,000원"`.
//! Both extractors report a miss as `None`; a miss is a normal outcome.

use std::sync::LazyLock;

use regex::Regex;

/// Smallest accepted amount
pub const MIN_AMOUNT: u64 = 1;
/// Largest accepted amount (10억)
pub const MAX_AMOUNT: u64 = 1_000_000_000;

/// Amount patterns in priority order. Capture group 1 holds the digits.
static AMOUNT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // 1,000,000원
        r"(\d{1,3}(?:,\d{3})+)\s*원",
        // 1000000원, never starting inside a separated number
        r"(?:^|[^\d,])(\d+)\s*원",
        // ₩1,000,000
        r"₩\s*(\d{1,3}(?:,\d{3})+)",
        // KRW 1,000,000
        r"KRW\s*(\d{1,3}(?:,\d{3})+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid amount regex pattern"))
    .collect()
});

static FIELD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]+):").expect("Invalid field regex pattern"));

/// Extract the amount from a line as a digit string without separators
///
/// Patterns are tried in priority order. A match whose value falls outside
/// `MIN_AMOUNT..=MAX_AMOUNT` (or does not fit in a u64) does not end the
/// search; the next pattern gets its turn on the same text.
pub fn extract_amount(text: &str) -> Option<String> {
    for pattern in AMOUNT_PATTERNS.iter() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let Some(digits) = caps.get(1) else {
            continue;
        };

        let normalized = digits.as_str().replace(',', "");
        match normalized.parse::<u64>() {
            Ok(value) if (MIN_AMOUNT..=MAX_AMOUNT).contains(&value) => return Some(normalized),
            _ => continue,
        }
    }
    None
}

/// Extract the item label: text before the first ':', trimmed, with
/// underscores turned into spaces
pub fn extract_field_name(text: &str) -> Option<String> {
    let caps = FIELD_PATTERN.captures(text)?;
    let field = caps.get(1)?.as_str().trim().replace('_', " ");
    Some(field)
}

/// Extract both field and amount, or `None` if either is missing
pub fn extract_line(text: &str) -> Option<(String, String)> {
    let amount = extract_amount(text)?;
    let field = extract_field_name(text)?;
    Some((field, amount))
}
