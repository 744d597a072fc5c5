//! Response parsing for AI backends

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::IeType;

/// Expected JSON payload: `{"type": "income"}` or `{"type": "expense"}`
#[derive(Debug, Deserialize)]
struct TypeResponse {
    #[serde(rename = "type")]
    ie_type: String,
}

fn truncate_raw(s: &str) -> String {
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s.to_string()
    }
}

/// Parse an income/expense label from an AI response
///
/// The JSON object is taken from the first `{` to the last `}`, so prose or
/// code fences around it are tolerated.
pub fn parse_ie_type(response: &str) -> Result<IeType> {
    let response = response.trim();

    let start = response.find('{');
    let end = response.rfind('}');

    match (start, end) {
        (Some(s), Some(e)) if s < e => {
            let json_str = &response[s..=e];
            let parsed: TypeResponse = serde_json::from_str(json_str).map_err(|e| {
                Error::InvalidData(format!(
                    "Invalid JSON from AI: {} | Raw: {}",
                    e,
                    truncate_raw(json_str)
                ))
            })?;
            parsed.ie_type.parse().map_err(|e: String| {
                Error::Ai(format!("{} | Raw: {}", e, truncate_raw(json_str)))
            })
        }
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            truncate_raw(response)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        assert_eq!(parse_ie_type(r#"{"type": "income"}"#).unwrap(), IeType::Income);
        assert_eq!(
            parse_ie_type(r#"{"type":"EXPENSE"}"#).unwrap(),
            IeType::Expense
        );
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let response = "Sure! Here is the answer:\n```json\n{\"type\": \"expense\"}\n```";
        assert_eq!(parse_ie_type(response).unwrap(), IeType::Expense);
    }

    #[test]
    fn test_parse_korean_label() {
        assert_eq!(parse_ie_type(r#"{"type": "소득"}"#).unwrap(), IeType::Income);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            parse_ie_type("income"),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            parse_ie_type(r#"{"label": "income"}"#),
            Err(Error::InvalidData(_))
        ));
        assert!(matches!(
            parse_ie_type(r#"{"type": "transfer"}"#),
            Err(Error::Ai(_))
        ));
    }
}
