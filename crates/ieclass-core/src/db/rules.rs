//! Keyword rule operations (ie_rule)

use std::io::{Read, Write};

use csv::{ReaderBuilder, Writer};
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

use super::{parse_datetime, Database};
use crate::error::{Error, Result};
use crate::models::{IeType, KeywordRule, RuleCounts};
use crate::store::RuleStore;

/// Longest keyword the rule table accepts, in characters
pub const MAX_KEYWORD_CHARS: usize = 100;

/// Result of a CSV rule import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub inserted: usize,
    /// Rows whose keyword was already stored
    pub skipped: usize,
}

fn parse_ie_type(idx: usize, s: &str) -> rusqlite::Result<IeType> {
    s.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(Error::InvalidData(e)),
        )
    })
}

impl RuleStore for Database {
    fn find_all_keywords_by_type(&self, ie_type: IeType) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT keyword FROM ie_rule WHERE ie_type = ? ORDER BY id")?;
        let keywords = stmt
            .query_map(params![ie_type.as_str()], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keywords)
    }

    fn keyword_exists(&self, keyword: &str) -> Result<bool> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM ie_rule WHERE keyword = ?)",
            params![keyword],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn save_keyword(&self, keyword: &str, ie_type: IeType) -> Result<bool> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(Error::InvalidData("Keyword must not be empty".into()));
        }
        if keyword.chars().count() > MAX_KEYWORD_CHARS {
            return Err(Error::InvalidData(format!(
                "Keyword longer than {} characters",
                MAX_KEYWORD_CHARS
            )));
        }

        let conn = self.conn()?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO ie_rule (ie_type, keyword) VALUES (?, ?)",
            params![ie_type.as_str(), keyword],
        )?;

        if changed == 0 {
            debug!(keyword = %keyword, "Keyword already stored, not saved");
        }
        Ok(changed > 0)
    }

    fn find_by_keyword(&self, keyword: &str) -> Result<Option<IeType>> {
        let conn = self.conn()?;
        let ie_type = conn
            .query_row(
                "SELECT ie_type FROM ie_rule WHERE keyword = ?",
                params![keyword],
                |row| {
                    let s: String = row.get(0)?;
                    parse_ie_type(0, &s)
                },
            )
            .optional()?;
        Ok(ie_type)
    }

    fn get_all_rules(&self) -> Result<Vec<KeywordRule>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, ie_type, keyword, created_at FROM ie_rule ORDER BY id")?;
        let rules = stmt
            .query_map([], |row| {
                let ie_type: String = row.get(1)?;
                let created_at_str: String = row.get(3)?;
                Ok(KeywordRule {
                    id: row.get(0)?,
                    ie_type: parse_ie_type(1, &ie_type)?,
                    keyword: row.get(2)?,
                    created_at: parse_datetime(&created_at_str),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rules)
    }
}

impl Database {
    /// Count stored rules per type
    pub fn count_rules(&self) -> Result<RuleCounts> {
        let conn = self.conn()?;
        let count = |ie_type: IeType| -> Result<usize> {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM ie_rule WHERE ie_type = ?",
                params![ie_type.as_str()],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        };

        Ok(RuleCounts {
            income: count(IeType::Income)?,
            expense: count(IeType::Expense)?,
        })
    }

    /// Save a batch of keywords, skipping ones already stored
    pub fn seed_keywords<'a, I>(&self, keywords: I) -> Result<ImportStats>
    where
        I: IntoIterator<Item = (&'a str, IeType)>,
    {
        let mut stats = ImportStats::default();
        for (keyword, ie_type) in keywords {
            if self.save_keyword(keyword, ie_type)? {
                stats.inserted += 1;
            } else {
                stats.skipped += 1;
            }
        }
        info!(
            inserted = stats.inserted,
            skipped = stats.skipped,
            "Seeded keyword rules"
        );
        Ok(stats)
    }

    /// Write all rules as CSV: `keyword,ie_type,created_at`
    pub fn export_rules_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let rules = self.get_all_rules()?;
        let mut wtr = Writer::from_writer(writer);

        wtr.write_record(["keyword", "ie_type", "created_at"])?;
        for rule in &rules {
            let created_at = rule.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
            wtr.write_record([
                rule.keyword.as_str(),
                rule.ie_type.as_str(),
                created_at.as_str(),
            ])?;
        }
        wtr.flush()?;

        Ok(rules.len())
    }

    /// Read rules from CSV with a header row and `keyword` / `ie_type` columns
    ///
    /// Extra columns (such as `created_at` from an export) are ignored;
    /// rows with an unknown type are rejected.
    pub fn import_rules_csv<R: Read>(&self, reader: R) -> Result<ImportStats> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| Error::InvalidData(format!("Missing '{}' column", name)))
        };
        let keyword_idx = column("keyword")?;
        let type_idx = column("ie_type")?;

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let keyword = record
                .get(keyword_idx)
                .ok_or_else(|| Error::InvalidData("Missing keyword".into()))?;
            let ie_type: IeType = record
                .get(type_idx)
                .ok_or_else(|| Error::InvalidData("Missing ie_type".into()))?
                .parse()
                .map_err(Error::InvalidData)?;
            rows.push((keyword.to_string(), ie_type));
        }

        self.seed_keywords(rows.iter().map(|(k, t)| (k.as_str(), *t)))
    }
}
