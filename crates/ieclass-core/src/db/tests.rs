//! Database tests

use super::*;
use crate::models::IeType;
use crate::store::RuleStore;

#[test]
fn test_in_memory_db_starts_empty() {
    let db = Database::in_memory().unwrap();
    assert!(db.get_all_rules().unwrap().is_empty());
    assert_eq!(db.count_rules().unwrap().total(), 0);
}

#[test]
fn test_ie_rule_schema_exists() {
    let db = Database::in_memory().unwrap();
    let conn = db.conn().unwrap();

    let result: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM pragma_table_info('ie_rule') WHERE name IN ('id', 'ie_type', 'keyword', 'created_at')",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(result, 4, "ie_rule table should have 4 expected columns");
}

#[test]
fn test_save_and_find_keywords_in_insertion_order() {
    let db = Database::in_memory().unwrap();

    assert!(db.save_keyword("급여", IeType::Income).unwrap());
    assert!(db.save_keyword("보험료", IeType::Expense).unwrap());
    assert!(db.save_keyword("상여금", IeType::Income).unwrap());

    assert_eq!(
        db.find_all_keywords_by_type(IeType::Income).unwrap(),
        vec!["급여".to_string(), "상여금".to_string()]
    );
    assert_eq!(
        db.find_all_keywords_by_type(IeType::Expense).unwrap(),
        vec!["보험료".to_string()]
    );
    assert_eq!(
        db.find_by_keyword("보험료").unwrap(),
        Some(IeType::Expense)
    );
    assert_eq!(db.find_by_keyword("없음").unwrap(), None);
}

#[test]
fn test_keyword_unique_across_types() {
    let db = Database::in_memory().unwrap();

    assert!(db.save_keyword("이체", IeType::Expense).unwrap());
    // Same keyword with the other type is ignored, not an error
    assert!(!db.save_keyword("이체", IeType::Income).unwrap());
    assert!(!db.save_keyword("이체", IeType::Expense).unwrap());

    assert!(db.keyword_exists("이체").unwrap());
    assert_eq!(db.find_by_keyword("이체").unwrap(), Some(IeType::Expense));
    assert_eq!(db.get_all_rules().unwrap().len(), 1);
}

#[test]
fn test_save_keyword_trims_and_rejects_empty() {
    let db = Database::in_memory().unwrap();

    assert!(db.save_keyword("  환급  ", IeType::Income).unwrap());
    assert!(db.keyword_exists("환급").unwrap());
    assert!(db.save_keyword("   ", IeType::Income).is_err());
}

#[test]
fn test_save_keyword_bounds_length() {
    let db = Database::in_memory().unwrap();

    // Counted in characters, not bytes
    let longest = "가".repeat(MAX_KEYWORD_CHARS);
    assert!(db.save_keyword(&longest, IeType::Income).unwrap());

    let too_long = "나".repeat(MAX_KEYWORD_CHARS + 1);
    assert!(matches!(
        db.save_keyword(&too_long, IeType::Income),
        Err(crate::error::Error::InvalidData(_))
    ));
    assert!(!db.keyword_exists(&too_long).unwrap());
}

#[test]
fn test_get_all_rules_has_timestamps() {
    let db = Database::in_memory().unwrap();
    db.save_keyword("배당", IeType::Income).unwrap();

    let rules = db.get_all_rules().unwrap();
    assert_eq!(rules.len(), 1);
    assert!(rules[0].id > 0);
    assert_eq!(rules[0].keyword, "배당");
    assert_eq!(rules[0].ie_type, IeType::Income);
}

#[test]
fn test_count_rules() {
    let db = Database::in_memory().unwrap();
    db.save_keyword("급여", IeType::Income).unwrap();
    db.save_keyword("수당", IeType::Income).unwrap();
    db.save_keyword("출금", IeType::Expense).unwrap();

    let counts = db.count_rules().unwrap();
    assert_eq!(counts.income, 2);
    assert_eq!(counts.expense, 1);
    assert_eq!(counts.total(), 3);
}

#[test]
fn test_seed_keywords_counts_skips() {
    let db = Database::in_memory().unwrap();
    db.save_keyword("급여", IeType::Income).unwrap();

    let stats = db
        .seed_keywords([
            ("급여", IeType::Income),
            ("월급", IeType::Income),
            ("카드결제", IeType::Expense),
        ])
        .unwrap();

    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.skipped, 1);
}

#[test]
fn test_export_then_import_into_fresh_db() {
    let source = Database::in_memory().unwrap();
    source.save_keyword("급여", IeType::Income).unwrap();
    source.save_keyword("보험료", IeType::Expense).unwrap();

    let mut buf = Vec::new();
    let exported = source.export_rules_csv(&mut buf).unwrap();
    assert_eq!(exported, 2);

    let csv_text = String::from_utf8(buf.clone()).unwrap();
    assert!(csv_text.starts_with("keyword,ie_type,created_at"));
    assert!(csv_text.contains("급여,income,"));

    let target = Database::in_memory().unwrap();
    target.save_keyword("급여", IeType::Income).unwrap();
    let stats = target.import_rules_csv(buf.as_slice()).unwrap();

    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.skipped, 1);
    assert_eq!(target.find_by_keyword("보험료").unwrap(), Some(IeType::Expense));
}

#[test]
fn test_import_accepts_korean_labels_and_rejects_unknown() {
    let db = Database::in_memory().unwrap();

    let ok = "keyword,ie_type\n캐시백, 소득\n요금,지출\n";
    let stats = db.import_rules_csv(ok.as_bytes()).unwrap();
    assert_eq!(stats.inserted, 2);
    assert_eq!(db.find_by_keyword("캐시백").unwrap(), Some(IeType::Income));

    let bad = "keyword,ie_type\n기타,maybe\n";
    assert!(db.import_rules_csv(bad.as_bytes()).is_err());

    let missing_column = "keyword\n기타\n";
    assert!(db.import_rules_csv(missing_column.as_bytes()).is_err());
}
