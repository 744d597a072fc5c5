//! Integration tests for ieclass-core
//!
//! These tests exercise the full classify → fall back → learn → hit workflow
//! against a real SQLite file.

use std::sync::Arc;

use ieclass_core::{
    AIClient, Database, HeuristicClassifier, HeuristicConfig, HybridClassifier, IeType, Method,
    MockBackend, ResolutionMethod, Resolver, RuleStore,
};

/// Pay slip with salary lines, deductions and noise
fn pay_slip() -> &'static str {
    "2024년 3월 급여명세서\n\
     성명: 홍길동\n\
     기본급: 2,800,000원\n\
     식대_수당: 200,000원\n\
     국민연금보험료: 126,000원\n\
     건강보험료: 99,260원\n\
     소득세: 84,850원\n\
     지방소득세: 8,480원\n\
     경조사비: 50,000원\n\
     실수령액: ₩2,631,410\n"
}

fn seeded_db(path: &std::path::Path) -> Database {
    let db = Database::new(&path.to_string_lossy()).expect("Failed to open database");
    db.seed_keywords([
        ("급여", IeType::Income),
        ("기본급", IeType::Income),
        ("보험료", IeType::Expense),
        ("소득세", IeType::Expense),
    ])
    .expect("Failed to seed keywords");
    db
}

// =============================================================================
// Orchestrator Workflow
// =============================================================================

#[test]
fn test_learn_back_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.db");

    {
        let db = Arc::new(seeded_db(&path));
        let hybrid = HybridClassifier::new(db.clone());

        let miss = hybrid.classify_item("경조사비", "50000", None);
        assert_eq!(miss.metadata.method, Method::NeedsExternal);

        assert!(hybrid
            .learn_from_external_result("경조사비", IeType::Expense)
            .unwrap());
        assert!(!hybrid
            .learn_from_external_result("경조사비", IeType::Expense)
            .unwrap());

        let stats = hybrid.get_statistics();
        assert_eq!(stats.total_processed, 1);
        assert_eq!(stats.fallback, 1);
        assert_eq!(stats.learned_keywords, 1);
    }

    // Fresh process view of the same file
    let db = Arc::new(Database::new(&path.to_string_lossy()).unwrap());
    assert_eq!(db.find_by_keyword("경조사비").unwrap(), Some(IeType::Expense));

    let hybrid = HybridClassifier::new(db);
    let hit = hybrid.classify_item("경조사비", "50000", None);
    assert_eq!(hit.metadata.method, Method::Exact);
    assert_eq!(hit.category.as_deref(), Some("지출"));
}

#[test]
fn test_two_orchestrators_share_store() {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(seeded_db(&dir.path().join("rules.db")));

    let a = HybridClassifier::new(db.clone());
    let b = HybridClassifier::new(db.clone());

    assert!(a.learn_from_external_result("교통비", IeType::Expense).unwrap());
    // b has not reloaded yet, but the store already knows the keyword
    assert!(!b.learn_from_external_result("교통비", IeType::Income).unwrap());

    assert!(b.exact().reload_keywords());
    assert_eq!(
        b.classify_item("교통비", "30000", None).ie_type,
        Some(IeType::Expense)
    );
}

// =============================================================================
// Resolver Workflow
// =============================================================================

#[tokio::test]
async fn test_resolve_pay_slip() {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(seeded_db(&dir.path().join("rules.db")));
    let hybrid = Arc::new(HybridClassifier::new(db.clone()));

    let heuristic = HeuristicClassifier::with_config(HeuristicConfig::embedded().unwrap());
    let resolver = Resolver::new(hybrid.clone())
        .with_heuristic(heuristic)
        .with_external(Arc::new(AIClient::Mock(MockBackend::new())));

    let resolutions = resolver
        .resolve_document(pay_slip(), Some("소득"))
        .await
        .unwrap();

    // Header and 성명 lines carry no amount
    assert_eq!(resolutions.len(), 8);
    assert!(resolutions.iter().all(|r| r.ie_type.is_some()));

    let by_field = |field: &str| {
        resolutions
            .iter()
            .find(|r| r.field == field)
            .unwrap_or_else(|| panic!("missing {}", field))
    };

    assert_eq!(by_field("기본급").method, ResolutionMethod::Exact);
    assert_eq!(by_field("기본급").amount, "2800000");
    assert_eq!(by_field("건강보험료").ie_type, Some(IeType::Expense));
    assert_eq!(by_field("지방소득세").method, ResolutionMethod::Exact);

    // high tier 수당 (0.35) + income hint (0.20)
    let allowance = by_field("식대 수당");
    assert_eq!(allowance.method, ResolutionMethod::Heuristic);
    assert_eq!(allowance.ie_type, Some(IeType::Income));
    assert!(allowance.learned);

    // No tier keyword; the mock labels it
    let gift = by_field("경조사비");
    assert_eq!(gift.method, ResolutionMethod::External);
    assert_eq!(gift.ie_type, Some(IeType::Expense));

    // A second pass resolves everything from the rules
    hybrid.reset_statistics();
    let again = resolver
        .resolve_document(pay_slip(), Some("소득"))
        .await
        .unwrap();
    assert!(again.iter().all(|r| r.method == ResolutionMethod::Exact));
    assert_eq!(hybrid.get_statistics().cost_saving_rate, 1.0);
}

#[tokio::test]
async fn test_resolver_without_learning_keeps_store() {
    let dir = tempfile::tempdir().unwrap();
    let db = Arc::new(seeded_db(&dir.path().join("rules.db")));
    let before = db.get_all_rules().unwrap().len();

    let resolver = Resolver::new(Arc::new(HybridClassifier::new(db.clone())))
        .with_external(Arc::new(MockBackend::fixed(IeType::Income)))
        .with_learning(false);

    let resolutions = resolver.resolve_document(pay_slip(), None).await.unwrap();
    assert!(resolutions.iter().all(|r| !r.learned));
    assert_eq!(db.get_all_rules().unwrap().len(), before);
}

// =============================================================================
// Rule Export / Import
// =============================================================================

#[test]
fn test_export_import_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let source = seeded_db(&dir.path().join("source.db"));

    let csv_path = dir.path().join("rules.csv");
    let file = std::fs::File::create(&csv_path).unwrap();
    assert_eq!(source.export_rules_csv(file).unwrap(), 4);

    let target = Database::new(&dir.path().join("target.db").to_string_lossy()).unwrap();
    let stats = target
        .import_rules_csv(std::fs::File::open(&csv_path).unwrap())
        .unwrap();
    assert_eq!(stats.inserted, 4);
    assert_eq!(stats.skipped, 0);

    let counts = target.count_rules().unwrap();
    assert_eq!(counts.income, 2);
    assert_eq!(counts.expense, 2);
}
