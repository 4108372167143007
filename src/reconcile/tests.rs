#![allow(clippy::unwrap_used)]

use super::plan::RemediationOp;
use super::*;
use rust_decimal_macros::dec;

use crate::config::Config;
use crate::db::Database;
use crate::ident::assign_id;
use crate::models::Category;

fn ctx() -> StatementContext {
    StatementContext::new("s1", "card-1234")
}

fn make_txn(day: u32, description: &str, amount: Decimal) -> Transaction {
    let mut txn = Transaction {
        id: String::new(),
        resource_identifier: "card-1234".into(),
        statement_id: "s1".into(),
        date: NaiveDate::from_ymd_opt(2025, 8, day).unwrap(),
        description: description.into(),
        merchant: description.into(),
        amount,
        kind: TxnType::Debit,
        category: Category::Other,
        raw_line: None,
        is_ambiguous: false,
        ambiguous_reasons: Vec::new(),
        needs_review: false,
    };
    assign_id(&mut txn);
    txn
}

fn fresh_set() -> Vec<Transaction> {
    vec![
        make_txn(4, "SWIGGY", dec!(450.00)),
        make_txn(5, "UBER", dec!(212.40)),
        make_txn(6, "NETFLIX", dec!(649.00)),
    ]
}

// ── Partitions ────────────────────────────────────────────────

#[test]
fn test_no_drift() {
    let a = fresh_set();
    let report = reconcile(&ctx(), &a, &a);
    assert!(report.missing_in_db.is_empty());
    assert!(report.extra_in_db.is_empty());
    assert!(report.incorrect.is_empty());
    assert!(report.is_clean());
    assert!(plan_remediation(&report).is_none());
}

#[test]
fn test_one_extra() {
    let a = fresh_set();
    let mut b = a.clone();
    let stray = make_txn(7, "ZOMATO", dec!(300.00));
    b.push(stray.clone());

    let report = reconcile(&ctx(), &a, &b);
    assert_eq!(report.extra_in_db, vec![stray]);
    assert!(report.missing_in_db.is_empty());
    assert!(report.incorrect.is_empty());
}

#[test]
fn test_one_missing() {
    let a = fresh_set();
    let b = a[..2].to_vec();
    let report = reconcile(&ctx(), &a, &b);
    assert_eq!(report.missing_in_db, vec![a[2].clone()]);
    assert!(report.extra_in_db.is_empty());
}

#[test]
fn test_legacy_id_matches_by_content() {
    let a = fresh_set();
    let mut b = a.clone();
    b[0].id = "legacy-42".into();
    let report = reconcile(&ctx(), &a, &b);
    assert!(!report.has_drift());
}

#[test]
fn test_amount_scale_ignored_in_key() {
    let a = vec![make_txn(4, "SWIGGY", dec!(450.00))];
    let mut b = a.clone();
    b[0].amount = dec!(450);
    let report = reconcile(&ctx(), &a, &b);
    assert!(!report.has_drift());
}

#[test]
fn test_incorrect_by_id() {
    let a = fresh_set();
    let mut b = a.clone();
    b[1].category = Category::Food;
    b[1].merchant = "UBER EATS".into();
    let mut fresh = a.clone();
    fresh[1].category = Category::Transport;

    let report = reconcile(&ctx(), &fresh, &b);
    assert!(report.missing_in_db.is_empty());
    assert!(report.extra_in_db.is_empty());
    assert_eq!(report.incorrect.len(), 1);

    let record = &report.incorrect[0];
    assert_eq!(record.id, a[1].id);
    let fields: Vec<&str> = record.differences.iter().map(|d| d.field.as_str()).collect();
    assert_eq!(fields, vec!["merchant", "category"]);
    assert_eq!(record.differences[1].pdf_value, "Transport");
    assert_eq!(record.differences[1].db_value, "Food");
}

#[test]
fn test_report_carries_both_sets() {
    let a = fresh_set();
    let b = a[..1].to_vec();
    let report = reconcile(&ctx(), &a, &b);
    assert_eq!(report.pdf_transactions.len(), 3);
    assert_eq!(report.db_transactions.len(), 1);
    assert_eq!(report.statement_id, "s1");
    assert_eq!(report.resource_identifier, "card-1234");
}

// ── Plans ─────────────────────────────────────────────────────

#[test]
fn test_plan_orders_operations() {
    let a = fresh_set();
    let mut b = a[1..].to_vec();
    b[0].merchant = "UBER BV".into();
    b.push(make_txn(9, "STRAY", dec!(1.00)));

    let report = reconcile(&ctx(), &a, &b);
    let plan = plan_remediation(&report).unwrap();
    let kinds: Vec<&str> = plan
        .operations
        .iter()
        .map(|op| match op {
            RemediationOp::Add { .. } => "add",
            RemediationOp::Update { .. } => "update",
            RemediationOp::Remove { .. } => "remove",
        })
        .collect();
    assert_eq!(kinds, vec!["add", "update", "remove"]);
    assert_eq!(plan.statement_id, "s1");
}

#[test]
fn test_plan_json_shape() {
    let a = fresh_set();
    let report = reconcile(&ctx(), &a, &a[..2]);
    let plan = plan_remediation(&report).unwrap();
    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["operations"][0]["op"], "add");
    assert_eq!(json["operations"][0]["transaction"]["description"], "NETFLIX");

    let back: RemediationPlan = serde_json::from_value(json).unwrap();
    assert_eq!(back, plan);
}

#[test]
fn test_plan_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s1.plan.json");
    let a = fresh_set();
    let plan = plan_remediation(&reconcile(&ctx(), &a, &[])).unwrap();
    plan.save(&path).unwrap();
    assert_eq!(RemediationPlan::load(&path).unwrap(), plan);
}

// ── Apply ─────────────────────────────────────────────────────

fn seeded_store(txns: &[Transaction]) -> Database {
    let mut db = Database::open_in_memory().unwrap();
    db.insert_transactions_batch(txns).unwrap();
    db
}

#[test]
fn test_apply_holds_back_removals() {
    let a = fresh_set();
    let mut b = a[1..].to_vec();
    b.push(make_txn(9, "STRAY", dec!(1.00)));
    let mut db = seeded_store(&b);

    let report = reconcile(&ctx(), &a, &db.transactions_for_statement("s1").unwrap());
    let plan = plan_remediation(&report).unwrap();
    let summary = apply_plan(&plan, &mut db, &ApplyOptions::default()).unwrap();

    assert_eq!(summary.added, 1);
    assert_eq!(summary.removed, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(db.transactions_for_statement("s1").unwrap().len(), 4);
}

#[test]
fn test_apply_with_confirmed_removals() {
    let a = fresh_set();
    let mut b = a.clone();
    b.push(make_txn(9, "STRAY", dec!(1.00)));
    let mut db = seeded_store(&b);

    let report = reconcile(&ctx(), &a, &db.transactions_for_statement("s1").unwrap());
    let plan = plan_remediation(&report).unwrap();
    let opts = ApplyOptions {
        confirm_removals: true,
        only: None,
    };
    let summary = apply_plan(&plan, &mut db, &opts).unwrap();
    assert_eq!(summary.removed, 1);

    let after = reconcile(&ctx(), &a, &db.transactions_for_statement("s1").unwrap());
    assert!(after.is_clean());
}

#[test]
fn test_apply_selected_operations_only() {
    let a = fresh_set();
    let mut db = seeded_store(&[]);
    let plan = plan_remediation(&reconcile(&ctx(), &a, &[])).unwrap();
    assert_eq!(plan.operations.len(), 3);

    let opts = ApplyOptions {
        confirm_removals: false,
        only: Some(vec![1, 3]),
    };
    let summary = apply_plan(&plan, &mut db, &opts).unwrap();
    assert_eq!(summary.added, 2);
    assert_eq!(summary.skipped, 1);
    let stored: Vec<String> = db
        .transactions_for_statement("s1")
        .unwrap()
        .into_iter()
        .map(|t| t.description)
        .collect();
    assert_eq!(stored, vec!["SWIGGY", "NETFLIX"]);
}

#[test]
fn test_apply_update_and_rerun_is_noop() {
    let a = fresh_set();
    let mut stale = a.clone();
    stale[0].category = Category::Shopping;
    let mut db = seeded_store(&stale);

    let report = reconcile(&ctx(), &a, &db.transactions_for_statement("s1").unwrap());
    let plan = plan_remediation(&report).unwrap();
    let first = apply_plan(&plan, &mut db, &ApplyOptions::default()).unwrap();
    assert_eq!(first.updated, 1);
    assert_eq!(
        db.get_transaction(&a[0].id).unwrap().unwrap().category,
        Category::Other
    );

    let again = reconcile(&ctx(), &a, &db.transactions_for_statement("s1").unwrap());
    assert!(plan_remediation(&again).is_none());
}

// ── End to end ────────────────────────────────────────────────

const STATEMENT: &str = "\
Transaction Details
04/08/2025    SWIGGY BANGALORE    450.00
05/08/2025    UBER INDIA          212.40
";

#[test]
fn test_validate_statement_against_store() {
    let extractor = Extractor::new(&Config::default());
    let mut db = Database::open_in_memory().unwrap();

    let report = validate_statement(&extractor, STATEMENT, &ctx(), &db).unwrap();
    assert_eq!(report.missing_in_db.len(), 2);

    let plan = plan_remediation(&report).unwrap();
    apply_plan(&plan, &mut db, &ApplyOptions::default()).unwrap();

    let report = validate_statement(&extractor, STATEMENT, &ctx(), &db).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.skipped_lines, 0);
}

#[test]
fn test_validate_failed_extraction_reports_error() {
    let extractor = Extractor::new(&Config::default());
    let db = seeded_store(&fresh_set());

    let report = validate_statement(&extractor, "", &ctx(), &db).unwrap();
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].contains("s1"));
    assert_eq!(report.db_transactions.len(), 3);
    assert!(report.extra_in_db.is_empty());
    assert!(plan_remediation(&report).is_none());
}
