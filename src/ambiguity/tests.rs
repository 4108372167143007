#![allow(clippy::unwrap_used)]

use super::*;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

use crate::models::{Category, TxnType};

fn detector() -> AmbiguityDetector {
    AmbiguityDetector::new(&AmbiguityConfig::default()).0
}

fn make_txn(amount: Decimal, description: &str) -> Transaction {
    Transaction {
        id: String::new(),
        resource_identifier: "card".into(),
        statement_id: "stmt".into(),
        date: NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
        description: description.into(),
        merchant: description.into(),
        amount,
        kind: TxnType::Debit,
        category: Category::Other,
        raw_line: None,
        is_ambiguous: false,
        ambiguous_reasons: Vec::new(),
        needs_review: false,
    }
}

// ── Amount thresholds ─────────────────────────────────────────

#[test]
fn test_large_amount_flagged() {
    let reasons = detector().assess(dec!(150000.00), "150000.00", "", "CROMA");
    assert!(reasons.contains(&AmbiguityReason::SuspiciousAmount));
}

#[test]
fn test_small_amount_not_flagged() {
    let reasons = detector().assess(dec!(500.00), "500.00", "04/08/2025 CROMA 500.00", "CROMA");
    assert!(reasons.is_empty());
}

#[test]
fn test_round_thousands_above_floor() {
    let d = detector();
    assert!(d.assess(dec!(60000.00), "60000.00", "", "X").contains(&AmbiguityReason::SuspiciousAmount));
    assert!(d.assess(dec!(60001.00), "60001.00", "", "X").is_empty());
    assert!(d.assess(dec!(40000.00), "40000.00", "", "X").is_empty());
}

#[test]
fn test_long_plain_digits_flagged() {
    // 1234567 printed without a decimal point becomes 12345.67 after insertion.
    let reasons = detector().assess(dec!(12345.67), "1234567", "", "X");
    assert_eq!(reasons, vec![AmbiguityReason::SuspiciousAmount]);
    assert!(detector().assess(dec!(581.93), "58193", "", "X").is_empty());
}

// ── Raw line shapes ───────────────────────────────────────────

#[test]
fn test_two_decimal_amounts() {
    let reasons = detector().assess(dec!(192.00), "192.00", "SHOP 192.00 9.00", "SHOP");
    assert_eq!(reasons, vec![AmbiguityReason::MultipleAmounts]);
}

#[test]
fn test_dual_marker_shape() {
    let line = "04/08/2025FLIPKART,BANGLORE  DEPT STORES192 Dr9 Cr";
    let reasons = detector().assess(dec!(1.92), "192", line, "FLIPKART");
    assert!(reasons.contains(&AmbiguityReason::MultipleAmounts));
}

#[test]
fn test_concatenated_digits() {
    let line = "04/08/2025 AMAZON 7412589630045000";
    let reasons = detector().assess(dec!(450.00), "45000", line, "AMAZON");
    assert!(reasons.contains(&AmbiguityReason::ConcatenatedAmount));
}

#[test]
fn test_date_digits_not_concatenated() {
    assert_eq!(longest_digit_run("04/08/2025"), 4);
    assert_eq!(longest_digit_run("ab12345678cd"), 8);
    assert_eq!(longest_digit_run(""), 0);
}

#[test]
fn test_known_pattern() {
    let reasons = detector().assess(dec!(12.00), "12.00", "", "FUEL SURCHARGE WAIVER");
    assert_eq!(reasons, vec![AmbiguityReason::KnownPattern]);
}

#[test]
fn test_reasons_in_fixed_order() {
    let line = "04/08/2025 EMI CONVERSION 123456789 150000.00 Dr 10.00 Cr";
    let reasons = detector().assess(dec!(150000.00), "150000.00", line, "EMI CONVERSION");
    assert_eq!(
        reasons,
        vec![
            AmbiguityReason::SuspiciousAmount,
            AmbiguityReason::MultipleAmounts,
            AmbiguityReason::ConcatenatedAmount,
            AmbiguityReason::KnownPattern,
        ]
    );
}

// ── Config ────────────────────────────────────────────────────

#[test]
fn test_bad_pattern_reported() {
    let cfg = AmbiguityConfig {
        known_patterns: vec!["(unclosed".into(), "(?i)refund".into()],
        ..AmbiguityConfig::default()
    };
    let (d, bad) = AmbiguityDetector::new(&cfg);
    assert_eq!(bad, vec!["(unclosed".to_string()]);
    assert_eq!(
        d.assess(dec!(1.00), "1.00", "", "REFUND"),
        vec![AmbiguityReason::KnownPattern]
    );
}

#[test]
fn test_custom_threshold() {
    let cfg = AmbiguityConfig {
        max_amount: dec!(1000),
        ..AmbiguityConfig::default()
    };
    let (d, _) = AmbiguityDetector::new(&cfg);
    assert!(d.assess(dec!(1500.00), "1500.00", "", "X").contains(&AmbiguityReason::SuspiciousAmount));
}

// ── Annotate ──────────────────────────────────────────────────

#[test]
fn test_annotate_sets_flags() {
    let mut txn = make_txn(dec!(150000.00), "CROMA");
    detector().annotate(&mut txn, "04/08/2025 CROMA 150000.00", "150000.00", 0);
    assert!(txn.is_ambiguous);
    assert!(txn.needs_review);
    assert_eq!(txn.ambiguous_reason().as_deref(), Some("suspicious_amount"));
}

#[test]
fn test_annotate_clean_row() {
    let mut txn = make_txn(dec!(500.00), "CROMA");
    detector().annotate(&mut txn, "04/08/2025 CROMA 500.00", "500.00", 0);
    assert!(!txn.is_ambiguous);
    assert!(!txn.needs_review);
    assert!(txn.ambiguous_reasons.is_empty());
}

#[test]
fn test_annotate_competing_amount_column() {
    // A trailing points column the splitter passed over.
    let mut txn = make_txn(dec!(450.00), "SWIGGY");
    detector().annotate(&mut txn, "04/08/2025    SWIGGY    450.00    12", "450.00", 1);
    assert!(txn.needs_review);
    assert_eq!(txn.ambiguous_reasons, vec![AmbiguityReason::MultipleAmounts]);
}

#[test]
fn test_annotate_competing_amount_keeps_reason_order() {
    let mut txn = make_txn(dec!(150000.00), "CROMA");
    detector().annotate(&mut txn, "04/08/2025 CROMA 150000.00 Dr 12", "150000.00", 1);
    assert_eq!(
        txn.ambiguous_reasons,
        vec![AmbiguityReason::SuspiciousAmount, AmbiguityReason::MultipleAmounts]
    );
}
