#![allow(clippy::unwrap_used)]

use super::*;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

use crate::models::TxnType;

fn make_rules(entries: &[(Category, &[&str])]) -> CategoryRules {
    CategoryRules {
        rules: entries
            .iter()
            .map(|(c, kws)| CategoryRule::new(*c, kws))
            .collect(),
    }
}

fn make_txn(desc: &str, merchant: &str) -> Transaction {
    Transaction {
        id: String::new(),
        resource_identifier: "card".into(),
        statement_id: "stmt".into(),
        date: NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
        description: desc.into(),
        merchant: merchant.into(),
        amount: dec!(10.00),
        kind: TxnType::Debit,
        category: Category::Other,
        raw_line: None,
        is_ambiguous: false,
        ambiguous_reasons: Vec::new(),
        needs_review: false,
    }
}

// ── Default table ─────────────────────────────────────────────

#[test]
fn test_swiggy_is_food() {
    let cat = Categorizer::new(&CategoryRules::default());
    assert_eq!(cat.categorize("SWIGGY BANGALORE"), Category::Food);
}

#[test]
fn test_unknown_merchant_is_other() {
    let cat = Categorizer::new(&CategoryRules::default());
    assert_eq!(cat.categorize("RANDOM TRADERS PVT LTD"), Category::Other);
}

#[test]
fn test_default_table_samples() {
    let cat = Categorizer::new(&CategoryRules::default());
    assert_eq!(cat.categorize("NETFLIX.COM MUMBAI"), Category::Entertainment);
    assert_eq!(cat.categorize("UBER INDIA SYSTEMS"), Category::Transport);
    assert_eq!(cat.categorize("AIRTEL PAYMENTS"), Category::Bills);
    assert_eq!(cat.categorize("APOLLO PHARMACY"), Category::Health);
    assert_eq!(cat.categorize("MAKEMYTRIP INDIA"), Category::Travel);
    assert_eq!(cat.categorize("BIGBASKET BANGALORE"), Category::Groceries);
    assert_eq!(cat.categorize("UDEMY ONLINE"), Category::Education);
    assert_eq!(cat.categorize("FLIPKART,BANGLORE DEPT STORES"), Category::Shopping);
}

#[test]
fn test_default_table_specific_before_general() {
    let cat = Categorizer::new(&CategoryRules::default());
    // Groceries precede Food, so the grocery arm of a food app wins.
    assert_eq!(cat.categorize("SWIGGY INSTAMART"), Category::Groceries);
}

#[test]
fn test_default_table_avoids_short_substrings() {
    let cat = Categorizer::new(&CategoryRules::default());
    assert_eq!(cat.categorize("PUBLIC WORKS DEPT"), Category::Other);
    assert_eq!(cat.categorize("COCA COLA DISTRIBUTOR"), Category::Other);
}

// ── Categorizer ───────────────────────────────────────────────

#[test]
fn test_categorize_case_insensitive() {
    let cat = Categorizer::new(&make_rules(&[(Category::Food, &["Coffee"])]));
    assert_eq!(cat.categorize("Coffee Shop"), Category::Food);
    assert_eq!(cat.categorize("COFFEE SHOP"), Category::Food);
    assert_eq!(cat.categorize("coffee shop"), Category::Food);
}

#[test]
fn test_categorize_first_match_wins() {
    let cat = Categorizer::new(&make_rules(&[
        (Category::Shopping, &["shop"]),
        (Category::Food, &["coffee shop"]),
    ]));
    assert_eq!(cat.categorize("Coffee Shop"), Category::Shopping);
}

#[test]
fn test_categorize_empty_rules() {
    let cat = Categorizer::new(&CategoryRules { rules: Vec::new() });
    assert_eq!(cat.categorize("anything"), Category::Other);
}

#[test]
fn test_blank_keyword_ignored() {
    let cat = Categorizer::new(&make_rules(&[(Category::Bills, &["", "  "])]));
    assert_eq!(cat.categorize("anything"), Category::Other);
}

// ── Keyword boundaries ────────────────────────────────────────

#[test]
fn test_keyword_inside_word_does_not_match() {
    let cat = Categorizer::new(&CategoryRules::default());
    assert_eq!(cat.categorize("TOYOTA SERVICE CENTRE"), Category::Other);
    assert_eq!(cat.categorize("SHELLAC FURNITURE"), Category::Other);
    assert_eq!(cat.categorize("METROPOLIS LABS"), Category::Other);
    assert_eq!(cat.categorize("STEAMBOAT GRILL HOUSE"), Category::Other);
}

#[test]
fn test_short_keyword_as_whole_word() {
    let cat = Categorizer::new(&CategoryRules::default());
    assert_eq!(cat.categorize("OYO ROOMS DELHI"), Category::Travel);
    assert_eq!(cat.categorize("SHELL PETROL PUMP"), Category::Transport);
    assert_eq!(cat.categorize("DELHI METRO RAIL"), Category::Transport);
    assert_eq!(cat.categorize("STEAM PURCHASE"), Category::Entertainment);
    assert_eq!(cat.categorize("UPI/OYO/123"), Category::Travel);
}

#[test]
fn test_long_keyword_may_run_into_next_word() {
    let cat = Categorizer::new(&CategoryRules::default());
    assert_eq!(cat.categorize("WWW.SWIGGYINSTAMART.IN"), Category::Food);
    assert_eq!(cat.categorize("AMAZONPAY INDIA"), Category::Shopping);
    assert_eq!(cat.categorize("XAMAZON"), Category::Other);
}

#[test]
fn test_merchant_checked_before_description() {
    let cat = Categorizer::new(&CategoryRules::default());
    assert_eq!(
        cat.categorize_transaction("UBER", "UPI/UBER/STARBUCKS VOUCHER"),
        Category::Transport
    );
    assert_eq!(
        cat.categorize_transaction("PAYU", "PAYU*SWIGGY ORDER"),
        Category::Food
    );
}

// ── Batch categorization ──────────────────────────────────────

#[test]
fn test_categorize_batch() {
    let cat = Categorizer::new(&CategoryRules::default());
    let mut txns = vec![
        make_txn("SWIGGY BANGALORE", "SWIGGY BANGALORE"),
        make_txn("NETFLIX.COM", "NETFLIX.COM"),
        make_txn("UNKNOWN MERCHANT", "UNKNOWN MERCHANT"),
    ];
    cat.categorize_batch(&mut txns);
    assert_eq!(txns[0].category, Category::Food);
    assert_eq!(txns[1].category, Category::Entertainment);
    assert_eq!(txns[2].category, Category::Other);
}

#[test]
fn test_categorize_batch_preserves_existing() {
    let cat = Categorizer::new(&CategoryRules::default());
    let mut txns = vec![make_txn("SWIGGY", "SWIGGY")];
    txns[0].category = Category::Health;
    cat.categorize_batch(&mut txns);
    assert_eq!(txns[0].category, Category::Health);
}
