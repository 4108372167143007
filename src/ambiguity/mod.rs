use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::models::{AmbiguityReason, Transaction};

/// Thresholds and curated patterns for routing rows to manual review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AmbiguityConfig {
    /// Anything above this is suspicious outright.
    pub(crate) max_amount: Decimal,
    /// Round thousands above this are suspicious.
    pub(crate) round_amount_floor: Decimal,
    pub(crate) round_multiple: Decimal,
    /// Longest digit string printed without a decimal point that is trusted.
    pub(crate) max_plain_digits: usize,
    /// A digit run this long in the raw line means columns ran together.
    pub(crate) concatenated_digits: usize,
    /// Regexes matched against the description.
    pub(crate) known_patterns: Vec<String>,
}

impl Default for AmbiguityConfig {
    fn default() -> Self {
        Self {
            max_amount: Decimal::from(100_000),
            round_amount_floor: Decimal::from(50_000),
            round_multiple: Decimal::from(1_000),
            max_plain_digits: 6,
            concatenated_digits: 8,
            known_patterns: vec![
                r"(?i)\bEMI\b.*\bCONV".into(),
                r"(?i)FUEL SURCHARGE WAIVER".into(),
                r"(?i)\bREVERSAL\b".into(),
            ],
        }
    }
}

#[allow(clippy::expect_used)]
fn decimal_amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d[\d,]*\.\d{2}").expect("decimal amount regex"))
}

#[allow(clippy::expect_used)]
fn dual_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\d[\d,]*(?:\.\d{1,2})?\s*Dr\s*\d[\d,]*(?:\.\d{1,2})?\s*Cr")
            .expect("dual marker regex")
    })
}

fn longest_digit_run(s: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in s.chars() {
        if c.is_ascii_digit() {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

pub(crate) struct AmbiguityDetector {
    max_amount: Decimal,
    round_amount_floor: Decimal,
    round_multiple: Decimal,
    max_plain_digits: usize,
    concatenated_digits: usize,
    known: Vec<Regex>,
}

impl AmbiguityDetector {
    /// Returns the detector and any known patterns that failed to compile.
    /// Bad patterns are left out rather than failing the run.
    pub(crate) fn new(cfg: &AmbiguityConfig) -> (Self, Vec<String>) {
        let mut bad_patterns = Vec::new();
        let known = cfg
            .known_patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(_) => {
                    bad_patterns.push(p.clone());
                    None
                }
            })
            .collect();

        (
            Self {
                max_amount: cfg.max_amount,
                round_amount_floor: cfg.round_amount_floor,
                round_multiple: cfg.round_multiple,
                max_plain_digits: cfg.max_plain_digits,
                concatenated_digits: cfg.concatenated_digits,
                known,
            },
            bad_patterns,
        )
    }

    fn is_suspicious_amount(&self, amount: Decimal, printed_digits: &str) -> bool {
        if amount > self.max_amount {
            return true;
        }
        if amount > self.round_amount_floor
            && !self.round_multiple.is_zero()
            && (amount % self.round_multiple).is_zero()
        {
            return true;
        }
        !printed_digits.contains('.') && printed_digits.len() > self.max_plain_digits
    }

    fn has_multiple_amounts(line: &str) -> bool {
        decimal_amount_re().find_iter(line).count() >= 2 || dual_marker_re().is_match(line)
    }

    /// Reasons in a fixed order; empty means the row is trusted.
    ///
    /// `printed_digits` is the amount as printed, before decimal insertion.
    pub(crate) fn assess(
        &self,
        amount: Decimal,
        printed_digits: &str,
        line: &str,
        description: &str,
    ) -> Vec<AmbiguityReason> {
        let mut reasons = Vec::new();
        if self.is_suspicious_amount(amount, printed_digits) {
            reasons.push(AmbiguityReason::SuspiciousAmount);
        }
        if Self::has_multiple_amounts(line) {
            reasons.push(AmbiguityReason::MultipleAmounts);
        }
        if longest_digit_run(line) >= self.concatenated_digits {
            reasons.push(AmbiguityReason::ConcatenatedAmount);
        }
        if self.known.iter().any(|re| re.is_match(description)) {
            reasons.push(AmbiguityReason::KnownPattern);
        }
        reasons
    }

    /// Set the review flags on a parsed transaction. Flagged rows are kept.
    ///
    /// `competing_amounts` counts amount-shaped columns the row splitter
    /// passed over; any at all means `multiple_amounts`.
    pub(crate) fn annotate(
        &self,
        txn: &mut Transaction,
        line: &str,
        printed_digits: &str,
        competing_amounts: usize,
    ) {
        let mut reasons = self.assess(txn.amount, printed_digits, line, &txn.description);
        if competing_amounts > 0 && !reasons.contains(&AmbiguityReason::MultipleAmounts) {
            let at = usize::from(reasons.first() == Some(&AmbiguityReason::SuspiciousAmount));
            reasons.insert(at, AmbiguityReason::MultipleAmounts);
        }
        if !reasons.is_empty() {
            log::warn!(
                "{} {} {:.2}: flagged for review ({})",
                txn.date,
                txn.description,
                txn.amount,
                reasons.iter().map(|r| r.as_str()).collect::<Vec<_>>().join(",")
            );
        }
        txn.is_ambiguous = !reasons.is_empty();
        txn.needs_review = txn.is_ambiguous;
        txn.ambiguous_reasons = reasons;
    }
}

#[cfg(test)]
mod tests;
