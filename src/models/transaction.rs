use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Category;

/// Direction of a line item: a charge (`Dr`) or a refund/payment (`Cr`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnType {
    Debit,
    Credit,
}

impl TxnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "debit" | "dr" => Some(Self::Debit),
            "credit" | "cr" => Some(Self::Credit),
            _ => None,
        }
    }
}

impl std::fmt::Display for TxnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityReason {
    SuspiciousAmount,
    MultipleAmounts,
    ConcatenatedAmount,
    KnownPattern,
}

impl AmbiguityReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuspiciousAmount => "suspicious_amount",
            Self::MultipleAmounts => "multiple_amounts",
            Self::ConcatenatedAmount => "concatenated_amount",
            Self::KnownPattern => "known_pattern",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "suspicious_amount" => Some(Self::SuspiciousAmount),
            "multiple_amounts" => Some(Self::MultipleAmounts),
            "concatenated_amount" => Some(Self::ConcatenatedAmount),
            "known_pattern" => Some(Self::KnownPattern),
            _ => None,
        }
    }
}

impl std::fmt::Display for AmbiguityReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub resource_identifier: String,
    pub statement_id: String,
    pub date: NaiveDate,
    pub description: String,
    pub merchant: String,
    /// Always non-negative; direction lives in `kind`.
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TxnType,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_line: Option<String>,
    #[serde(default)]
    pub is_ambiguous: bool,
    #[serde(default, rename = "ambiguousReason", skip_serializing_if = "Vec::is_empty")]
    pub ambiguous_reasons: Vec<AmbiguityReason>,
    #[serde(default)]
    pub needs_review: bool,
}

impl Transaction {
    pub fn is_credit(&self) -> bool {
        self.kind == TxnType::Credit
    }

    pub fn is_debit(&self) -> bool {
        self.kind == TxnType::Debit
    }

    /// Amount with the sign restored: charges negative, refunds positive.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TxnType::Debit => -self.amount,
            TxnType::Credit => self.amount,
        }
    }

    /// Comma-joined reason tags, e.g. `suspicious_amount,multiple_amounts`.
    pub fn ambiguous_reason(&self) -> Option<String> {
        if self.ambiguous_reasons.is_empty() {
            return None;
        }
        let tags: Vec<&str> = self.ambiguous_reasons.iter().map(|r| r.as_str()).collect();
        Some(tags.join(","))
    }
}
