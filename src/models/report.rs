use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{StatementPeriod, Transaction};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDiff {
    pub field: String,
    /// Value as extracted from the statement.
    pub pdf_value: String,
    /// Value currently persisted.
    pub db_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncorrectRecord {
    pub id: String,
    pub pdf: Transaction,
    pub db: Transaction,
    pub differences: Vec<FieldDiff>,
}

/// Outcome of one reconciliation run for one statement. Built once, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub statement_id: String,
    pub resource_identifier: String,
    pub period: Option<StatementPeriod>,
    pub pdf_transactions: Vec<Transaction>,
    pub db_transactions: Vec<Transaction>,
    #[serde(rename = "missingInDB")]
    pub missing_in_db: Vec<Transaction>,
    #[serde(rename = "extraInDB")]
    pub extra_in_db: Vec<Transaction>,
    pub incorrect: Vec<IncorrectRecord>,
    pub errors: Vec<String>,
    /// Candidate lines that produced no transaction.
    #[serde(default)]
    pub skipped_lines: usize,
    pub generated_at: DateTime<Utc>,
}

impl ValidationReport {
    pub fn has_drift(&self) -> bool {
        !self.missing_in_db.is_empty() || !self.extra_in_db.is_empty() || !self.incorrect.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        !self.has_drift() && self.errors.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}: {} in statement, {} stored, {} missing, {} extra, {} incorrect, {} errors",
            self.statement_id,
            self.pdf_transactions.len(),
            self.db_transactions.len(),
            self.missing_in_db.len(),
            self.extra_in_db.len(),
            self.incorrect.len(),
            self.errors.len(),
        )
    }
}
