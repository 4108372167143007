use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl StatementPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Where a statement's plaintext comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementSource {
    /// Text already recovered by an upstream tool.
    Text(PathBuf),
    /// Password-protected statement PDF.
    Pdf { path: PathBuf, password: String },
}

/// One statement handed to the pipeline by the caller.
#[derive(Debug, Clone)]
pub struct StatementInput {
    pub statement_id: String,
    pub resource_identifier: String,
    pub period: Option<StatementPeriod>,
    /// Bank name forced by the caller; detection runs when absent.
    pub bank: Option<String>,
    pub source: StatementSource,
}

impl StatementInput {
    pub fn from_text_file(path: PathBuf, resource: &str, statement_id: &str) -> Self {
        Self {
            statement_id: statement_id.to_string(),
            resource_identifier: resource.to_string(),
            period: None,
            bank: None,
            source: StatementSource::Text(path),
        }
    }
}
