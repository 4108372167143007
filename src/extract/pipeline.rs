use serde::Serialize;

use super::banks::{parser_for, BankParser};
use super::detect::{default_signatures, detect_bank, Bank, BankSignature};
use super::fields::extract_merchant;
use super::rows::{assemble_row, RowFields, RowReject};
use super::table::scan_table;
use crate::ambiguity::AmbiguityDetector;
use crate::categorize::Categorizer;
use crate::config::{Config, ExtractSection};
use crate::error::StatementError;
use crate::ident::assign_id;
use crate::models::{StatementInput, StatementPeriod, Transaction};

/// Who a statement belongs to. The period is context only; rows outside it
/// are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatementContext {
    pub(crate) statement_id: String,
    pub(crate) resource_identifier: String,
    pub(crate) period: Option<StatementPeriod>,
    /// Skip detection and use this layout.
    pub(crate) bank: Option<Bank>,
}

impl StatementContext {
    pub(crate) fn new(statement_id: &str, resource_identifier: &str) -> Self {
        Self {
            statement_id: statement_id.to_string(),
            resource_identifier: resource_identifier.to_string(),
            period: None,
            bank: None,
        }
    }

    pub(crate) fn from_input(input: &StatementInput) -> Result<Self, StatementError> {
        let bank = match input.bank.as_deref() {
            Some(name) => {
                Some(Bank::parse(name).ok_or_else(|| StatementError::UnknownBank(name.to_string()))?)
            }
            None => None,
        };
        Ok(Self {
            statement_id: input.statement_id.clone(),
            resource_identifier: input.resource_identifier.clone(),
            period: input.period,
            bank,
        })
    }
}

/// Everything one statement produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Extraction {
    pub(crate) bank: Bank,
    pub(crate) transactions: Vec<Transaction>,
    /// Candidate lines no strategy could turn into a row.
    pub(crate) skipped_lines: usize,
    /// Rows with a date or amount that would not normalize.
    pub(crate) discarded_rows: usize,
}

impl Extraction {
    pub(crate) fn flagged(&self) -> usize {
        self.transactions.iter().filter(|t| t.needs_review).count()
    }
}

pub(crate) struct Extractor {
    settings: ExtractSection,
    categorizer: Categorizer,
    ambiguity: AmbiguityDetector,
    signatures: Vec<BankSignature>,
}

impl Extractor {
    pub(crate) fn new(config: &Config) -> Self {
        let (ambiguity, bad_patterns) = AmbiguityDetector::new(&config.ambiguity);
        if !bad_patterns.is_empty() {
            log::warn!("ignoring invalid ambiguity pattern(s): {}", bad_patterns.join(", "));
        }
        let extractor = Self {
            settings: config.extract.clone(),
            categorizer: Categorizer::new(&config.categories),
            ambiguity,
            signatures: default_signatures(),
        };
        if config.extract.signatures.is_empty() {
            extractor
        } else {
            extractor.with_signatures(config.extract.signatures.clone())
        }
    }

    /// Replace the built-in detection phrases. Phrases match case-insensitively.
    pub(crate) fn with_signatures(mut self, signatures: Vec<BankSignature>) -> Self {
        self.signatures = signatures
            .into_iter()
            .map(|sig| BankSignature {
                phrases: sig.phrases.iter().map(|p| p.to_lowercase()).collect(),
                ..sig
            })
            .collect();
        self
    }

    pub(crate) fn detect(&self, text: &str) -> Bank {
        detect_bank(text, &self.signatures)
    }

    /// Text of one statement in, its transactions out, in statement order.
    ///
    /// Bad lines are counted and skipped; only an empty statement or one that
    /// yields nothing at all is an error.
    pub(crate) fn extract(&self, text: &str, ctx: &StatementContext) -> Result<Extraction, StatementError> {
        if text.trim().is_empty() {
            return Err(StatementError::EmptyText(ctx.statement_id.clone()));
        }

        let parser = parser_for(ctx.bank.unwrap_or_else(|| self.detect(text)));
        let bank = parser.bank();
        let scan = scan_table(text, &parser.markers());
        log::debug!(
            "{}: bank {bank}, {} candidate lines from the {}, {} headers skipped",
            ctx.statement_id,
            scan.rows.len(),
            if scan.found_table { "table" } else { "whole text" },
            scan.headers_skipped
        );

        let mut transactions = Vec::new();
        let mut skipped_lines = 0;
        let mut discarded_rows = 0;

        for line in &scan.rows {
            match self.parse_line(parser.as_ref(), line, ctx) {
                Ok(txn) => transactions.push(txn),
                Err(RowReject::Field(e)) => {
                    log::warn!("{}: discarded row, {e}: {line}", ctx.statement_id);
                    discarded_rows += 1;
                }
                Err(reason) => {
                    log::debug!("{}: skipped line ({reason:?}): {line}", ctx.statement_id);
                    skipped_lines += 1;
                }
            }
        }

        if transactions.is_empty() {
            return Err(StatementError::NoTransactions {
                statement_id: ctx.statement_id.clone(),
                skipped: skipped_lines + discarded_rows,
            });
        }

        if let Some(period) = ctx.period {
            let outside = transactions.iter().filter(|t| !period.contains(t.date)).count();
            if outside > 0 {
                log::debug!(
                    "{}: {outside} transaction(s) dated outside {} to {}",
                    ctx.statement_id,
                    period.start,
                    period.end
                );
            }
        }

        let extraction = Extraction {
            bank,
            transactions,
            skipped_lines,
            discarded_rows,
        };
        log::info!(
            "{}: {} transactions ({} flagged), {} lines skipped, {} rows discarded",
            ctx.statement_id,
            extraction.transactions.len(),
            extraction.flagged(),
            skipped_lines,
            discarded_rows
        );
        Ok(extraction)
    }

    /// One candidate line to one transaction. `Err` means the line is not
    /// kept; the reason tells a skipped line from a discarded row.
    pub(crate) fn parse_line(
        &self,
        parser: &dyn BankParser,
        line: &str,
        ctx: &StatementContext,
    ) -> Result<Transaction, RowReject> {
        let cleaned = parser.clean_line(line);
        let row = parser.split(line);
        let RowFields {
            date,
            description,
            amount,
            competing_amounts,
        } = assemble_row(&row, self.settings.decimal_insertion)?;

        let merchant = extract_merchant(&description);
        let category = self.categorizer.categorize_transaction(&merchant, &description);

        let mut txn = Transaction {
            id: String::new(),
            resource_identifier: ctx.resource_identifier.clone(),
            statement_id: ctx.statement_id.clone(),
            date,
            description,
            merchant,
            amount: amount.value,
            kind: amount.kind,
            category,
            raw_line: self.settings.keep_raw_line.then(|| line.trim().to_string()),
            is_ambiguous: false,
            ambiguous_reasons: Vec::new(),
            needs_review: false,
        };
        if amount.decimal_inserted {
            log::debug!("{}: read {} as {}", ctx.statement_id, amount.digits, amount.value);
        }
        self.ambiguity.annotate(&mut txn, &cleaned, &amount.digits, competing_amounts);
        assign_id(&mut txn);
        Ok(txn)
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
