mod plan;

pub(crate) use plan::{apply_plan, plan_remediation, ApplyOptions, RemediationPlan};

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};

use crate::db::TransactionStore;
use crate::error::StatementError;
use crate::extract::{Extractor, StatementContext};
use crate::models::{FieldDiff, IncorrectRecord, Transaction, TxnType, ValidationReport};

/// Content identity, independent of `id`, so records stored before the id
/// scheme settled still pair up.
type ContentKey = (NaiveDate, String, Decimal, TxnType);

fn content_key(txn: &Transaction) -> ContentKey {
    (
        txn.date,
        txn.description.clone(),
        txn.amount.normalize(),
        txn.kind,
    )
}

fn diff_fields(pdf: &Transaction, db: &Transaction) -> Vec<FieldDiff> {
    let mut diffs = Vec::new();
    let mut check = |field: &str, pdf_value: String, db_value: String| {
        if pdf_value != db_value {
            diffs.push(FieldDiff {
                field: field.to_string(),
                pdf_value,
                db_value,
            });
        }
    };

    check(
        "resourceIdentifier",
        pdf.resource_identifier.clone(),
        db.resource_identifier.clone(),
    );
    check("statementId", pdf.statement_id.clone(), db.statement_id.clone());
    check("date", pdf.date.to_string(), db.date.to_string());
    check("description", pdf.description.clone(), db.description.clone());
    check("merchant", pdf.merchant.clone(), db.merchant.clone());
    check("amount", format!("{:.2}", pdf.amount), format!("{:.2}", db.amount));
    check("type", pdf.kind.to_string(), db.kind.to_string());
    check("category", pdf.category.to_string(), db.category.to_string());
    diffs
}

/// Three-way diff of a freshly extracted statement against what the store holds.
pub(crate) fn reconcile(
    ctx: &StatementContext,
    extracted: &[Transaction],
    persisted: &[Transaction],
) -> ValidationReport {
    let extracted_keys: HashSet<ContentKey> = extracted.iter().map(content_key).collect();
    let persisted_keys: HashSet<ContentKey> = persisted.iter().map(content_key).collect();

    let missing_in_db: Vec<Transaction> = extracted
        .iter()
        .filter(|t| !persisted_keys.contains(&content_key(t)))
        .cloned()
        .collect();
    let extra_in_db: Vec<Transaction> = persisted
        .iter()
        .filter(|t| !extracted_keys.contains(&content_key(t)))
        .cloned()
        .collect();

    let persisted_by_id: HashMap<&str, &Transaction> =
        persisted.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut seen = HashSet::new();
    let incorrect: Vec<IncorrectRecord> = extracted
        .iter()
        .filter(|t| seen.insert(t.id.as_str()))
        .filter_map(|pdf| {
            let db = persisted_by_id.get(pdf.id.as_str())?;
            let differences = diff_fields(pdf, db);
            (!differences.is_empty()).then(|| IncorrectRecord {
                id: pdf.id.clone(),
                pdf: pdf.clone(),
                db: (*db).clone(),
                differences,
            })
        })
        .collect();

    ValidationReport {
        statement_id: ctx.statement_id.clone(),
        resource_identifier: ctx.resource_identifier.clone(),
        period: ctx.period,
        pdf_transactions: extracted.to_vec(),
        db_transactions: persisted.to_vec(),
        missing_in_db,
        extra_in_db,
        incorrect,
        errors: Vec::new(),
        skipped_lines: 0,
        generated_at: Utc::now(),
    }
}

/// Report for a statement whose extraction failed. Nothing is partitioned:
/// without a fresh set, every stored row would look extra.
pub(crate) fn failed_report(
    ctx: &StatementContext,
    persisted: Vec<Transaction>,
    error: &StatementError,
) -> ValidationReport {
    ValidationReport {
        statement_id: ctx.statement_id.clone(),
        resource_identifier: ctx.resource_identifier.clone(),
        period: ctx.period,
        pdf_transactions: Vec::new(),
        db_transactions: persisted,
        missing_in_db: Vec::new(),
        extra_in_db: Vec::new(),
        incorrect: Vec::new(),
        errors: vec![error.to_string()],
        skipped_lines: 0,
        generated_at: Utc::now(),
    }
}

/// Extract `text` and diff it against the store. A statement-level failure
/// lands in `errors` instead of aborting; only store errors propagate.
pub(crate) fn validate_statement(
    extractor: &Extractor,
    text: &str,
    ctx: &StatementContext,
    store: &dyn TransactionStore,
) -> Result<ValidationReport> {
    let persisted = store.transactions_for_statement(&ctx.statement_id)?;
    let report = match extractor.extract(text, ctx) {
        Ok(extraction) => ValidationReport {
            skipped_lines: extraction.skipped_lines + extraction.discarded_rows,
            ..reconcile(ctx, &extraction.transactions, &persisted)
        },
        Err(e) => {
            log::error!("{}: {e}", ctx.statement_id);
            failed_report(ctx, persisted, &e)
        }
    };
    log::info!("{}", report.summary());
    Ok(report)
}

#[cfg(test)]
mod tests;
