use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::db::TransactionStore;
use crate::models::{FieldDiff, Transaction, ValidationReport};

/// One reviewable fix. Plans are data; nothing runs until `apply_plan`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub(crate) enum RemediationOp {
    Add {
        transaction: Transaction,
    },
    Update {
        id: String,
        changes: Vec<FieldDiff>,
        transaction: Transaction,
    },
    Remove {
        transaction: Transaction,
    },
}

impl RemediationOp {
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::Add { transaction: t } => format!(
                "add     {} {} {:.2} {} ({})",
                t.date, t.description, t.amount, t.kind, t.id
            ),
            Self::Update { id, changes, .. } => {
                let fields: Vec<String> = changes
                    .iter()
                    .map(|c| format!("{}: '{}' -> '{}'", c.field, c.db_value, c.pdf_value))
                    .collect();
                format!("update  {id} {}", fields.join(", "))
            }
            Self::Remove { transaction: t } => format!(
                "remove  {} {} {:.2} {} ({})",
                t.date, t.description, t.amount, t.kind, t.id
            ),
        }
    }

    pub(crate) fn is_remove(&self) -> bool {
        matches!(self, Self::Remove { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RemediationPlan {
    pub(crate) statement_id: String,
    pub(crate) resource_identifier: String,
    pub(crate) generated_at: DateTime<Utc>,
    pub(crate) operations: Vec<RemediationOp>,
}

impl RemediationPlan {
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parse plan {}", path.display()))
    }

    pub(crate) fn save(&self, path: &Path) -> Result<()> {
        let s = serde_json::to_string_pretty(self).context("serialize plan")?;
        fs::write(path, s).with_context(|| format!("write {}", path.display()))
    }
}

/// Adds, then updates, then removals. `None` when the report shows no drift.
pub(crate) fn plan_remediation(report: &ValidationReport) -> Option<RemediationPlan> {
    if !report.has_drift() {
        return None;
    }

    // An id that is being updated is neither added nor removed.
    let updating: HashSet<&str> = report.incorrect.iter().map(|r| r.id.as_str()).collect();

    let adds = report
        .missing_in_db
        .iter()
        .filter(|t| !updating.contains(t.id.as_str()))
        .map(|t| RemediationOp::Add {
            transaction: t.clone(),
        });
    let updates = report.incorrect.iter().map(|r| RemediationOp::Update {
        id: r.id.clone(),
        changes: r.differences.clone(),
        transaction: r.pdf.clone(),
    });
    let removes = report
        .extra_in_db
        .iter()
        .filter(|t| !updating.contains(t.id.as_str()))
        .map(|t| RemediationOp::Remove {
            transaction: t.clone(),
        });

    Some(RemediationPlan {
        statement_id: report.statement_id.clone(),
        resource_identifier: report.resource_identifier.clone(),
        generated_at: Utc::now(),
        operations: adds.chain(updates).chain(removes).collect(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ApplyOptions {
    /// Removals are never applied without this.
    pub(crate) confirm_removals: bool,
    /// 1-based operation numbers to apply; `None` applies all.
    pub(crate) only: Option<Vec<usize>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ApplySummary {
    pub(crate) added: usize,
    pub(crate) updated: usize,
    pub(crate) removed: usize,
    /// Not selected, unconfirmed removals, or already in the wanted state.
    pub(crate) skipped: usize,
}

pub(crate) fn apply_plan(
    plan: &RemediationPlan,
    store: &mut dyn TransactionStore,
    opts: &ApplyOptions,
) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();

    for (i, op) in plan.operations.iter().enumerate() {
        let number = i + 1;
        if opts.only.as_ref().is_some_and(|only| !only.contains(&number)) {
            summary.skipped += 1;
            continue;
        }
        if op.is_remove() && !opts.confirm_removals {
            log::warn!("#{number} not applied, removals need confirmation: {}", op.describe());
            summary.skipped += 1;
            continue;
        }

        let applied = match op {
            RemediationOp::Add { transaction } => store.insert_if_absent(transaction)?,
            RemediationOp::Update { transaction, .. } => store.update_transaction(transaction)?,
            RemediationOp::Remove { transaction } => store.delete_transaction(&transaction.id)?,
        };
        if !applied {
            log::info!("#{number} had nothing to do: {}", op.describe());
            summary.skipped += 1;
            continue;
        }
        log::info!("#{number} applied: {}", op.describe());
        match op {
            RemediationOp::Add { .. } => summary.added += 1,
            RemediationOp::Update { .. } => summary.updated += 1,
            RemediationOp::Remove { .. } => summary.removed += 1,
        }
    }

    Ok(summary)
}
