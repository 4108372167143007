mod schema;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::models::*;

/// Where extracted transactions live. Writes are keyed by the deterministic
/// id, so inserting the same transaction twice is a no-op.
pub(crate) trait TransactionStore {
    /// Returns `false` when a transaction with the same id already exists.
    fn insert_if_absent(&mut self, txn: &Transaction) -> Result<bool>;

    fn transactions_for_statement(&self, statement_id: &str) -> Result<Vec<Transaction>>;

    /// Overwrite every field of the stored row with the same id.
    fn update_transaction(&mut self, txn: &Transaction) -> Result<bool>;

    fn delete_transaction(&mut self, id: &str) -> Result<bool>;

    fn needing_review(&self, resource_identifier: Option<&str>) -> Result<Vec<Transaction>>;
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StatementRecord {
    pub(crate) id: String,
    pub(crate) resource_identifier: String,
    pub(crate) period: Option<StatementPeriod>,
    pub(crate) bank: String,
}

pub(crate) struct Database {
    conn: Connection,
}

const TRANSACTION_COLUMNS: &str = "id, resource_identifier, statement_id, date, description, merchant,
     amount, type, category, raw_line, is_ambiguous, ambiguous_reason, needs_review";

fn conversion_error(idx: usize, e: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn row_to_transaction(row: &Row) -> rusqlite::Result<Transaction> {
    let date_str: String = row.get(3)?;
    let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| conversion_error(3, e))?;
    let amount_str: String = row.get(6)?;
    let amount = Decimal::from_str(&amount_str).map_err(|e| conversion_error(6, e))?;
    let kind_str: String = row.get(7)?;
    let kind = TxnType::parse(&kind_str).ok_or_else(|| {
        conversion_error(
            7,
            std::io::Error::new(std::io::ErrorKind::InvalidData, format!("bad type '{kind_str}'")),
        )
    })?;
    let category: String = row.get(8)?;
    let reasons: String = row.get(11)?;

    Ok(Transaction {
        id: row.get(0)?,
        resource_identifier: row.get(1)?,
        statement_id: row.get(2)?,
        date,
        description: row.get(4)?,
        merchant: row.get(5)?,
        amount,
        kind,
        category: Category::parse(&category),
        raw_line: row.get(9)?,
        is_ambiguous: row.get(10)?,
        ambiguous_reasons: reasons.split(',').filter_map(AmbiguityReason::parse).collect(),
        needs_review: row.get(12)?,
    })
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Create missing tables and stamp the schema version. A database written
    /// by a newer build is refused rather than read with the wrong layout.
    fn migrate(&mut self) -> Result<()> {
        self.conn.execute_batch(schema::SCHEMA_V1)?;

        let stored: Option<i32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match stored {
            None => {
                self.conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![schema::CURRENT_VERSION],
                )?;
            }
            Some(version) if version > schema::CURRENT_VERSION => anyhow::bail!(
                "database schema version {version} is newer than this build supports ({})",
                schema::CURRENT_VERSION
            ),
            Some(_) => {}
        }
        Ok(())
    }

    // ── Statements ────────────────────────────────────────────

    pub(crate) fn upsert_statement(&self, stmt: &StatementRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO statements (id, resource_identifier, period_start, period_end, bank, imported_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                resource_identifier = excluded.resource_identifier,
                period_start = excluded.period_start,
                period_end = excluded.period_end,
                bank = excluded.bank",
            params![
                stmt.id,
                stmt.resource_identifier,
                stmt.period.map(|p| p.start.to_string()),
                stmt.period.map(|p| p.end.to_string()),
                stmt.bank,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub(crate) fn get_statement(&self, id: &str) -> Result<Option<StatementRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, resource_identifier, period_start, period_end, bank FROM statements WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, resource_identifier, start, end, bank)) = row else {
            return Ok(None);
        };
        let period = match (start, end) {
            (Some(s), Some(e)) => Some(StatementPeriod {
                start: NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .with_context(|| format!("bad period start '{s}'"))?,
                end: NaiveDate::parse_from_str(&e, "%Y-%m-%d")
                    .with_context(|| format!("bad period end '{e}'"))?,
            }),
            _ => None,
        };
        Ok(Some(StatementRecord {
            id,
            resource_identifier,
            period,
            bank,
        }))
    }

    // ── Transactions ──────────────────────────────────────────

    /// Insert-if-absent for a whole statement in one SQLite transaction.
    /// Returns how many rows were new.
    pub(crate) fn insert_transactions_batch(&mut self, txns: &[Transaction]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut count = 0;
        for txn in txns {
            count += insert_or_ignore(&tx, txn)?;
        }
        tx.commit()?;
        Ok(count)
    }

    #[cfg(test)]
    pub(crate) fn get_transaction(&self, id: &str) -> Result<Option<Transaction>> {
        let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id], row_to_transaction)
            .optional()?)
    }

    pub(crate) fn get_transactions(&self, resource_identifier: Option<&str>) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE (?1 IS NULL OR resource_identifier = ?1)
             ORDER BY date, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![resource_identifier], row_to_transaction)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_transaction_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?)
    }

    /// Writes every stored transaction (optionally for one card) as CSV.
    pub(crate) fn export_to_csv(&self, path: &Path, resource_identifier: Option<&str>) -> Result<usize> {
        let txns = self.get_transactions(resource_identifier)?;
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        wtr.write_record([
            "id",
            "date",
            "description",
            "merchant",
            "amount",
            "type",
            "category",
            "statement_id",
            "resource_identifier",
            "needs_review",
        ])?;
        for t in &txns {
            let date = t.date.to_string();
            let amount = format!("{:.2}", t.amount);
            wtr.write_record([
                t.id.as_str(),
                date.as_str(),
                t.description.as_str(),
                t.merchant.as_str(),
                amount.as_str(),
                t.kind.as_str(),
                t.category.as_str(),
                t.statement_id.as_str(),
                t.resource_identifier.as_str(),
                if t.needs_review { "yes" } else { "no" },
            ])?;
        }
        wtr.flush()?;
        Ok(txns.len())
    }
}

fn insert_or_ignore(conn: &Connection, txn: &Transaction) -> Result<usize> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO transactions (id, resource_identifier, statement_id, date, description, merchant,
             amount, type, category, raw_line, is_ambiguous, ambiguous_reason, needs_review, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            txn.id,
            txn.resource_identifier,
            txn.statement_id,
            txn.date.to_string(),
            txn.description,
            txn.merchant,
            format!("{:.2}", txn.amount),
            txn.kind.as_str(),
            txn.category.as_str(),
            txn.raw_line,
            txn.is_ambiguous,
            txn.ambiguous_reason().unwrap_or_default(),
            txn.needs_review,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(changed)
}

impl TransactionStore for Database {
    fn insert_if_absent(&mut self, txn: &Transaction) -> Result<bool> {
        Ok(insert_or_ignore(&self.conn, txn)? == 1)
    }

    fn transactions_for_statement(&self, statement_id: &str) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE statement_id = ?1 ORDER BY date, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![statement_id], row_to_transaction)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn update_transaction(&mut self, txn: &Transaction) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE transactions SET resource_identifier = ?2, statement_id = ?3, date = ?4,
                description = ?5, merchant = ?6, amount = ?7, type = ?8, category = ?9,
                raw_line = ?10, is_ambiguous = ?11, ambiguous_reason = ?12, needs_review = ?13
             WHERE id = ?1",
            params![
                txn.id,
                txn.resource_identifier,
                txn.statement_id,
                txn.date.to_string(),
                txn.description,
                txn.merchant,
                format!("{:.2}", txn.amount),
                txn.kind.as_str(),
                txn.category.as_str(),
                txn.raw_line,
                txn.is_ambiguous,
                txn.ambiguous_reason().unwrap_or_default(),
                txn.needs_review,
            ],
        )?;
        Ok(changed == 1)
    }

    fn delete_transaction(&mut self, id: &str) -> Result<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?;
        Ok(changed == 1)
    }

    fn needing_review(&self, resource_identifier: Option<&str>) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions
             WHERE needs_review = 1 AND (?1 IS NULL OR resource_identifier = ?1)
             ORDER BY date, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![resource_identifier], row_to_transaction)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
