pub(crate) const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS statements (
    id                  TEXT PRIMARY KEY,
    resource_identifier TEXT NOT NULL,
    period_start        TEXT,
    period_end          TEXT,
    bank                TEXT NOT NULL DEFAULT '',
    imported_at         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS transactions (
    id                  TEXT PRIMARY KEY,
    resource_identifier TEXT NOT NULL,
    statement_id        TEXT NOT NULL,
    date                TEXT NOT NULL,
    description         TEXT NOT NULL,
    merchant            TEXT NOT NULL DEFAULT '',
    amount              TEXT NOT NULL,
    type                TEXT NOT NULL,
    category            TEXT NOT NULL DEFAULT 'Other',
    raw_line            TEXT,
    is_ambiguous        BOOLEAN NOT NULL DEFAULT 0,
    ambiguous_reason    TEXT NOT NULL DEFAULT '',
    needs_review        BOOLEAN NOT NULL DEFAULT 0,
    created_at          TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_transactions_statement ON transactions(statement_id);
CREATE INDEX IF NOT EXISTS idx_transactions_resource ON transactions(resource_identifier);
CREATE INDEX IF NOT EXISTS idx_transactions_date ON transactions(date);
CREATE INDEX IF NOT EXISTS idx_transactions_review ON transactions(needs_review) WHERE needs_review = 1;
"#;

pub(crate) const CURRENT_VERSION: i32 = 1;
