use thiserror::Error;

/// Failure that aborts one statement. Row-level problems never reach this type;
/// they are skipped and counted by the extractor.
#[derive(Error, Debug)]
pub enum StatementError {
    #[error("failed to decrypt statement {statement_id}: {message}")]
    Decryption {
        statement_id: String,
        message: String,
    },

    #[error("failed to read statement {statement_id}: {source}")]
    Source {
        statement_id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("statement {0} contains no text")]
    EmptyText(String),

    #[error("no transactions found in statement {statement_id} ({skipped} lines skipped)")]
    NoTransactions { statement_id: String, skipped: usize },

    #[error("unknown bank '{0}'")]
    UnknownBank(String),
}

/// A row-level field that could not be normalized. The row is discarded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("unparseable date '{0}'")]
    Date(String),

    #[error("unparseable amount '{0}'")]
    Amount(String),
}
