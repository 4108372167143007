mod category;
mod report;
mod statement;
mod transaction;

pub use category::Category;
pub use report::{FieldDiff, IncorrectRecord, ValidationReport};
pub use statement::{StatementInput, StatementPeriod, StatementSource};
pub use transaction::{AmbiguityReason, Transaction, TxnType};
