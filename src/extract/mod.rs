mod banks;
mod detect;
mod fields;
mod pipeline;
mod rows;
mod table;

pub(crate) use detect::{Bank, BankSignature};
pub(crate) use pipeline::{Extraction, Extractor, StatementContext};
