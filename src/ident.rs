use chrono::NaiveDate;
use rust_decimal::Decimal;
use sha2::{Digest, Sha256};

use crate::models::{Transaction, TxnType};

pub const ID_PREFIX: &str = "txn_";
const HASH_CHARS: usize = 16;

/// Content-derived transaction id. The same five inputs always give the same
/// id, which is what makes repeated imports of a statement idempotent.
pub fn transaction_id(
    resource_identifier: &str,
    date: NaiveDate,
    description: &str,
    amount: Decimal,
    kind: TxnType,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(resource_identifier.as_bytes());
    hasher.update(b"|");
    hasher.update(date.format("%Y-%m-%d").to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(description.as_bytes());
    hasher.update(b"|");
    hasher.update(format!("{:.2}", amount.round_dp(2)).as_bytes());
    hasher.update(b"|");
    hasher.update(kind.as_str().as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{ID_PREFIX}{}", &digest[..HASH_CHARS])
}

pub fn id_for(txn: &Transaction) -> String {
    transaction_id(
        &txn.resource_identifier,
        txn.date,
        &txn.description,
        txn.amount,
        txn.kind,
    )
}

pub fn assign_id(txn: &mut Transaction) {
    txn.id = id_for(txn);
}
