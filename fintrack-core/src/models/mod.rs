//! Typed records stored in the document.
//!
//! Each record kind has a builder (`new` + `with_*`), an input type that
//! callers deserialize from loose client payloads, and a typed patch with
//! field-by-field merge rules.

pub mod coerce;
mod debt_history;
mod debtor;
mod investment;
mod transaction;
mod user;

pub use debt_history::{DebtAction, DebtHistoryEntry};
pub use debtor::{Debtor, DebtorPatch, DebtorStatus, NewDebtor};
pub use investment::{total_invested, Investment, InvestmentPatch, InvestmentStatus, NewInvestment};
pub use transaction::{balance, NewTransaction, Transaction, TransactionKind, TransactionPatch};
pub use user::{PublicUser, User, UserPatch};

/// Generates a new record id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
