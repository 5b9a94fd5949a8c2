//! Per-collection repositories on top of [`JsonStore`].
//!
//! Repositories add validation, ownership checks and multi-record writes
//! (a debtor change and its history entry land in the same write).

mod debt_history;
mod debtors;
mod investments;
mod transactions;
mod users;

pub use debt_history::DebtHistoryRepository;
pub use debtors::DebtorRepository;
pub use investments::InvestmentRepository;
pub use transactions::TransactionRepository;
pub use users::UserRepository;

use thiserror::Error;

use crate::models::{DebtHistoryEntry, Debtor, Investment, Transaction};
use crate::store::{JsonStore, Record, StoreError};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The record exists but belongs to another user.
    #[error("access denied")]
    Forbidden,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, RepoError>;

/// A record that belongs to exactly one user.
pub trait Owned: Record {
    /// Human-readable kind used in not-found errors.
    const LABEL: &'static str;

    fn owner(&self) -> &str;
}

impl Owned for Transaction {
    const LABEL: &'static str = "Transaction";

    fn owner(&self) -> &str {
        &self.user_id
    }
}

impl Owned for Debtor {
    const LABEL: &'static str = "Debtor";

    fn owner(&self) -> &str {
        &self.user_id
    }
}

impl Owned for Investment {
    const LABEL: &'static str = "Investment";

    fn owner(&self) -> &str {
        &self.user_id
    }
}

impl Owned for DebtHistoryEntry {
    const LABEL: &'static str = "History entry";

    fn owner(&self) -> &str {
        &self.user_id
    }
}

/// Locates `id` in `items` and checks that `user_id` owns it.
pub(crate) fn owned_index<R: Owned>(items: &[R], user_id: &str, id: &str) -> Result<usize> {
    let index = items
        .iter()
        .position(|r| r.id() == id)
        .ok_or(RepoError::NotFound(R::LABEL))?;
    if items[index].owner() != user_id {
        return Err(RepoError::Forbidden);
    }
    Ok(index)
}

pub(crate) fn get_owned<R: Owned>(store: &JsonStore, user_id: &str, id: &str) -> Result<R> {
    let record = store
        .find_by_id::<R>(id)?
        .ok_or(RepoError::NotFound(R::LABEL))?;
    if record.owner() != user_id {
        return Err(RepoError::Forbidden);
    }
    Ok(record)
}

pub(crate) fn update_owned<R: Owned>(
    store: &JsonStore,
    user_id: &str,
    id: &str,
    patch: R::Patch,
) -> Result<R> {
    store
        .try_update_document(|doc| {
            let items = R::collection_mut(doc);
            let index = owned_index(items, user_id, id)?;
            items[index].apply_patch(patch);
            Ok::<_, RepoError>(Some(items[index].clone()))
        })?
        .ok_or(RepoError::NotFound(R::LABEL))
}

pub(crate) fn delete_owned<R: Owned>(store: &JsonStore, user_id: &str, id: &str) -> Result<R> {
    store
        .try_update_document(|doc| {
            let items = R::collection_mut(doc);
            let index = owned_index(items, user_id, id)?;
            Ok::<_, RepoError>(Some(items.remove(index)))
        })?
        .ok_or(RepoError::NotFound(R::LABEL))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use tempfile::TempDir;

    use crate::crypto::DataCipher;
    use crate::store::{JsonStore, StoreOptions};

    pub fn temp_store() -> (TempDir, Arc<JsonStore>) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(
            dir.path().join("db.json"),
            DataCipher::disabled(),
            StoreOptions::default(),
        )
        .unwrap();
        (dir, Arc::new(store))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::temp_store;
    use super::*;
    use crate::models::{TransactionKind, TransactionPatch};

    #[test]
    fn test_get_owned_checks_owner() {
        let (_dir, store) = temp_store();
        let tx = store
            .add_item(Transaction::new("u1", TransactionKind::Income, 10.0))
            .unwrap();

        assert!(get_owned::<Transaction>(&store, "u1", &tx.id).is_ok());
        assert!(matches!(
            get_owned::<Transaction>(&store, "u2", &tx.id),
            Err(RepoError::Forbidden)
        ));
        assert!(matches!(
            get_owned::<Transaction>(&store, "u1", "missing"),
            Err(RepoError::NotFound("Transaction"))
        ));
    }

    #[test]
    fn test_update_owned_by_other_user_writes_nothing() {
        let (_dir, store) = temp_store();
        let tx = store
            .add_item(Transaction::new("u1", TransactionKind::Income, 10.0))
            .unwrap();
        let before = std::fs::read(store.path()).unwrap();

        let patch = TransactionPatch {
            amount: Some(99.0),
            ..Default::default()
        };
        let result = update_owned::<Transaction>(&store, "u2", &tx.id, patch);

        assert!(matches!(result, Err(RepoError::Forbidden)));
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_delete_owned() {
        let (_dir, store) = temp_store();
        let tx = store
            .add_item(Transaction::new("u1", TransactionKind::Income, 10.0))
            .unwrap();

        assert!(matches!(
            delete_owned::<Transaction>(&store, "u2", &tx.id),
            Err(RepoError::Forbidden)
        ));
        assert_eq!(delete_owned::<Transaction>(&store, "u1", &tx.id).unwrap(), tx);
        assert!(store.get_table::<Transaction>().unwrap().is_empty());
    }
}
