use std::sync::Arc;

use super::{delete_owned, get_owned, update_owned, RepoError, Result};
use crate::models::{balance, NewTransaction, Transaction, TransactionPatch};
use crate::store::JsonStore;

pub struct TransactionRepository {
    store: Arc<JsonStore>,
}

impl TransactionRepository {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, user_id: &str, input: NewTransaction) -> Result<Transaction> {
        let transaction = input.build(user_id).map_err(RepoError::Validation)?;
        Ok(self.store.add_item(transaction)?)
    }

    pub fn get(&self, user_id: &str, id: &str) -> Result<Transaction> {
        get_owned(&self.store, user_id, id)
    }

    /// The user's transactions, newest date first.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let mut transactions = self.store.find_all(|t: &Transaction| t.user_id == user_id)?;
        transactions.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(transactions)
    }

    pub fn update(&self, user_id: &str, id: &str, patch: TransactionPatch) -> Result<Transaction> {
        update_owned(&self.store, user_id, id, patch)
    }

    pub fn delete(&self, user_id: &str, id: &str) -> Result<Transaction> {
        delete_owned(&self.store, user_id, id)
    }

    /// Income minus expenses for the user.
    pub fn balance(&self, user_id: &str) -> Result<f64> {
        let transactions = self.store.find_all(|t: &Transaction| t.user_id == user_id)?;
        Ok(balance(&transactions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;
    use crate::repo::test_support::temp_store;
    use serde_json::json;

    fn input(value: serde_json::Value) -> NewTransaction {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_balance_scenario() {
        let (_dir, store) = temp_store();
        let repo = TransactionRepository::new(store);
        repo.create("u1", input(json!({ "type": "entrada", "amount": 100 })))
            .unwrap();
        repo.create("u1", input(json!({ "type": "saida", "amount": 30 })))
            .unwrap();
        repo.create("u2", input(json!({ "type": "entrada", "amount": 999 })))
            .unwrap();

        assert_eq!(repo.balance("u1").unwrap(), 70.0);
        assert_eq!(repo.balance("nobody").unwrap(), 0.0);
    }

    #[test]
    fn test_create_validates() {
        let (_dir, store) = temp_store();
        let repo = TransactionRepository::new(store.clone());

        let result = repo.create("u1", input(json!({ "type": "transfer", "amount": 1 })));
        assert!(matches!(result, Err(RepoError::Validation(_))));
        let result = repo.create("u1", input(json!({ "type": "entrada" })));
        assert!(matches!(result, Err(RepoError::Validation(_))));
        assert!(store.get_table::<Transaction>().unwrap().is_empty());
    }

    #[test]
    fn test_list_newest_first() {
        let (_dir, store) = temp_store();
        let repo = TransactionRepository::new(store);
        for date in ["2024-01-10", "2024-03-01", "2024-02-15"] {
            repo.create(
                "u1",
                input(json!({ "type": "saida", "amount": 1, "date": date })),
            )
            .unwrap();
        }

        let dates: Vec<String> = repo
            .list_for_user("u1")
            .unwrap()
            .iter()
            .map(|t| t.date.format("%Y-%m-%d").to_string())
            .collect();
        assert_eq!(dates, vec!["2024-03-01", "2024-02-15", "2024-01-10"]);
    }

    #[test]
    fn test_update_and_delete_respect_owner() {
        let (_dir, store) = temp_store();
        let repo = TransactionRepository::new(store);
        let tx = repo
            .create("u1", input(json!({ "type": "entrada", "amount": "50" })))
            .unwrap();

        let patch = TransactionPatch {
            kind: Some(TransactionKind::Expense),
            ..Default::default()
        };
        assert!(matches!(
            repo.update("u2", &tx.id, patch.clone()),
            Err(RepoError::Forbidden)
        ));
        let updated = repo.update("u1", &tx.id, patch).unwrap();
        assert_eq!(updated.kind, TransactionKind::Expense);
        assert_eq!(repo.balance("u1").unwrap(), -50.0);

        assert!(matches!(repo.delete("u2", &tx.id), Err(RepoError::Forbidden)));
        repo.delete("u1", &tx.id).unwrap();
        assert!(matches!(repo.get("u1", &tx.id), Err(RepoError::NotFound(_))));
    }
}
