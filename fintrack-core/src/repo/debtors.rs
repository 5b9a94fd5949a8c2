use std::sync::Arc;
use tracing::debug;

use super::{get_owned, owned_index, RepoError, Result};
use crate::models::{DebtAction, DebtHistoryEntry, Debtor, DebtorPatch, DebtorStatus, NewDebtor};
use crate::store::{JsonStore, Record};

/// Debtors plus their history log. Every change to a debtor appends a
/// history entry in the same write.
pub struct DebtorRepository {
    store: Arc<JsonStore>,
}

impl DebtorRepository {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, user_id: &str, input: NewDebtor) -> Result<Debtor> {
        let debtor = input.build(user_id).map_err(RepoError::Validation)?;
        self.store.update_document(|doc| {
            doc.debt_history
                .push(DebtHistoryEntry::for_debtor(&debtor, DebtAction::Created));
            doc.debtors.push(debtor.clone());
            Some(())
        })?;
        debug!(debtor_id = %debtor.id, "Created debtor");
        Ok(debtor)
    }

    pub fn get(&self, user_id: &str, id: &str) -> Result<Debtor> {
        get_owned(&self.store, user_id, id)
    }

    /// Most recently created first.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Debtor>> {
        let mut debtors = self.store.find_all(|d: &Debtor| d.user_id == user_id)?;
        debtors.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(debtors)
    }

    /// Applies the patch and logs it. A change into the paid status is
    /// logged as a payment, anything else as an update.
    pub fn update(&self, user_id: &str, id: &str, patch: DebtorPatch) -> Result<Debtor> {
        self.store
            .try_update_document(|doc| {
                let index = owned_index(&doc.debtors, user_id, id)?;
                let debtor = &mut doc.debtors[index];
                let was_paid = debtor.status == DebtorStatus::Paid;
                debtor.apply_patch(patch);

                let action = if !was_paid && debtor.status == DebtorStatus::Paid {
                    DebtAction::Paid
                } else {
                    DebtAction::Updated
                };
                let updated = debtor.clone();
                doc.debt_history
                    .push(DebtHistoryEntry::for_debtor(&updated, action));
                Ok::<_, RepoError>(Some(updated))
            })?
            .ok_or(RepoError::NotFound("Debtor"))
    }

    pub fn delete(&self, user_id: &str, id: &str) -> Result<Debtor> {
        self.store
            .try_update_document(|doc| {
                let index = owned_index(&doc.debtors, user_id, id)?;
                let removed = doc.debtors.remove(index);
                doc.debt_history
                    .push(DebtHistoryEntry::for_debtor(&removed, DebtAction::Deleted));
                Ok::<_, RepoError>(Some(removed))
            })?
            .ok_or(RepoError::NotFound("Debtor"))
    }

    /// Amount still owed to the user.
    pub fn total_outstanding(&self, user_id: &str) -> Result<f64> {
        let debtors = self.store.find_all(|d: &Debtor| d.user_id == user_id)?;
        Ok(debtors
            .iter()
            .filter(|d| d.is_outstanding())
            .map(|d| d.amount)
            .sum())
    }
}
