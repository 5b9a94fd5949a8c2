use std::sync::Arc;

use super::Result;
use crate::models::DebtHistoryEntry;
use crate::store::JsonStore;

/// Read side of the debt history log. Entries are written by
/// [`super::DebtorRepository`].
pub struct DebtHistoryRepository {
    store: Arc<JsonStore>,
}

impl DebtHistoryRepository {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    /// The user's entries, newest first.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<DebtHistoryEntry>> {
        let entries = self
            .store
            .find_all(|h: &DebtHistoryEntry| h.user_id == user_id)?;
        Ok(newest_first(entries))
    }

    /// Entries about one debtor, restricted to the user's own.
    pub fn list_for_debtor(&self, user_id: &str, debtor_id: &str) -> Result<Vec<DebtHistoryEntry>> {
        let entries = self.store.find_all(|h: &DebtHistoryEntry| {
            h.user_id == user_id && h.debtor_id == debtor_id
        })?;
        Ok(newest_first(entries))
    }

    /// The `limit` most recent entries across all users.
    pub fn recent(&self, limit: usize) -> Result<Vec<DebtHistoryEntry>> {
        let mut entries = newest_first(self.store.get_table()?);
        entries.truncate(limit);
        Ok(entries)
    }
}

fn newest_first(mut entries: Vec<DebtHistoryEntry>) -> Vec<DebtHistoryEntry> {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DebtAction, Debtor};
    use crate::repo::test_support::temp_store;
    use chrono::{Duration, Utc};

    fn entry(debtor: &Debtor, days_ago: i64) -> DebtHistoryEntry {
        let mut entry = DebtHistoryEntry::for_debtor(debtor, DebtAction::Updated);
        entry.date = Utc::now() - Duration::days(days_ago);
        entry
    }

    #[test]
    fn test_lists_are_scoped_and_sorted() {
        let (_dir, store) = temp_store();
        let carlos = Debtor::new("u1", "Carlos", 10.0);
        let bia = Debtor::new("u1", "Bia", 20.0);
        let other = Debtor::new("u2", "Zé", 30.0);

        store.add_item(entry(&carlos, 5)).unwrap();
        store.add_item(entry(&bia, 1)).unwrap();
        store.add_item(entry(&carlos, 2)).unwrap();
        store.add_item(entry(&other, 0)).unwrap();

        let repo = DebtHistoryRepository::new(store);

        let mine = repo.list_for_user("u1").unwrap();
        let names: Vec<&str> = mine.iter().map(|h| h.debtor_name.as_str()).collect();
        assert_eq!(names, vec!["Bia", "Carlos", "Carlos"]);

        let about_carlos = repo.list_for_debtor("u1", &carlos.id).unwrap();
        assert_eq!(about_carlos.len(), 2);
        assert!(about_carlos[0].date > about_carlos[1].date);

        assert!(repo.list_for_debtor("u2", &carlos.id).unwrap().is_empty());

        let recent = repo.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].debtor_name, "Zé");
    }
}
