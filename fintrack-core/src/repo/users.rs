use std::sync::Arc;
use tracing::info;

use super::{RepoError, Result};
use crate::models::{User, UserPatch};
use crate::store::{JsonStore, Record};

pub struct UserRepository {
    store: Arc<JsonStore>,
}

impl UserRepository {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    /// Stores a new user. The email must not be registered yet; the check
    /// and the insert happen in one write.
    pub fn register(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let user = User::new(name.trim(), email.trim(), password_hash);
        self.store.try_update_document(|doc| {
            if doc.users.iter().any(|u| u.email == user.email) {
                return Err(RepoError::Validation("Email already registered".to_string()));
            }
            doc.users.push(user.clone());
            Ok(Some(()))
        })?;
        info!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    pub fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = email.trim();
        Ok(self.store.find_one(|u: &User| u.email == email)?)
    }

    pub fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.store.find_by_id(id)?)
    }

    pub fn list(&self) -> Result<Vec<User>> {
        Ok(self.store.get_table()?)
    }

    /// Applies a patch. Changing the email to one used by another user is
    /// rejected.
    pub fn update(&self, id: &str, patch: UserPatch) -> Result<User> {
        self.store
            .try_update_document(|doc| {
                if let Some(email) = patch.email.as_deref() {
                    if doc.users.iter().any(|u| u.email == email && u.id != id) {
                        return Err(RepoError::Validation("Email already registered".to_string()));
                    }
                }
                let user = doc
                    .users
                    .iter_mut()
                    .find(|u| u.id == id)
                    .ok_or(RepoError::NotFound("User"))?;
                user.apply_patch(patch);
                Ok(Some(user.clone()))
            })?
            .ok_or(RepoError::NotFound("User"))
    }

    pub fn delete(&self, id: &str) -> Result<Option<User>> {
        Ok(self.store.delete_item(id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::test_support::temp_store;

    #[test]
    fn test_register_and_find() {
        let (_dir, store) = temp_store();
        let users = UserRepository::new(store);

        let user = users.register("Ana", " ana@example.com ", "hash").unwrap();
        assert_eq!(user.email, "ana@example.com");

        assert_eq!(users.find_by_email("ana@example.com").unwrap(), Some(user.clone()));
        assert_eq!(users.find_by_id(&user.id).unwrap(), Some(user));
        assert!(users.find_by_email("bob@example.com").unwrap().is_none());
    }

    #[test]
    fn test_register_rejects_duplicate_email() {
        let (_dir, store) = temp_store();
        let users = UserRepository::new(store);
        users.register("Ana", "ana@example.com", "hash").unwrap();

        let result = users.register("Other", "ana@example.com", "hash2");
        assert!(matches!(result, Err(RepoError::Validation(_))));
        assert_eq!(users.list().unwrap().len(), 1);
    }

    #[test]
    fn test_update_rejects_taken_email() {
        let (_dir, store) = temp_store();
        let users = UserRepository::new(store);
        users.register("Ana", "ana@example.com", "hash").unwrap();
        let bob = users.register("Bob", "bob@example.com", "hash").unwrap();

        let patch = UserPatch {
            email: Some("ana@example.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            users.update(&bob.id, patch),
            Err(RepoError::Validation(_))
        ));

        let patch = UserPatch {
            name: Some("Robert".to_string()),
            email: Some("bob@example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(users.update(&bob.id, patch).unwrap().name, "Robert");
    }

    #[test]
    fn test_delete() {
        let (_dir, store) = temp_store();
        let users = UserRepository::new(store);
        let ana = users.register("Ana", "ana@example.com", "hash").unwrap();

        assert_eq!(users.delete(&ana.id).unwrap().map(|u| u.id), Some(ana.id.clone()));
        assert!(users.delete(&ana.id).unwrap().is_none());
    }
}
