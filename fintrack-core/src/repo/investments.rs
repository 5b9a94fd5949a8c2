use std::sync::Arc;

use super::{delete_owned, get_owned, update_owned, RepoError, Result};
use crate::models::{total_invested, Investment, InvestmentPatch, NewInvestment};
use crate::store::JsonStore;

pub struct InvestmentRepository {
    store: Arc<JsonStore>,
}

impl InvestmentRepository {
    pub fn new(store: Arc<JsonStore>) -> Self {
        Self { store }
    }

    pub fn create(&self, user_id: &str, input: NewInvestment) -> Result<Investment> {
        let investment = input.build(user_id).map_err(RepoError::Validation)?;
        Ok(self.store.add_item(investment)?)
    }

    pub fn get(&self, user_id: &str, id: &str) -> Result<Investment> {
        get_owned(&self.store, user_id, id)
    }

    /// Most recently created first.
    pub fn list_for_user(&self, user_id: &str) -> Result<Vec<Investment>> {
        let mut investments = self.store.find_all(|i: &Investment| i.user_id == user_id)?;
        investments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(investments)
    }

    pub fn update(&self, user_id: &str, id: &str, patch: InvestmentPatch) -> Result<Investment> {
        update_owned(&self.store, user_id, id, patch)
    }

    pub fn delete(&self, user_id: &str, id: &str) -> Result<Investment> {
        delete_owned(&self.store, user_id, id)
    }

    /// Current amount across the user's active investments.
    pub fn total_invested(&self, user_id: &str) -> Result<f64> {
        let investments = self.store.find_all(|i: &Investment| i.user_id == user_id)?;
        Ok(total_invested(&investments))
    }
}
