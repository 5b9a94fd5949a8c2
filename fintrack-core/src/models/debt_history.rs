use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;

use super::debtor::Debtor;
use super::new_id;
use crate::store::{Document, Record, Table};

/// What happened to a debtor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebtAction {
    #[serde(rename = "criado")]
    Created,
    #[serde(rename = "atualizado")]
    Updated,
    #[serde(rename = "pago")]
    Paid,
    #[serde(rename = "excluido")]
    Deleted,
}

impl fmt::Display for DebtAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtAction::Created => write!(f, "criado"),
            DebtAction::Updated => write!(f, "atualizado"),
            DebtAction::Paid => write!(f, "pago"),
            DebtAction::Deleted => write!(f, "excluido"),
        }
    }
}

/// Append-only log line about a debtor. Survives deletion of the debtor,
/// which is why the name is copied in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtHistoryEntry {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub debtor_id: String,
    pub debtor_name: String,
    pub action: DebtAction,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    pub date: DateTime<Utc>,
}

impl DebtHistoryEntry {
    /// Builds an entry describing `action` on `debtor`.
    pub fn for_debtor(debtor: &Debtor, action: DebtAction) -> Self {
        let description = match action {
            DebtAction::Created => format!("Debt of {:.2} registered", debtor.amount),
            DebtAction::Updated => format!("Debt updated, now {:.2}", debtor.amount),
            DebtAction::Paid => format!("Debt of {:.2} paid", debtor.amount),
            DebtAction::Deleted => format!("Debt of {:.2} removed", debtor.amount),
        };

        Self {
            id: new_id(),
            user_id: debtor.user_id.clone(),
            debtor_id: debtor.id.clone(),
            debtor_name: debtor.name.clone(),
            action,
            description,
            amount: Some(debtor.amount),
            date: Utc::now(),
        }
    }
}

impl Record for DebtHistoryEntry {
    type Patch = Infallible;
    const TABLE: Table = Table::DebtHistory;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.debt_history
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.debt_history
    }

    fn apply_patch(&mut self, patch: Infallible) {
        match patch {}
    }
}
