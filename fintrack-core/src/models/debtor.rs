use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::coerce::lenient_amount;
use super::new_id;
use crate::store::{Document, Record, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DebtorStatus {
    #[default]
    #[serde(rename = "pendente")]
    Pending,
    #[serde(rename = "pago")]
    Paid,
    #[serde(rename = "atrasado")]
    Overdue,
}

impl fmt::Display for DebtorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DebtorStatus::Pending => write!(f, "pendente"),
            DebtorStatus::Paid => write!(f, "pago"),
            DebtorStatus::Overdue => write!(f, "atrasado"),
        }
    }
}

/// Someone who owes the user money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debtor {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: DebtorStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Debtor {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, amount: f64) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id: user_id.into(),
            name: name.into(),
            amount,
            description: String::new(),
            due_date: None,
            status: DebtorStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn with_status(mut self, status: DebtorStatus) -> Self {
        self.status = status;
        self
    }

    /// True while the debt has not been paid.
    pub fn is_outstanding(&self) -> bool {
        self.status != DebtorStatus::Paid
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDebtor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: Option<DebtorStatus>,
}

impl NewDebtor {
    pub fn build(self, user_id: &str) -> Result<Debtor, String> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| "Debtor name is required".to_string())?;

        let mut debtor = Debtor::new(user_id, name, self.amount.unwrap_or(0.0))
            .with_description(self.description.unwrap_or_default())
            .with_status(self.status.unwrap_or_default());
        debtor.due_date = self.due_date.filter(|d| !d.trim().is_empty());

        Ok(debtor)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: Option<DebtorStatus>,
}

impl Record for Debtor {
    type Patch = DebtorPatch;
    const TABLE: Table = Table::Debtors;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.debtors
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.debtors
    }

    fn apply_patch(&mut self, patch: DebtorPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date).filter(|d| !d.trim().is_empty());
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_names() {
        for (status, name) in [
            (DebtorStatus::Pending, "pendente"),
            (DebtorStatus::Paid, "pago"),
            (DebtorStatus::Overdue, "atrasado"),
        ] {
            assert_eq!(serde_json::to_value(status).unwrap(), name);
            assert_eq!(status.to_string(), name);
        }
    }

    #[test]
    fn test_new_debtor_defaults() {
        let input: NewDebtor =
            serde_json::from_value(json!({ "name": "Carlos", "amount": "250" })).unwrap();
        let debtor = input.build("u1").unwrap();

        assert_eq!(debtor.amount, 250.0);
        assert_eq!(debtor.status, DebtorStatus::Pending);
        assert_eq!(debtor.description, "");
        assert!(debtor.due_date.is_none());
        assert!(debtor.is_outstanding());
    }

    #[test]
    fn test_new_debtor_requires_name() {
        let input: NewDebtor = serde_json::from_value(json!({ "amount": 10 })).unwrap();
        assert!(input.build("u1").is_err());
    }

    #[test]
    fn test_unparsable_amount_becomes_zero() {
        let input: NewDebtor =
            serde_json::from_value(json!({ "name": "Bia", "amount": "muito" })).unwrap();
        assert_eq!(input.build("u1").unwrap().amount, 0.0);
    }

    #[test]
    fn test_patch_to_paid() {
        let mut debtor = Debtor::new("u1", "Carlos", 100.0).with_due_date("2024-05-01");
        let patch: DebtorPatch = serde_json::from_value(json!({ "status": "pago" })).unwrap();
        debtor.apply_patch(patch);

        assert_eq!(debtor.status, DebtorStatus::Paid);
        assert_eq!(debtor.due_date.as_deref(), Some("2024-05-01"));
        assert!(!debtor.is_outstanding());
    }

    #[test]
    fn test_reads_record_without_status() {
        let debtor: Debtor = serde_json::from_value(json!({
            "id": "d1",
            "userId": "u1",
            "name": "Carlos",
            "amount": 10.0,
            "dueDate": null,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(debtor.status, DebtorStatus::Pending);
    }
}
