use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::coerce::lenient_amount;
use super::new_id;
use crate::store::{Document, Record, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvestmentStatus {
    #[default]
    #[serde(rename = "ativo")]
    Active,
    #[serde(rename = "encerrado")]
    Closed,
}

impl fmt::Display for InvestmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvestmentStatus::Active => write!(f, "ativo"),
            InvestmentStatus::Closed => write!(f, "encerrado"),
        }
    }
}

/// A position the user holds. `kind` is free text (stocks, funds,
/// fixed income, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub amount: f64,
    pub initial_amount: f64,
    #[serde(default)]
    pub return_rate: f64,
    #[serde(default)]
    pub description: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: InvestmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Investment {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, amount: f64) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id: user_id.into(),
            name: name.into(),
            kind: String::new(),
            amount,
            initial_amount: amount,
            return_rate: 0.0,
            description: String::new(),
            start_date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            end_date: None,
            status: InvestmentStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_initial_amount(mut self, initial_amount: f64) -> Self {
        self.initial_amount = initial_amount;
        self
    }

    pub fn with_return_rate(mut self, return_rate: f64) -> Self {
        self.return_rate = return_rate;
        self
    }

    pub fn with_status(mut self, status: InvestmentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == InvestmentStatus::Active
    }
}

/// Sum of current amounts across active investments.
pub fn total_invested<'a>(investments: impl IntoIterator<Item = &'a Investment>) -> f64 {
    investments
        .into_iter()
        .filter(|i| i.is_active())
        .map(|i| i.amount)
        .sum()
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInvestment {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub initial_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub return_rate: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: Option<InvestmentStatus>,
}

impl NewInvestment {
    /// Builds the record. A missing or zero initial amount falls back to
    /// the current amount.
    pub fn build(self, user_id: &str) -> Result<Investment, String> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| "Investment name is required".to_string())?;

        let amount = self.amount.unwrap_or(0.0);
        let initial_amount = self.initial_amount.filter(|v| *v != 0.0).unwrap_or(amount);

        let mut investment = Investment::new(user_id, name, amount)
            .with_kind(self.kind.unwrap_or_default())
            .with_initial_amount(initial_amount)
            .with_return_rate(self.return_rate.unwrap_or(0.0))
            .with_status(self.status.unwrap_or_default());
        investment.description = self.description.unwrap_or_default();
        if let Some(start) = self.start_date.filter(|d| !d.trim().is_empty()) {
            investment.start_date = start;
        }
        investment.end_date = self.end_date.filter(|d| !d.trim().is_empty());

        Ok(investment)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub initial_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub return_rate: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: Option<InvestmentStatus>,
}

impl Record for Investment {
    type Patch = InvestmentPatch;
    const TABLE: Table = Table::Investments;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.investments
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.investments
    }

    fn apply_patch(&mut self, patch: InvestmentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(initial_amount) = patch.initial_amount {
            self.initial_amount = initial_amount;
        }
        if let Some(return_rate) = patch.return_rate {
            self.return_rate = return_rate;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(start_date) = patch.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = patch.end_date {
            self.end_date = Some(end_date).filter(|d| !d.trim().is_empty());
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
    fn test_initial_amount_falls_back_to_amount() {
        let input: NewInvestment =
            serde_json::from_value(json!({ "name": "CDB", "amount": "1000" })).unwrap();
        let investment = input.build("u1").unwrap();

        assert_eq!(investment.amount, 1000.0);
        assert_eq!(investment.initial_amount, 1000.0);
        assert_eq!(investment.status, InvestmentStatus::Active);
        assert!(!investment.start_date.is_empty());
    }

    #[test]
    fn test_zero_initial_amount_falls_back_to_amount() {
        let input: NewInvestment = serde_json::from_value(
            json!({ "name": "CDB", "amount": 500, "initialAmount": 0 }),
        )
        .unwrap();
        assert_eq!(input.build("u1").unwrap().initial_amount, 500.0);
    }

    #[test]
    fn test_explicit_fields_are_kept() {
        let input: NewInvestment = serde_json::from_value(json!({
            "name": "Tesouro",
            "type": "renda_fixa",
            "amount": 1100,
            "initialAmount": "1000",
            "returnRate": "10.5",
            "startDate": "2024-01-10",
            "status": "encerrado"
        }))
        .unwrap();
        let investment = input.build("u1").unwrap();

        assert_eq!(investment.kind, "renda_fixa");
        assert_eq!(investment.initial_amount, 1000.0);
        assert_eq!(investment.return_rate, 10.5);
        assert_eq!(investment.start_date, "2024-01-10");
        assert_eq!(investment.status, InvestmentStatus::Closed);
    }

    #[test]
    fn test_total_invested_counts_active_only() {
        let investments = vec![
            Investment::new("u1", "A", 100.0),
            Investment::new("u1", "B", 50.0),
            Investment::new("u1", "C", 999.0).with_status(InvestmentStatus::Closed),
        ];
        assert_eq!(total_invested(&investments), 150.0);
    }

    #[test]
    fn test_serialized_field_names() {
        let value = serde_json::to_value(Investment::new("u1", "A", 1.0)).unwrap();
        assert!(value.get("initialAmount").is_some());
        assert!(value.get("returnRate").is_some());
        assert_eq!(value["status"], "ativo");
        assert_eq!(value["type"], "");
    }

    #[test]
    fn test_patch_coerces_numbers() {
        let mut investment = Investment::new("u1", "A", 100.0);
        let patch: InvestmentPatch =
            serde_json::from_value(json!({ "amount": "120.5", "returnRate": 3 })).unwrap();
        investment.apply_patch(patch);

        assert_eq!(investment.amount, 120.5);
        assert_eq!(investment.return_rate, 3.0);
        assert_eq!(investment.initial_amount, 100.0);
    }
}
