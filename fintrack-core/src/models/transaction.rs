use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::coerce::{lenient_amount, lenient_date, normalize_date, present_amount};
use super::new_id;
use crate::store::{Document, Record, Table};

/// Direction of a transaction. Stored as `"entrada"` / `"saida"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    #[serde(rename = "entrada")]
    Income,
    #[serde(rename = "saida")]
    Expense,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "entrada"),
            TransactionKind::Expense => write!(f, "saida"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "entrada" => Ok(TransactionKind::Income),
            "saida" => Ok(TransactionKind::Expense),
            _ => Err(format!(
                "Invalid transaction type '{}'. Valid options: entrada, saida",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub category: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(user_id: impl Into<String>, kind: TransactionKind, amount: f64) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id: user_id.into(),
            kind,
            category: String::new(),
            amount,
            description: String::new(),
            date: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self
    }

    /// Amount with the sign implied by the kind.
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// Income minus expenses.
pub fn balance<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> f64 {
    transactions.into_iter().map(Transaction::signed_amount).sum()
}

/// Client payload for a new transaction.
///
/// `kind` stays a string so a bad value can be reported as a validation
/// error rather than a parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTransaction {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Must be present. An explicit `null` or unparsable value counts as 0.
    #[serde(default, deserialize_with = "present_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
}

impl NewTransaction {
    /// Validates the payload and builds the record.
    pub fn build(self, user_id: &str) -> Result<Transaction, String> {
        let (kind, amount) = match (self.kind.as_deref(), self.amount) {
            (Some(kind), Some(amount)) if !kind.trim().is_empty() => (kind.parse()?, amount),
            _ => return Err("Transaction type and amount are required".to_string()),
        };

        Ok(Transaction::new(user_id, kind, amount)
            .with_category(self.category.unwrap_or_default())
            .with_description(self.description.unwrap_or_default())
            .with_date(normalize_date(self.date.as_deref())))
    }
}

/// Partial update. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionPatch {
    #[serde(rename = "type", default)]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub date: Option<DateTime<Utc>>,
}

impl Record for Transaction {
    type Patch = TransactionPatch;
    const TABLE: Table = Table::Transactions;

    fn id(&self) -> &str {
        &self.id
    }

    fn collection(doc: &Document) -> &Vec<Self> {
        &doc.transactions
    }

    fn collection_mut(doc: &mut Document) -> &mut Vec<Self> {
        &mut doc.transactions
    }

    fn apply_patch(&mut self, patch: TransactionPatch) {
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(amount) = patch.amount {
            self.amount = amount;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        self.updated_at = Utc::now();
    }
}
