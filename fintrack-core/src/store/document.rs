//! The persisted document and its fixed set of collections.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use super::error::{Result, StoreError};
use crate::models::{DebtHistoryEntry, Debtor, Investment, Transaction, User};

/// Free-form key/value settings.
pub type Settings = Map<String, Value>;

/// The entire persisted state.
///
/// Every collection is always present. Absent or `null` collections in a
/// file deserialize to their empty default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default, deserialize_with = "nullable")]
    pub users: Vec<User>,
    #[serde(default, deserialize_with = "nullable")]
    pub debtors: Vec<Debtor>,
    #[serde(default, deserialize_with = "nullable")]
    pub transactions: Vec<Transaction>,
    #[serde(default, deserialize_with = "nullable")]
    pub investments: Vec<Investment>,
    #[serde(default, deserialize_with = "nullable")]
    pub settings: Settings,
    #[serde(default, deserialize_with = "nullable")]
    pub debt_history: Vec<DebtHistoryEntry>,
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Named collections of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    Debtors,
    Transactions,
    Investments,
    Settings,
    DebtHistory,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Users,
        Table::Debtors,
        Table::Transactions,
        Table::Investments,
        Table::Settings,
        Table::DebtHistory,
    ];

    /// Key of the collection in the persisted document.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Debtors => "debtors",
            Table::Transactions => "transactions",
            Table::Investments => "investments",
            Table::Settings => "settings",
            Table::DebtHistory => "debtHistory",
        }
    }

    /// Parse from the persisted key.
    pub fn parse(s: &str) -> Option<Self> {
        Table::ALL.into_iter().find(|t| t.name() == s)
    }

    /// Everything except `settings` is a sequence of records.
    pub fn is_sequence(&self) -> bool {
        !matches!(self, Table::Settings)
    }

    /// Value a missing collection is filled with.
    pub fn empty_value(&self) -> Value {
        if self.is_sequence() {
            Value::Array(Vec::new())
        } else {
            Value::Object(Map::new())
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Presence and size of one collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableStatus {
    pub table: Table,
    pub present: bool,
    pub entries: usize,
}

/// Result of a structural check, optionally after repair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureReport {
    pub tables: Vec<TableStatus>,
    pub repaired: bool,
}

impl StructureReport {
    /// Inspects a raw document. A collection holding `null` counts as
    /// missing.
    pub fn inspect(root: &Value) -> Result<Self> {
        let object = root
            .as_object()
            .ok_or_else(|| StoreError::CorruptData("document root is not an object".into()))?;

        let tables = Table::ALL
            .into_iter()
            .map(|table| {
                let (present, entries) = match object.get(table.name()) {
                    None | Some(Value::Null) => (false, 0),
                    Some(Value::Array(items)) => (true, items.len()),
                    Some(Value::Object(map)) => (true, map.len()),
                    Some(_) => (true, 0),
                };
                TableStatus {
                    table,
                    present,
                    entries,
                }
            })
            .collect();

        Ok(Self {
            tables,
            repaired: false,
        })
    }

    pub fn missing(&self) -> Vec<Table> {
        self.tables
            .iter()
            .filter(|t| !t.present)
            .map(|t| t.table)
            .collect()
    }

    pub fn is_healthy(&self) -> bool {
        self.tables.iter().all(|t| t.present)
    }
}

/// Adds every missing collection to a raw document, leaving everything else
/// as it is. Returns the tables that were added.
pub(crate) fn fill_missing(root: &mut Value) -> Result<Vec<Table>> {
    let object = root
        .as_object_mut()
        .ok_or_else(|| StoreError::CorruptData("document root is not an object".into()))?;

    let mut added = Vec::new();
    for table in Table::ALL {
        let missing = matches!(object.get(table.name()), None | Some(Value::Null));
        if missing {
            object.insert(table.name().to_string(), table.empty_value());
            added.push(table);
        }
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_document_has_all_collections() {
        let value = serde_json::to_value(Document::default()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 6);
        for table in Table::ALL {
            assert_eq!(object[table.name()], table.empty_value());
        }
    }

    #[test]
    fn test_missing_and_null_collections_default() {
        let doc: Document =
            serde_json::from_value(json!({ "users": [], "settings": null })).unwrap();
        assert_eq!(doc, Document::default());
    }

    #[test]
    fn test_table_parse() {
        assert_eq!(Table::parse("debtHistory"), Some(Table::DebtHistory));
        assert_eq!(Table::parse("settings"), Some(Table::Settings));
        assert_eq!(Table::parse("debt_history"), None);
        assert!(!Table::Settings.is_sequence());
        assert!(Table::Investments.is_sequence());
    }

    #[test]
    fn test_inspect_reports_missing() {
        let report = StructureReport::inspect(&json!({
            "users": [{}, {}],
            "debtors": [],
            "transactions": [],
            "settings": { "currency": "BRL" },
            "debtHistory": null
        }))
        .unwrap();

        assert!(!report.is_healthy());
        assert_eq!(report.missing(), vec![Table::Investments, Table::DebtHistory]);
        assert_eq!(report.tables[0].entries, 2);
        assert_eq!(report.tables[4].entries, 1);
    }

    #[test]
    fn test_inspect_rejects_non_object() {
        assert!(matches!(
            StructureReport::inspect(&json!([1, 2])),
            Err(StoreError::CorruptData(_))
        ));
    }

    #[test]
    fn test_fill_missing_keeps_existing_content() {
        let mut root = json!({
            "users": [{ "id": "u1" }],
            "transactions": [{ "id": "t1" }],
            "custom": true
        });
        let added = fill_missing(&mut root).unwrap();

        assert_eq!(
            added,
            vec![
                Table::Debtors,
                Table::Investments,
                Table::Settings,
                Table::DebtHistory
            ]
        );
        assert_eq!(root["users"], json!([{ "id": "u1" }]));
        assert_eq!(root["transactions"], json!([{ "id": "t1" }]));
        assert_eq!(root["investments"], json!([]));
        assert_eq!(root["settings"], json!({}));
        assert_eq!(root["custom"], json!(true));
    }
}
