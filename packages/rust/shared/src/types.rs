//! Core domain types: review records, tables, and run identifiers.
//!
//! Records are dynamic. Their fields are decided by whatever analysis step
//! produced them, so the column set of a [`Table`] is inferred at render time
//! as the union of keys across all rows, in first-seen order.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ReviewCrewError, Result};

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for crew run identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One row of review data: field name → value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub IndexMap<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fixtures.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Text for the cell under `column`. Missing fields render as empty.
    pub fn cell(&self, column: &str) -> String {
        self.0.get(column).map(cell_text).unwrap_or_default()
    }
}

/// Render a JSON value as cell text.
///
/// Strings are used verbatim, `null` is empty, scalars use their JSON form,
/// and nested arrays/objects are written as compact JSON.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// An ordered sequence of records. Keys are not required to match across rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    pub records: Vec<Record>,
}

impl Table {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Union of keys across all records, preserving first-seen order.
    pub fn columns(&self) -> Vec<String> {
        let mut seen: IndexSet<&str> = IndexSet::new();
        for record in &self.records {
            seen.extend(record.keys());
        }
        seen.into_iter().map(String::from).collect()
    }

    /// Rows as cell text, aligned to [`Table::columns`].
    pub fn rows(&self, columns: &[String]) -> Vec<Vec<String>> {
        self.records
            .iter()
            .map(|r| columns.iter().map(|c| r.cell(c)).collect())
            .collect()
    }

    /// Build a table from loosely-typed JSON.
    ///
    /// Accepts an array of objects, or a string holding such an array (agents
    /// frequently pass tool arguments as serialized JSON). Anything else is a
    /// validation error.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => {
                let mut records = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    match item {
                        Value::Object(map) => {
                            let fields = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                            records.push(Record(fields));
                        }
                        other => {
                            return Err(ReviewCrewError::validation(format!(
                                "row {i} is not an object (found {})",
                                json_kind(other)
                            )));
                        }
                    }
                }
                Ok(Self { records })
            }
            Value::String(s) => {
                let parsed: Value = serde_json::from_str(s).map_err(|e| {
                    ReviewCrewError::validation(format!("data is not valid JSON: {e}"))
                })?;
                if parsed.is_string() {
                    return Err(ReviewCrewError::validation(
                        "data must be a list of records, found a string",
                    ));
                }
                Self::from_json(&parsed)
            }
            other => Err(ReviewCrewError::validation(format!(
                "data must be a list of records, found {}",
                json_kind(other)
            ))),
        }
    }

    /// Parse a table from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| ReviewCrewError::validation(format!("data is not valid JSON: {e}")))?;
        Self::from_json(&value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_id_roundtrip() {
        let id = RunId::new();
        let parsed: RunId = id.to_string().parse().expect("parse RunId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn columns_are_union_in_first_seen_order() {
        let table = Table::from_json(&json!([
            {"name": "A", "rating": "5"},
            {"price": 10, "name": "B"},
            {"rating": "3", "url": "https://x.example"}
        ]))
        .unwrap();

        assert_eq!(table.columns(), vec!["name", "rating", "price", "url"]);
    }

    #[test]
    fn missing_cells_are_empty() {
        let table = Table::from_json(&json!([{"name": "A", "rating": "5"}, {"name": "B"}])).unwrap();
        let cols = table.columns();
        let rows = table.rows(&cols);
        assert_eq!(rows[1], vec!["B".to_string(), String::new()]);
    }

    #[test]
    fn cell_text_coerces_values() {
        assert_eq!(cell_text(&json!(null)), "");
        assert_eq!(cell_text(&json!(4.5)), "4.5");
        assert_eq!(cell_text(&json!(true)), "true");
        assert_eq!(cell_text(&json!(["wifi", "usb"])), r#"["wifi","usb"]"#);
    }

    #[test]
    fn from_json_accepts_serialized_string() {
        let table = Table::from_json(&json!(r#"[{"name": "A"}]"#)).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].cell("name"), "A");
    }

    #[test]
    fn from_json_rejects_non_tabular() {
        let err = Table::from_json(&json!({"name": "A"})).unwrap_err();
        assert!(err.to_string().contains("list of records"));

        let err = Table::from_json(&json!([{"name": "A"}, 3])).unwrap_err();
        assert!(err.to_string().contains("row 1"));

        let err = Table::from_json(&json!("not json at all")).unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));

        assert!(Table::from_json(&json!(r#""nested string""#)).is_err());
    }

    #[test]
    fn empty_array_is_an_empty_table() {
        let table = Table::from_json(&json!([])).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn table_deserializes_preserving_key_order() {
        let table: Table = serde_json::from_str(r#"[{"z": 1, "a": 2}]"#).unwrap();
        assert_eq!(table.columns(), vec!["z", "a"]);
    }
}
