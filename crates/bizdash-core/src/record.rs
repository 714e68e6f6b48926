//! Loosely typed list rows
//!
//! List rows are passed through as JSON objects; only the few fields needed to
//! label a row are interpreted.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of a list endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

/// Keys tried, in order, for a row label
const TITLE_KEYS: &[&str] = &["name", "client_name", "username"];

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    /// Display label: the first present title key, else `#id`
    pub fn title(&self) -> String {
        TITLE_KEYS
            .iter()
            .find_map(|key| self.text(key))
            .or_else(|| self.id().map(|id| format!("#{}", id)))
            .unwrap_or_else(|| "(untitled)".to_string())
    }

    /// Scalar field rendered as text; nulls, arrays and objects give None
    pub fn text(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Rows without an `is_active` flag count as active
    pub fn is_active(&self) -> bool {
        self.0
            .get("is_active")
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }

    /// Scalar fields in key order, for detail views
    pub fn scalar_fields(&self) -> Vec<(String, String)> {
        let mut fields: Vec<_> = self
            .0
            .keys()
            .filter_map(|key| self.text(key).map(|value| (key.clone(), value)))
            .collect();
        fields.sort();
        fields
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}
