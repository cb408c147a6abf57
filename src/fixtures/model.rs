use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

/// One CSV row keyed by header name. Values are kept as written.
pub type UserRow = HashMap<String, String>;

/// A parametrised search request and the status it should produce.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchCase {
    pub name: String,
    pub payload: Value,
    #[serde(default = "default_expected_status")]
    pub expected_status: u16,
}

fn default_expected_status() -> u16 {
    200
}

impl SearchCase {
    /// The payload as form fields; scalar values are stringified and nested
    /// values are sent as compact JSON.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        match &self.payload {
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| {
                    let text = match value {
                        Value::String(s) => s.clone(),
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    (key.clone(), text)
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}
