// Graph State
// WorkflowState threaded through every node of a run

use anyhow::bail;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Mutable record carried between steps of a single run.
///
/// `data` is an open string-keyed map: nodes write into it and conditional
/// edges read from it. `history` lists completed node names in execution
/// order (repeats included) and is appended by the runtime only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub history: Vec<String>,
}

impl WorkflowState {
    /// Fresh state for a new run: caller data, empty history.
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            history: Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Reads a string field. Absent or null yields `default`; any other
    /// JSON type is rejected.
    pub fn str_field(&self, key: &str, default: &str) -> anyhow::Result<String> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => bail!("field '{}' must be a string, got {}", key, type_name(other)),
        }
    }

    /// Reads a list of strings. Absent or null yields an empty list.
    pub fn str_list_field(&self, key: &str) -> anyhow::Result<Vec<String>> {
        match self.data.get(key) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => bail!(
                        "field '{}' must contain only strings, found {}",
                        key,
                        type_name(other)
                    ),
                })
                .collect(),
            Some(other) => bail!("field '{}' must be a list, got {}", key, type_name(other)),
        }
    }

    pub(crate) fn record_visit(&mut self, node_id: &str) {
        self.history.push(node_id.to_string());
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}
