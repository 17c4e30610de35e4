//! Transaction file loader
//!
//! Reads a JSON array of nested transaction objects and flattens each one
//! into a single-level map, joining nested keys with `_`:
//!
//! ```text
//! {"userWallet": "0xab", "actionData": {"amount": "5"}}
//!   => userWallet = "0xab", actionData_amount = "5"
//! ```

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};

/// Separator placed between parent and child keys
pub const KEY_SEPARATOR: &str = "_";

/// One flattened input record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    fields: BTreeMap<String, Value>,
}

impl FlatRecord {
    /// Flatten a JSON object
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let mut fields = BTreeMap::new();
        flatten_into(&mut fields, None, object);
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn flatten_into(out: &mut BTreeMap<String, Value>, prefix: Option<&str>, object: &Map<String, Value>) {
    for (key, value) in object {
        let full_key = match prefix {
            Some(p) => format!("{}{}{}", p, KEY_SEPARATOR, key),
            None => key.clone(),
        };
        match value {
            // Empty objects are kept as leaves so the key is not lost
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, Some(full_key.as_str()), inner),
            other => {
                out.insert(full_key, other.clone());
            }
        }
    }
}

/// Parse an in-memory JSON document into flat records
pub fn parse_records(json: &str) -> Result<Vec<FlatRecord>> {
    let document: Value = serde_json::from_str(json)?;

    let items = match document {
        Value::Array(items) => items,
        other => {
            return Err(Error::Parse(format!(
                "expected a JSON array of transaction objects, found {}",
                json_type_name(&other)
            )))
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(object) => Ok(FlatRecord::from_object(object)),
            other => Err(Error::Parse(format!(
                "element {} is {}, expected an object",
                index,
                json_type_name(other)
            ))),
        })
        .collect()
}

/// Read and flatten the transaction file at `path`
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<FlatRecord>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound(path.display().to_string()),
        _ => Error::Io(format!("{}: {}", path.display(), e)),
    })?;

    let records = parse_records(&contents)?;
    debug!("Parsed {} records from {}", records.len(), path.display());
    Ok(records)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
