//! Configuration fragments
//!
//! A fragment is one partial configuration payload: a flat-at-the-top map of
//! keys to scalar, list or map values. Fragments are applied in order by the
//! [`overlay`](super::overlay) step.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use tracing::debug;

use crate::error::{Error, Result};

/// One partial configuration payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment(Map<String, Value>);

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON value; it must be an object (or null, read as empty)
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(Error::invalid_fragment(format!(
                "expected a mapping of configuration keys, found {}",
                kind_of(&other)
            ))),
        }
    }

    /// Parse YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let value: Value = serde_yaml_ng::from_str(content)?;
        Self::from_value(value)
    }

    /// Parse JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(value)
    }

    /// Load a fragment file. `.json` files are read as JSON, anything else as YAML.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::fragment_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;

        debug!("Loaded fragment from {}", path);

        match path.extension() {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Flatten serialized sections into one fragment, later sections
    /// overwriting earlier ones on shared keys.
    pub fn from_sections<I>(sections: I) -> Result<Self>
    where
        I: IntoIterator<Item = serde_json::Result<Value>>,
    {
        let mut fragment = Self::new();
        for section in sections {
            match section? {
                Value::Object(map) => fragment.0.extend(map),
                other => {
                    return Err(Error::invalid_fragment(format!(
                        "section serialized to {}, expected a mapping",
                        kind_of(&other)
                    )))
                }
            }
        }
        Ok(fragment)
    }

    /// Builder-style insert, handy for programmatic override fragments
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Render as YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(&self.0)?)
    }
}

impl From<Map<String, Value>> for Fragment {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
