//! Per-section decoding of a merged value map

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use super::schema::{Schema, Section};
use crate::aggregate::ComponentErrors;
use crate::error::ConfigError;

/// Hands each section the keys it owns and records what failed to decode.
pub struct SectionReader {
    values: Map<String, Value>,
    schema: Schema,
    errors: Vec<ComponentErrors>,
}

impl SectionReader {
    pub fn new(values: Map<String, Value>, schema: Schema) -> Self {
        Self {
            values,
            schema,
            errors: Vec::new(),
        }
    }

    /// Decode the keys owned by `T`.
    ///
    /// Scalars are weakly typed: a number or bool where a string is expected
    /// is taken as its text, and a numeric or boolean string where a number
    /// or bool is expected is parsed. A key whose value still has the wrong
    /// shape is reported as a [`ConfigError::Decode`] and left at its default;
    /// the other keys of the section still decode.
    pub fn section<T: Section>(&mut self) -> T {
        let owned: Map<String, Value> = T::FIELDS
            .iter()
            .filter(|f| self.schema.owner(f.name) == Some(T::NAME))
            .filter_map(|f| self.values.get(f.name).map(|v| (f.name.to_string(), v.clone())))
            .collect();

        debug!("Decoding section {} ({} keys set)", T::NAME, owned.len());

        match from_map::<T>(owned.clone()) {
            Ok(section) => section,
            Err(_) => {
                let (section, errors) = decode_per_key::<T>(owned);
                self.record(T::NAME, errors);
                section
            }
        }
    }

    /// Attach errors found outside section decoding (interpolation, overlay)
    pub fn record(&mut self, component: &str, errors: Vec<ConfigError>) {
        if errors.is_empty() {
            return;
        }
        match self.errors.iter_mut().find(|c| c.component == component) {
            Some(existing) => existing.errors.extend(errors),
            None => self.errors.push(ComponentErrors::new(component, errors)),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Errors recorded so far, grouped by component in first-reported order
    pub fn into_errors(self) -> Vec<ComponentErrors> {
        self.errors
    }
}

fn from_map<T: DeserializeOwned>(map: Map<String, Value>) -> serde_json::Result<T> {
    serde_json::from_value(Value::Object(map))
}

/// Retry key by key so one bad value does not hide the rest
fn decode_per_key<T: Section>(owned: Map<String, Value>) -> (T, Vec<ConfigError>) {
    let mut good = Map::new();
    let mut errors = Vec::new();

    for (key, value) in owned {
        match decode_one::<T>(&key, value) {
            Ok(accepted) => {
                good.insert(key, accepted);
            }
            Err(e) => errors.push(ConfigError::decode(key, e.to_string())),
        }
    }

    match from_map::<T>(good) {
        Ok(section) => (section, errors),
        Err(e) => {
            // Keys that decode alone but not together; nothing sensible to keep
            errors.push(ConfigError::decode(T::NAME, e.to_string()));
            (T::default(), errors)
        }
    }
}

/// The first of the strict, stringified and parsed forms of `value` that
/// decodes; the strict error otherwise
fn decode_one<T: Section>(key: &str, value: Value) -> serde_json::Result<Value> {
    let strict = match try_key::<T>(key, &value) {
        Ok(()) => return Ok(value),
        Err(e) => e,
    };

    for candidate in [stringify_scalars(&value), parse_scalars(&value)] {
        if candidate != value && try_key::<T>(key, &candidate).is_ok() {
            trace!("Accepted weakly typed value for {}", key);
            return Ok(candidate);
        }
    }
    Err(strict)
}

fn try_key<T: Section>(key: &str, value: &Value) -> serde_json::Result<()> {
    let mut single = Map::new();
    single.insert(key.to_string(), value.clone());
    from_map::<T>(single).map(|_| ())
}

/// Numbers and bools become their text, at any depth
fn stringify_scalars(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Array(items) => Value::Array(items.iter().map(stringify_scalars).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), stringify_scalars(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Strings holding a number or bool become that number or bool, at any depth
fn parse_scalars(value: &Value) -> Value {
    match value {
        Value::String(s) => match s.trim() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            t => {
                if let Ok(n) = t.parse::<i64>() {
                    Value::from(n)
                } else if let Ok(n) = t.parse::<u64>() {
                    Value::from(n)
                } else {
                    match t.parse::<f64>() {
                        Ok(f) if f.is_finite() => Value::from(f),
                        _ => value.clone(),
                    }
                }
            }
        },
        Value::Array(items) => Value::Array(items.iter().map(parse_scalars).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), parse_scalars(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}
