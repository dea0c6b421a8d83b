//! Fragment overlay
//!
//! Applies fragments in order, key by key, following each key's
//! [`MergeStrategy`]. A `null` value unsets the key.

use serde_json::{Map, Value};
use tracing::trace;

use super::fragment::Fragment;
use super::schema::{MergeStrategy, Schema};
use crate::error::ConfigError;

/// Merge `fragments` into one value map.
///
/// Keys the schema does not declare are dropped and reported once each, in
/// the order they were first seen.
pub fn overlay(fragments: &[Fragment], schema: &Schema) -> (Map<String, Value>, Vec<ConfigError>) {
    let mut merged = Map::new();
    let mut unknown: Vec<String> = Vec::new();

    for fragment in fragments {
        for (key, value) in fragment.iter() {
            if !schema.contains(key) {
                if !unknown.contains(key) {
                    unknown.push(key.clone());
                }
                continue;
            }

            if value.is_null() {
                trace!("Unsetting {}", key);
                merged.remove(key);
                continue;
            }

            match schema.merge_strategy(key) {
                MergeStrategy::Replace => {
                    merged.insert(key.clone(), value.clone());
                }
                MergeStrategy::Union => match merged.get_mut(key) {
                    Some(existing) => union_into(existing, value),
                    None => {
                        merged.insert(key.clone(), value.clone());
                    }
                },
            }
        }
    }

    let errors = unknown.into_iter().map(ConfigError::unknown_key).collect();
    (merged, errors)
}

fn union_into(existing: &mut Value, incoming: &Value) {
    match (existing, incoming) {
        (Value::Object(current), Value::Object(next)) => {
            for (k, v) in next {
                current.insert(k.clone(), v.clone());
            }
        }
        (Value::Array(current), Value::Array(next)) => {
            current.extend(next.iter().cloned());
        }
        // Shapes differ: the later value stands and decoding reports it
        (slot, next) => *slot = next.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{FieldSpec, Section};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Probe {
        region: String,
        tags: BTreeMap<String, String>,
        labels: BTreeMap<String, String>,
        regions: Vec<String>,
    }

    impl Section for Probe {
        const NAME: &'static str = "sample";
        const FIELDS: &'static [FieldSpec] = &[
            FieldSpec::replace("region"),
            FieldSpec::replace("tags"),
            FieldSpec::union("labels"),
            FieldSpec::union("regions"),
        ];
    }

    fn schema() -> Schema {
        Schema::new().section::<Probe>()
    }

    fn frag(v: Value) -> Fragment {
        Fragment::from_value(v).unwrap()
    }

    #[test]
    fn test_later_fragment_wins() {
        let (merged, errors) = overlay(
            &[frag(json!({"region": "us-east-1"})), frag(json!({"region": "eu-west-1"}))],
            &schema(),
        );
        assert!(errors.is_empty());
        assert_eq!(merged["region"], "eu-west-1");
    }

    #[test]
    fn test_replace_maps_are_not_unioned() {
        let (merged, _) = overlay(
            &[frag(json!({"tags": {"A": "1"}})), frag(json!({"tags": {"B": "2"}}))],
            &schema(),
        );
        assert_eq!(merged["tags"], json!({"B": "2"}));
    }

    #[test]
    fn test_union_maps_and_lists_accumulate() {
        let (merged, _) = overlay(
            &[
                frag(json!({"labels": {"A": "1", "B": "x"}, "regions": ["a"]})),
                frag(json!({"labels": {"B": "2"}, "regions": ["b"]})),
            ],
            &schema(),
        );
        assert_eq!(merged["labels"], json!({"A": "1", "B": "2"}));
        assert_eq!(merged["regions"], json!(["a", "b"]));
    }

    #[test]
    fn test_null_unsets() {
        let (merged, _) = overlay(
            &[frag(json!({"region": "us-east-1"})), frag(json!({"region": null}))],
            &schema(),
        );
        assert!(!merged.contains_key("region"));
    }

    #[test]
    fn test_unknown_keys_reported_once_in_order() {
        let (merged, errors) = overlay(
            &[
                frag(json!({"zzz": 1, "region": "r"})),
                frag(json!({"aaa": 2, "zzz": 3})),
            ],
            &schema(),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(
            errors,
            vec![ConfigError::unknown_key("zzz"), ConfigError::unknown_key("aaa")]
        );
    }

    #[test]
    fn test_union_shape_mismatch_takes_later_value() {
        let (merged, _) = overlay(
            &[frag(json!({"labels": {"A": "1"}})), frag(json!({"labels": ["x"]}))],
            &schema(),
        );
        assert_eq!(merged["labels"], json!(["x"]));
    }
}
