//! Utility functions shared across CLI commands

use brokkr_core::Fragment;
use serde_json::Value;

/// Parse a `KEY=VALUE` argument. The value may itself contain `=`.
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

/// Build the fragment applied after every file from `--set` overrides.
///
/// Values are read as YAML so `--set volume_size=20` yields a number and
/// `--set tags={a: b}` a map. Anything that does not parse stays a string;
/// an empty value unsets the key.
pub fn overrides_fragment(overrides: &[(String, String)]) -> Fragment {
    let mut fragment = Fragment::new();
    for (key, raw) in overrides {
        let value = if raw.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml_ng::from_str::<Value>(raw).unwrap_or_else(|_| Value::String(raw.clone()))
        };
        fragment.insert(key.clone(), value);
    }
    fragment
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("region=us-east-1").unwrap(),
            ("region".to_string(), "us-east-1".to_string())
        );
        assert_eq!(
            parse_key_value("filter=name=ubuntu").unwrap(),
            ("filter".to_string(), "name=ubuntu".to_string())
        );
        assert_eq!(parse_key_value("empty=").unwrap().1, "");
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=value").is_err());
    }

    #[test]
    fn test_overrides_are_typed_as_yaml() {
        let fragment = overrides_fragment(&[
            ("volume_size".into(), "20".into()),
            ("encrypted".into(), "true".into()),
            ("ami_name".into(), "web-{{ timestamp }}".into()),
            ("tags".into(), "{Team: infra}".into()),
            ("ami_regions".into(), "[us-west-2, eu-west-1]".into()),
            ("source_ami".into(), "".into()),
        ]);

        assert_eq!(fragment.get("volume_size"), Some(&json!(20)));
        assert_eq!(fragment.get("encrypted"), Some(&json!(true)));
        assert_eq!(fragment.get("ami_name"), Some(&json!("web-{{ timestamp }}")));
        assert_eq!(fragment.get("tags"), Some(&json!({"Team": "infra"})));
        assert_eq!(fragment.get("ami_regions"), Some(&json!(["us-west-2", "eu-west-1"])));
        assert_eq!(fragment.get("source_ami"), Some(&Value::Null));
    }

    #[test]
    fn test_later_override_wins() {
        let fragment = overrides_fragment(&[("a".into(), "1".into()), ("a".into(), "2".into())]);
        assert_eq!(fragment.len(), 1);
        assert_eq!(fragment.get("a"), Some(&json!(2)));
    }
}
