//! Reusable validation rules
//!
//! Each rule inspects already-decoded values and returns the error it finds,
//! if any. Components call every rule they declare and collect the results;
//! none of them short-circuit.

use camino::Utf8Path;
use std::net::IpAddr;
use std::time::Duration;

use crate::error::ConfigError;

/// `value` must be non-empty
pub fn required(field: &str, value: &str) -> Option<ConfigError> {
    value
        .is_empty()
        .then(|| ConfigError::validation(field, format!("`{}` must be specified", field)))
}

/// At least one of `fields` must be set
pub fn required_any(fields: &[(&str, bool)]) -> Option<ConfigError> {
    if fields.iter().any(|(_, set)| *set) {
        return None;
    }
    let names: Vec<String> = fields.iter().map(|(name, _)| format!("`{}`", name)).collect();
    let first = fields.first().map(|(name, _)| *name).unwrap_or_default();
    Some(ConfigError::validation(
        first,
        format!("one of {} must be specified", names.join(" or ")),
    ))
}

/// `a` and `b` must not both be set
pub fn mutually_exclusive(a: (&str, bool), b: (&str, bool)) -> Option<ConfigError> {
    (a.1 && b.1).then(|| {
        ConfigError::validation(
            a.0,
            format!("`{}` and `{}` are mutually exclusive; only one can be specified", a.0, b.0),
        )
    })
}

/// `field` must be set whenever `condition` holds; `reason` completes the
/// sentence "`field` must be specified when ..."
pub fn required_when(field: &str, set: bool, condition: bool, reason: &str) -> Option<ConfigError> {
    (condition && !set).then(|| {
        ConfigError::validation(field, format!("`{}` must be specified when {}", field, reason))
    })
}

/// `value` must be one of `allowed`
pub fn one_of(field: &str, value: &str, allowed: &[&str]) -> Option<ConfigError> {
    (!allowed.contains(&value)).then(|| {
        ConfigError::validation(
            field,
            format!(
                "invalid `{}` '{}'; must be one of: {}",
                field,
                value,
                allowed.join(", ")
            ),
        )
    })
}

/// `value` must be a multiple of `factor`
pub fn multiple_of(field: &str, value: i64, factor: i64) -> Option<ConfigError> {
    (factor != 0 && value % factor != 0).then(|| {
        ConfigError::validation(field, format!("`{}` must be a multiple of {}", field, factor))
    })
}

/// `path`, when set, must point at an existing file
pub fn file_exists(field: &str, path: &str) -> Option<ConfigError> {
    if path.is_empty() {
        return None;
    }
    let p = Utf8Path::new(path);
    match p.metadata() {
        Ok(meta) if meta.is_file() => None,
        Ok(_) => Some(ConfigError::validation(
            field,
            format!("`{}` '{}' is not a file", field, path),
        )),
        Err(e) => Some(ConfigError::validation(
            field,
            format!("`{}` '{}' is not accessible: {}", field, path, e),
        )),
    }
}

/// Parse an `address/prefix` CIDR block
pub fn parse_cidr(value: &str) -> Result<(IpAddr, u8), String> {
    let (addr, prefix) = value
        .split_once('/')
        .ok_or_else(|| format!("'{}' is missing a prefix length", value))?;
    let addr: IpAddr = addr
        .parse()
        .map_err(|e| format!("'{}' has an invalid address: {}", value, e))?;
    let prefix: u8 = prefix
        .parse()
        .map_err(|_| format!("'{}' has an invalid prefix length", value))?;
    let max = if addr.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(format!("'{}' has a prefix length above {}", value, max));
    }
    Ok((addr, prefix))
}

/// Every entry of `values` must be a CIDR block
pub fn cidrs(field: &str, values: &[String]) -> Vec<ConfigError> {
    values
        .iter()
        .filter_map(|v| parse_cidr(v).err())
        .map(|msg| ConfigError::validation(field, format!("error parsing `{}`: {}", field, msg)))
        .collect()
}

/// Parse a human-readable duration such as `5m` or `1h30m`
pub fn duration(field: &str, raw: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(raw)
        .map_err(|e| ConfigError::validation(field, format!("failed parsing `{}`: {}", field, e)))
}

/// Keep the first error of each rule that fired
pub fn collect<I>(rules: I) -> Vec<ConfigError>
where
    I: IntoIterator<Item = Option<ConfigError>>,
{
    rules.into_iter().flatten().collect()
}
