//! Defaulting helpers shared by every component's prepare step

use std::env;
use tracing::debug;

use crate::interpolate::InterpolationContext;

/// Set `value` to `default` when it is empty
pub fn string(value: &mut String, default: impl Into<String>) {
    if value.is_empty() {
        *value = default.into();
    }
}

/// Fill `value` from the environment when it is empty.
///
/// The variable is read at call time, so a resolution sees the environment
/// as it is when that resolution runs.
pub fn from_env(field: &str, value: &mut String, var: &str) {
    if !value.is_empty() {
        return;
    }
    if let Ok(found) = env::var(var) {
        if !found.is_empty() {
            debug!("Using {} for `{}`", var, field);
            *value = found;
        }
    }
}

/// `packer-{build_name}`
pub fn build_scoped_name(ctx: &InterpolationContext) -> String {
    format!("packer-{}", ctx.build_name)
}

/// `packer-{build_name}-{unix timestamp}`
pub fn timestamped_name(ctx: &InterpolationContext) -> String {
    format!("packer-{}-{}", ctx.build_name, ctx.timestamp())
}

/// Name for a short-lived cloud resource: unique per call, ordered by build start
pub fn temporary_name(ctx: &InterpolationContext) -> String {
    format!("packer_{}", ctx.time_ordered_uuid())
}

/// Remove duplicates, keeping the first occurrence of each value
pub fn dedup_preserving_order(values: &mut Vec<String>) {
    let mut seen = std::collections::BTreeSet::new();
    values.retain(|v| seen.insert(v.clone()));
}
