//! Builder configuration tests

mod alicloud_tests;
mod cloudstack_tests;
mod lxd_tests;

use brokkr_core::{
    field_table_mismatches, resolve, AggregateError, Configuration, DecodeOptions, Fragment,
    InterpolationContext, Resolution, Section,
};
use chrono::{TimeZone, Utc};
use std::fmt::Debug;

/// Context for build `web` started at 2024-03-01T12:00:00Z (unix 1709294400)
pub(crate) fn ctx_for<C: Configuration>() -> InterpolationContext {
    InterpolationContext::at(
        "web",
        C::BUILDER_TYPE,
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    )
}

pub(crate) fn yaml(content: &str) -> Fragment {
    Fragment::from_yaml_str(content).unwrap()
}

pub(crate) fn resolve_ok<C: Configuration>(fragments: &[Fragment]) -> Resolution<C> {
    match resolve::<C>(fragments, &DecodeOptions::default(), &ctx_for::<C>()) {
        Ok(resolution) => resolution,
        Err(e) => panic!("expected {} to resolve, got {}", C::BUILDER_TYPE, e),
    }
}

pub(crate) fn resolve_err<C: Configuration>(fragments: &[Fragment]) -> AggregateError {
    match resolve::<C>(fragments, &DecodeOptions::default(), &ctx_for::<C>()) {
        Ok(_) => panic!("expected {} to fail", C::BUILDER_TYPE),
        Err(e) => e,
    }
}

/// Resolving the flattened form of a resolved configuration changes nothing
pub(crate) fn assert_idempotent<C>(fragments: &[Fragment])
where
    C: Configuration + PartialEq + Debug,
{
    let first = resolve_ok::<C>(fragments);
    let flattened = first.config.to_fragment().unwrap();
    let second = resolve_ok::<C>(&[flattened]);
    assert_eq!(first.config, second.config);
}

/// Every serialized key of a section is declared in its field table and vice versa
pub(crate) fn assert_field_table<T: Section>() {
    let (undeclared, unserialized) = field_table_mismatches::<T>();
    assert!(undeclared.is_empty(), "{} serializes undeclared keys: {:?}", T::NAME, undeclared);
    assert!(unserialized.is_empty(), "{} declares unserialized keys: {:?}", T::NAME, unserialized);
}

/// Components that reported at least one error, in order, without repeats
pub(crate) fn components(err: &AggregateError) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for e in err.errors() {
        if seen.last() != Some(&e.component.as_str()) {
            seen.push(&e.component);
        }
    }
    seen
}
