//! Layered decoding and the resolution pipeline
//!
//! `decode` turns an ordered list of fragments into a typed configuration:
//! overlay, interpolate, then hand each section its keys. `resolve` runs the
//! whole pipeline: decode, every component's prepare step, aggregation.

mod fragment;
mod overlay;
mod reader;
mod schema;

pub use fragment::Fragment;
pub use overlay::overlay;
pub use reader::SectionReader;
pub use schema::{field_table_mismatches, FieldSpec, MergeStrategy, Schema, Section};

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::aggregate::{aggregate, AggregateError, ComponentErrors};
use crate::error::{ConfigError, Result};
use crate::interpolate::{render_tree, InterpolationContext};

/// Component name for problems found before any section is decoded
pub const DECODER_COMPONENT: &str = "decode";

/// Options for the decode step
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    /// Render template expressions in string values
    pub interpolate: bool,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { interpolate: true }
    }
}

/// A complete per-backend configuration
pub trait Configuration: Sized {
    /// Builder type name, e.g. `amazon-ebs`
    const BUILDER_TYPE: &'static str;

    /// Field table for this backend
    fn schema() -> Schema;

    /// Build the configuration from decoded sections
    fn from_sections(reader: &mut SectionReader) -> Self;

    /// Apply defaults and validate every component.
    ///
    /// Must run every component's prepare step regardless of earlier failures.
    fn prepare(&mut self, ctx: &InterpolationContext) -> Vec<ComponentErrors>;

    /// Non-fatal observations about a valid configuration
    fn warnings(&self) -> Vec<String> {
        Vec::new()
    }

    /// Fold derived values back once resolution has succeeded
    fn finalize(&mut self) {}

    /// The flattened view of this configuration, decodable as a fragment
    fn to_fragment(&self) -> Result<Fragment>;
}

/// Prepare step of one sub-configuration
pub trait Prepare {
    /// Fill defaults, then check every rule; returns all problems found
    fn prepare(&mut self, ctx: &InterpolationContext) -> Vec<ConfigError>;
}

/// A successfully resolved configuration
#[derive(Debug, Clone)]
pub struct Resolution<C> {
    pub config: C,
    pub warnings: Vec<String>,
}

/// Decode fragments into a configuration without running prepare steps.
///
/// The returned error lists are never short-circuited: unknown keys,
/// template failures and type mismatches are all reported together.
pub fn decode<C: Configuration>(
    fragments: &[Fragment],
    options: &DecodeOptions,
    ctx: &InterpolationContext,
) -> (C, Vec<ComponentErrors>) {
    let schema = C::schema();
    let (mut values, unknown) = overlay(fragments, &schema);

    debug!(
        "Overlaid {} fragment(s) for {}: {} key(s) set",
        fragments.len(),
        C::BUILDER_TYPE,
        values.len()
    );

    let rendering = if options.interpolate {
        render_tree(&mut values, &schema, ctx)
    } else {
        Vec::new()
    };

    let mut reader = SectionReader::new(values, schema);
    reader.record(DECODER_COMPONENT, unknown);
    for error in rendering {
        let owner = error
            .field()
            .and_then(|path| reader.schema().owner(top_level_key(path)))
            .unwrap_or(DECODER_COMPONENT);
        reader.record(owner, vec![error]);
    }

    let config = C::from_sections(&mut reader);
    (config, reader.into_errors())
}

/// Run the full pipeline for one backend.
pub fn resolve<C: Configuration>(
    fragments: &[Fragment],
    options: &DecodeOptions,
    ctx: &InterpolationContext,
) -> std::result::Result<Resolution<C>, AggregateError> {
    let (mut config, mut errors) = decode::<C>(fragments, options, ctx);

    // A key that failed to decode sits at its default; rules about it would
    // only repeat the decode error
    let undecodable: BTreeSet<String> = errors
        .iter()
        .flat_map(|c| &c.errors)
        .filter_map(|e| match e {
            ConfigError::Decode { field, .. } => Some(field.clone()),
            _ => None,
        })
        .collect();
    for mut component in config.prepare(ctx) {
        component.errors.retain(|e| {
            !matches!(e, ConfigError::Validation { field, .. } if undecodable.contains(field))
        });
        errors.push(component);
    }

    aggregate(errors)?;

    config.finalize();
    let warnings = config.warnings();
    for warning in &warnings {
        warn!("{}: {}", C::BUILDER_TYPE, warning);
    }

    info!("Resolved {} configuration for build '{}'", C::BUILDER_TYPE, ctx.build_name);
    Ok(Resolution { config, warnings })
}

fn top_level_key(path: &str) -> &str {
    let end = path.find(['.', '[']).unwrap_or(path.len());
    &path[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Naming {
        name: String,
    }

    impl Section for Naming {
        const NAME: &'static str = "naming";
        const FIELDS: &'static [FieldSpec] = &[FieldSpec::replace("name")];
    }

    impl Prepare for Naming {
        fn prepare(&mut self, ctx: &InterpolationContext) -> Vec<ConfigError> {
            if self.name.is_empty() {
                self.name = format!("packer-{}", ctx.build_name);
            }
            Vec::new()
        }
    }

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    struct Toy {
        size: u32,
        script: String,
        #[serde(skip)]
        naming: Naming,
    }

    impl Section for Toy {
        const NAME: &'static str = "toy";
        const FIELDS: &'static [FieldSpec] = &[FieldSpec::replace("size"), FieldSpec::replace("script")];
    }

    impl Configuration for Toy {
        const BUILDER_TYPE: &'static str = "toy";

        fn schema() -> Schema {
            Schema::new()
                .section::<Naming>()
                .section::<Toy>()
                .exclude_from_interpolation(&["script"])
        }

        fn from_sections(reader: &mut SectionReader) -> Self {
            let naming = reader.section::<Naming>();
            Self {
                naming,
                ..reader.section::<Toy>()
            }
        }

        fn prepare(&mut self, ctx: &InterpolationContext) -> Vec<ComponentErrors> {
            let naming = self.naming.prepare(ctx);
            let mut errs = Vec::new();
            if self.size % 2 != 0 {
                errs.push(ConfigError::validation("size", "`size` must be even"));
            }
            if self.size == 0 && self.script.is_empty() {
                errs.push(ConfigError::validation("size", "one of `size` or `script` must be specified"));
            }
            vec![
                ComponentErrors::new(Naming::NAME, naming),
                ComponentErrors::new(Self::BUILDER_TYPE, errs),
            ]
        }

        fn to_fragment(&self) -> Result<Fragment> {
            Fragment::from_sections([serde_json::to_value(&self.naming), serde_json::to_value(self)])
        }
    }

    fn ctx() -> InterpolationContext {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        InterpolationContext::at("web", "toy", t)
    }

    fn frag(v: serde_json::Value) -> Fragment {
        Fragment::from_value(v).unwrap()
    }

    #[test]
    fn test_resolve_applies_defaults() {
        let res = resolve::<Toy>(&[frag(json!({"size": 4}))], &DecodeOptions::default(), &ctx()).unwrap();
        assert_eq!(res.config.naming.name, "packer-web");
        assert_eq!(res.config.size, 4);
        assert!(res.warnings.is_empty());
    }

    #[test]
    fn test_interpolation_skips_excluded_keys() {
        let res = resolve::<Toy>(
            &[frag(json!({"name": "{{ build_name }}-x", "script": "{{ keep }}"}))],
            &DecodeOptions::default(),
            &ctx(),
        )
        .unwrap();
        assert_eq!(res.config.naming.name, "web-x");
        assert_eq!(res.config.script, "{{ keep }}");
    }

    #[test]
    fn test_interpolation_can_be_disabled() {
        let (toy, errors) = decode::<Toy>(
            &[frag(json!({"name": "{{ build_name }}"}))],
            &DecodeOptions { interpolate: false },
            &ctx(),
        );
        assert!(errors.is_empty());
        assert_eq!(toy.naming.name, "{{ build_name }}");
    }

    #[test]
    fn test_all_problems_reported_together() {
        let err = resolve::<Toy>(
            &[frag(json!({"size": 3, "colour": "red", "name": "{{ nope }}"}))],
            &DecodeOptions::default(),
            &ctx(),
        )
        .unwrap_err();

        assert_eq!(err.len(), 3);
        let components: Vec<_> = err.errors().iter().map(|e| e.component.as_str()).collect();
        assert_eq!(components, vec!["decode", "naming", "toy"]);
        assert!(err.mentions("unknown configuration key: 'colour'"));
        assert!(err.mentions("`size` must be even"));
    }

    #[test]
    fn test_type_mismatch_is_decode_error() {
        let (_, errors) = decode::<Toy>(&[frag(json!({"size": "big"}))], &DecodeOptions::default(), &ctx());
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0].errors[0], ConfigError::Decode { .. }));
    }

    #[test]
    fn test_scalars_are_weakly_typed() {
        let res = resolve::<Toy>(
            &[frag(json!({"size": "6", "script": 12}))],
            &DecodeOptions::default(),
            &ctx(),
        )
        .unwrap();
        assert_eq!(res.config.size, 6);
        assert_eq!(res.config.script, "12");
    }

    #[test]
    fn test_undecodable_key_is_reported_once() {
        let err = resolve::<Toy>(&[frag(json!({"size": "big"}))], &DecodeOptions::default(), &ctx())
            .unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.errors()[0].component, "toy");
        assert!(matches!(err.errors()[0].error, ConfigError::Decode { .. }));
    }

    #[test]
    fn test_rules_still_apply_to_unset_keys() {
        let err = resolve::<Toy>(&[frag(json!({"name": "n"}))], &DecodeOptions::default(), &ctx())
            .unwrap_err();
        assert_eq!(err.len(), 1);
        assert!(err.mentions("one of `size` or `script` must be specified"));
    }

    #[test]
    fn test_re_resolving_is_idempotent() {
        let first = resolve::<Toy>(&[frag(json!({"size": 8}))], &DecodeOptions::default(), &ctx()).unwrap();
        let again = resolve::<Toy>(
            &[first.config.to_fragment().unwrap()],
            &DecodeOptions::default(),
            &ctx(),
        )
        .unwrap();
        assert_eq!(first.config, again.config);
    }

    #[test]
    fn test_top_level_key() {
        assert_eq!(top_level_key("run_tags.Name"), "run_tags");
        assert_eq!(top_level_key("security_group_ids[1]"), "security_group_ids");
        assert_eq!(top_level_key("zone"), "zone");
    }
}
