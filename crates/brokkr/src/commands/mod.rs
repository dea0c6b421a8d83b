//! Command implementations

pub mod builders;
pub mod inspect;
pub mod validate;

use anyhow::{anyhow, Context, Result};
use brokkr_builders::ResolvedBuild;
use brokkr_core::{DecodeOptions, Fragment, InterpolationContext};
use tracing::{debug, info};

use crate::cli::ResolveArgs;
use crate::output;
use crate::utils::overrides_fragment;

/// Load the fragments named on the command line and resolve them.
///
/// Every problem is printed before the error is returned.
pub(crate) fn resolve_build(args: &ResolveArgs) -> Result<ResolvedBuild> {
    let mut fragments = Vec::with_capacity(args.fragments.len() + 1);
    for path in &args.fragments {
        debug!("Loading fragment {}", path);
        let fragment =
            Fragment::load(path).with_context(|| format!("Failed to load fragment {}", path))?;
        fragments.push(fragment);
    }
    if !args.overrides.is_empty() {
        fragments.push(overrides_fragment(&args.overrides));
    }

    let mut ctx = InterpolationContext::new(&args.build_name, args.builder.as_str())
        .with_user_variables(args.vars.iter().cloned().collect());
    if let Some(dir) = &args.template_dir {
        ctx = ctx.with_template_dir(dir.clone());
    }

    let options = DecodeOptions {
        interpolate: !args.no_interpolate,
    };

    info!(
        "Resolving {} build '{}' from {} fragment(s)",
        args.builder,
        args.build_name,
        fragments.len()
    );

    args.builder
        .resolve(&fragments, &options, &ctx)
        .map_err(|err| {
            output::aggregate(&err);
            anyhow!("{} configuration is invalid", args.builder)
        })
}
