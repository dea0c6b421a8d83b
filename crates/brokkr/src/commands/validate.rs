//! Validate command

use anyhow::{bail, Result};

use crate::cli::ValidateArgs;
use crate::commands::resolve_build;
use crate::output;

pub fn run(args: ValidateArgs) -> Result<()> {
    let build = resolve_build(&args.resolve)?;

    for warning in build.warnings() {
        output::warning(warning);
    }

    if args.strict && !build.warnings().is_empty() {
        bail!(
            "{} warning(s) reported and --strict is set",
            build.warnings().len()
        );
    }

    output::success(&format!("{} configuration is valid", build.kind()));
    output::kv("Build", &args.resolve.build_name);
    output::kv("Fragments", &args.resolve.fragments.len().to_string());
    if !args.resolve.overrides.is_empty() {
        output::kv("Overrides", &args.resolve.overrides.len().to_string());
    }

    Ok(())
}
