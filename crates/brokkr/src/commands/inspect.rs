//! Inspect command

use anyhow::{bail, Result};
use serde::Serialize;

use crate::cli::{InspectArgs, OutputFormat};
use crate::commands::resolve_build;
use crate::output;

pub fn run(args: InspectArgs) -> Result<()> {
    let build = resolve_build(&args.resolve)?;

    for warning in build.warnings() {
        output::warning(warning);
    }

    if args.devices {
        let Some(mappings) = build.device_mappings() else {
            bail!("{} does not define block device mappings", build.kind());
        };
        return emit(&mappings?, args.format);
    }

    emit(&build.to_fragment()?, args.format)
}

fn emit<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml_ng::to_string(value)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
