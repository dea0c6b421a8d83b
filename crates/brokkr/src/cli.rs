//! CLI argument definitions

use brokkr_builders::BuilderKind;
use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::utils::parse_key_value;

#[derive(Parser, Debug)]
#[command(
    name = "brokkr",
    author,
    version,
    about = "Resolve layered machine-image builder configuration",
    long_about = "Brokkr merges ordered YAML/JSON fragments into one builder configuration, \
                  renders its templates, fills defaults and reports every problem at once.",
    propagate_version = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a configuration and report every problem found
    Validate(ValidateArgs),

    /// Print the fully resolved configuration
    Inspect(InspectArgs),

    /// List the supported builders and their field tables
    Builders(BuildersArgs),
}

/// Inputs shared by every command that resolves a configuration
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Builder type (amazon-ebs, cloudstack, lxc, lxd, triton, alicloud-ecs, virtualbox-ovf, vmware-vmx)
    pub builder: BuilderKind,

    /// Fragment files, applied in order; later files win
    #[arg(short = 'f', long = "fragment", value_name = "FILE", required = true)]
    pub fragments: Vec<Utf8PathBuf>,

    /// User variable available to templates as `user.KEY`
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub vars: Vec<(String, String)>,

    /// Override a key after all fragments; the value is read as YAML
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub overrides: Vec<(String, String)>,

    /// Build name exposed to templates as `build_name`
    #[arg(short = 'n', long, default_value = "default")]
    pub build_name: String,

    /// Directory exposed to templates as `template_dir`
    #[arg(long, env = "BROKKR_TEMPLATE_DIR")]
    pub template_dir: Option<Utf8PathBuf>,

    /// Take every string verbatim instead of rendering templates
    #[arg(long)]
    pub no_interpolate: bool,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub resolve: ResolveArgs,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub resolve: ResolveArgs,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    /// Print the derived block device mappings instead (amazon-ebs only)
    #[arg(long)]
    pub devices: bool,
}

#[derive(Args, Debug)]
pub struct BuildersArgs {
    /// Show the field table of one builder
    pub builder: Option<BuilderKind>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}
