//! The `lxc` builder configuration

use brokkr_core::common::OutputConfig;
use brokkr_core::{
    defaults, validate, ComponentErrors, ConfigError, Configuration, FieldSpec, Fragment,
    InterpolationContext, Prepare, Schema, Section, SectionReader,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wraps every command run in the container; `{{.Command}}` is the command itself
pub const DEFAULT_COMMAND_WRAPPER: &str = "{{.Command}}";

const DEFAULT_TARGET_RUNLEVEL: u8 = 3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LxcConfig {
    pub config_file: String,
    pub container_name: String,
    pub command_wrapper: String,
    #[serde(rename = "init_timeout")]
    pub raw_init_timeout: String,
    #[serde(skip)]
    pub init_timeout: Duration,
    pub create_options: Vec<String>,
    pub start_options: Vec<String>,
    pub attach_options: Vec<String>,
    pub template_name: String,
    pub template_parameters: Vec<String>,
    pub template_environment_vars: Vec<String>,
    pub target_runlevel: u8,

    #[serde(skip)]
    pub output: OutputConfig,
}

impl Section for LxcConfig {
    const NAME: &'static str = "lxc";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("config_file"),
        FieldSpec::replace("container_name"),
        FieldSpec::replace("command_wrapper"),
        FieldSpec::replace("init_timeout"),
        FieldSpec::replace("create_options"),
        FieldSpec::replace("start_options"),
        FieldSpec::replace("attach_options"),
        FieldSpec::replace("template_name"),
        FieldSpec::replace("template_parameters"),
        FieldSpec::replace("template_environment_vars"),
        FieldSpec::replace("target_runlevel"),
    ];
}

impl LxcConfig {
    fn leaf(&mut self, ctx: &InterpolationContext) -> Vec<ConfigError> {
        defaults::string(&mut self.container_name, defaults::build_scoped_name(ctx));
        defaults::string(&mut self.command_wrapper, DEFAULT_COMMAND_WRAPPER);
        defaults::string(&mut self.raw_init_timeout, "20s");
        if self.target_runlevel == 0 {
            self.target_runlevel = DEFAULT_TARGET_RUNLEVEL;
        }

        let mut errs = Vec::new();
        match validate::duration("init_timeout", &self.raw_init_timeout) {
            Ok(d) => self.init_timeout = d,
            Err(e) => errs.push(e),
        }

        match validate::required("config_file", &self.config_file) {
            Some(e) => errs.push(e),
            None => errs.extend(validate::file_exists("config_file", &self.config_file)),
        }
        errs.extend(validate::required("template_name", &self.template_name));
        errs
    }
}

impl Configuration for LxcConfig {
    const BUILDER_TYPE: &'static str = "lxc";

    fn schema() -> Schema {
        Schema::new()
            .section::<OutputConfig>()
            .section::<LxcConfig>()
            .exclude_from_interpolation(&["command_wrapper"])
    }

    fn from_sections(reader: &mut SectionReader) -> Self {
        let output = reader.section::<OutputConfig>();
        Self {
            output,
            ..reader.section::<LxcConfig>()
        }
    }

    fn prepare(&mut self, ctx: &InterpolationContext) -> Vec<ComponentErrors> {
        let output = self.output.prepare(ctx);
        let leaf = self.leaf(ctx);
        vec![
            ComponentErrors::new(OutputConfig::NAME, output),
            ComponentErrors::new(Self::BUILDER_TYPE, leaf),
        ]
    }

    fn to_fragment(&self) -> brokkr_core::Result<Fragment> {
        Fragment::from_sections([serde_json::to_value(&self.output), serde_json::to_value(self)])
    }
}
