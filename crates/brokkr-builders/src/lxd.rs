//! The `lxd` builder configuration

use brokkr_core::{
    defaults, validate, ComponentErrors, ConfigError, Configuration, FieldSpec, Fragment,
    InterpolationContext, Schema, Section, SectionReader,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::lxc::DEFAULT_COMMAND_WRAPPER;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LxdConfig {
    pub output_image: String,
    pub container_name: String,
    pub command_wrapper: String,
    /// Image alias or fingerprint, e.g. `ubuntu-daily:x`
    pub image: String,
    pub profile: String,
    /// Seconds to wait after the container starts
    pub init_sleep: String,
    pub publish_properties: BTreeMap<String, String>,
    pub launch_config: BTreeMap<String, String>,
}

impl Section for LxdConfig {
    const NAME: &'static str = "lxd";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("output_image"),
        FieldSpec::replace("container_name"),
        FieldSpec::replace("command_wrapper"),
        FieldSpec::replace("image"),
        FieldSpec::replace("profile"),
        FieldSpec::replace("init_sleep"),
        FieldSpec::union("publish_properties"),
        FieldSpec::union("launch_config"),
    ];
}

impl LxdConfig {
    fn leaf(&mut self, ctx: &InterpolationContext) -> Vec<ConfigError> {
        defaults::string(&mut self.container_name, defaults::build_scoped_name(ctx));
        defaults::string(&mut self.output_image, self.container_name.clone());
        defaults::string(&mut self.command_wrapper, DEFAULT_COMMAND_WRAPPER);
        defaults::string(&mut self.profile, "default");
        defaults::string(&mut self.init_sleep, "3");

        let mut errs = Vec::new();
        if validate::required("image", &self.image).is_some() {
            errs.push(ConfigError::validation(
                "image",
                "`image` is a required parameter for LXD. Please specify an image by alias or fingerprint. e.g. `ubuntu-daily:x`",
            ));
        }
        if self.init_sleep.parse::<u64>().is_err() {
            errs.push(ConfigError::validation(
                "init_sleep",
                format!("`init_sleep` must be a whole number of seconds, got '{}'", self.init_sleep),
            ));
        }
        errs
    }
}

impl Configuration for LxdConfig {
    const BUILDER_TYPE: &'static str = "lxd";

    fn schema() -> Schema {
        Schema::new()
            .section::<LxdConfig>()
            .exclude_from_interpolation(&["command_wrapper"])
    }

    fn from_sections(reader: &mut SectionReader) -> Self {
        reader.section::<LxdConfig>()
    }

    fn prepare(&mut self, ctx: &InterpolationContext) -> Vec<ComponentErrors> {
        let leaf = self.leaf(ctx);
        vec![ComponentErrors::new(Self::BUILDER_TYPE, leaf)]
    }

    fn to_fragment(&self) -> brokkr_core::Result<Fragment> {
        Fragment::from_sections([serde_json::to_value(self)])
    }
}
