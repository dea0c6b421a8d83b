//! Output directory for local artifacts

use serde::{Deserialize, Serialize};

use crate::decode::{FieldSpec, Prepare, Section};
use crate::defaults;
use crate::error::ConfigError;
use crate::interpolate::InterpolationContext;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub output_directory: String,
}

impl Section for OutputConfig {
    const NAME: &'static str = "output";
    const FIELDS: &'static [FieldSpec] = &[FieldSpec::replace("output_directory")];
}

impl Prepare for OutputConfig {
    fn prepare(&mut self, ctx: &InterpolationContext) -> Vec<ConfigError> {
        defaults::string(&mut self.output_directory, format!("output-{}", ctx.build_name));
        Vec::new()
    }
}
