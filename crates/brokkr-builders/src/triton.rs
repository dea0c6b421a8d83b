//! The `triton` builder configuration

use brokkr_core::common::Communicator;
use brokkr_core::{
    defaults, validate, ComponentErrors, ConfigError, Configuration, FieldSpec, Fragment,
    InterpolationContext, Prepare, Schema, Section, SectionReader,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_TRITON_URL: &str = "https://us-east-1.api.joyent.com";

/// Triton CloudAPI endpoint and credentials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TritonAccessConfig {
    pub triton_url: String,
    pub triton_account: String,
    pub triton_user: String,
    pub triton_key_id: String,
    pub triton_key_material: String,
    pub insecure_skip_tls_verify: bool,
}

impl Section for TritonAccessConfig {
    const NAME: &'static str = "access_config";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("triton_url"),
        FieldSpec::replace("triton_account"),
        FieldSpec::replace("triton_user"),
        FieldSpec::replace("triton_key_id"),
        FieldSpec::replace("triton_key_material"),
        FieldSpec::replace("insecure_skip_tls_verify"),
    ];
}

impl Prepare for TritonAccessConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        defaults::from_env("triton_url", &mut self.triton_url, "SDC_URL");
        defaults::string(&mut self.triton_url, DEFAULT_TRITON_URL);
        defaults::from_env("triton_account", &mut self.triton_account, "SDC_ACCOUNT");
        defaults::from_env("triton_key_id", &mut self.triton_key_id, "SDC_KEY_ID");

        validate::collect([
            validate::required("triton_account", &self.triton_account),
            validate::required("triton_key_id", &self.triton_key_id),
        ])
    }
}

/// Filter used to pick the source image when no image id is given
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MachineImageFilter {
    pub most_recent: bool,
    pub name: String,
    pub os: String,
    pub version: String,
    pub public: bool,
    pub state: String,
    pub owner: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl MachineImageFilter {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.os.is_empty()
            && self.version.is_empty()
            && self.state.is_empty()
            && self.owner.is_empty()
            && self.kind.is_empty()
    }
}

/// The machine the image is built from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceMachineConfig {
    pub source_machine_name: String,
    pub source_machine_package: String,
    pub source_machine_image: String,
    pub source_machine_networks: Vec<String>,
    pub source_machine_metadata: BTreeMap<String, String>,
    pub source_machine_tags: BTreeMap<String, String>,
    pub source_machine_firewall_enabled: bool,
    pub source_machine_image_filter: MachineImageFilter,
}

impl Section for SourceMachineConfig {
    const NAME: &'static str = "source_machine";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("source_machine_name"),
        FieldSpec::replace("source_machine_package"),
        FieldSpec::replace("source_machine_image"),
        FieldSpec::replace("source_machine_networks"),
        FieldSpec::replace("source_machine_metadata"),
        FieldSpec::union("source_machine_tags"),
        FieldSpec::replace("source_machine_firewall_enabled"),
        FieldSpec::replace("source_machine_image_filter"),
    ];
}

impl Prepare for SourceMachineConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        let mut errs = Vec::new();
        errs.extend(validate::required("source_machine_package", &self.source_machine_package));
        if !self.source_machine_image.is_empty() && !self.source_machine_image_filter.name.is_empty() {
            errs.push(ConfigError::validation(
                "source_machine_image",
                "you cannot specify a `source_machine_image` and also a name in `source_machine_image_filter`",
            ));
        }
        errs
    }
}

/// The image produced by the build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetImageConfig {
    pub image_name: String,
    pub image_version: String,
    pub image_description: String,
    pub image_homepage: String,
    pub image_eula_url: String,
    pub image_acls: Vec<String>,
    pub image_tags: BTreeMap<String, String>,
}

impl Section for TargetImageConfig {
    const NAME: &'static str = "target_image";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("image_name"),
        FieldSpec::replace("image_version"),
        FieldSpec::replace("image_description"),
        FieldSpec::replace("image_homepage"),
        FieldSpec::replace("image_eula_url"),
        FieldSpec::replace("image_acls"),
        FieldSpec::union("image_tags"),
    ];
}

impl Prepare for TargetImageConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        validate::collect([
            validate::required("image_name", &self.image_name),
            validate::required("image_version", &self.image_version),
        ])
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TritonConfig {
    pub access: TritonAccessConfig,
    pub source_machine: SourceMachineConfig,
    pub target_image: TargetImageConfig,
    pub comm: Communicator,
}

impl Configuration for TritonConfig {
    const BUILDER_TYPE: &'static str = "triton";

    fn schema() -> Schema {
        Schema::new()
            .section::<TritonAccessConfig>()
            .section::<SourceMachineConfig>()
            .section::<TargetImageConfig>()
            .section::<Communicator>()
    }

    fn from_sections(reader: &mut SectionReader) -> Self {
        Self {
            access: reader.section(),
            source_machine: reader.section(),
            target_image: reader.section(),
            comm: reader.section(),
        }
    }

    fn prepare(&mut self, ctx: &InterpolationContext) -> Vec<ComponentErrors> {
        vec![
            ComponentErrors::new(TritonAccessConfig::NAME, self.access.prepare(ctx)),
            ComponentErrors::new(SourceMachineConfig::NAME, self.source_machine.prepare(ctx)),
            ComponentErrors::new(TargetImageConfig::NAME, self.target_image.prepare(ctx)),
            ComponentErrors::new(Communicator::NAME, self.comm.prepare(ctx)),
        ]
    }

    fn to_fragment(&self) -> brokkr_core::Result<Fragment> {
        Fragment::from_sections([
            serde_json::to_value(&self.access),
            serde_json::to_value(&self.source_machine),
            serde_json::to_value(&self.target_image),
            serde_json::to_value(&self.comm),
        ])
    }
}
