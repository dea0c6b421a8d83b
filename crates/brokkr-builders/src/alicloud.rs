//! The `alicloud-ecs` builder configuration

use brokkr_core::common::Communicator;
use brokkr_core::{
    defaults, validate, ComponentErrors, ConfigError, Configuration, FieldSpec, Fragment,
    InterpolationContext, Prepare, Schema, Section, SectionReader,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const IMAGE_NAME_MIN: usize = 2;
const IMAGE_NAME_MAX: usize = 128;

/// Alibaba Cloud credentials and region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlicloudAccessConfig {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
    pub security_token: String,
    pub skip_region_validation: bool,
}

impl Section for AlicloudAccessConfig {
    const NAME: &'static str = "access_config";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("access_key"),
        FieldSpec::replace("secret_key"),
        FieldSpec::replace("region"),
        FieldSpec::replace("security_token"),
        FieldSpec::replace("skip_region_validation"),
    ];
}

impl Prepare for AlicloudAccessConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        defaults::from_env("access_key", &mut self.access_key, "ALICLOUD_ACCESS_KEY");
        defaults::from_env("secret_key", &mut self.secret_key, "ALICLOUD_SECRET_KEY");
        defaults::from_env("region", &mut self.region, "ALICLOUD_REGION");

        validate::collect([
            validate::required("access_key", &self.access_key),
            validate::required("secret_key", &self.secret_key),
            validate::required("region", &self.region),
        ])
    }
}

/// The ECS instance the image is built on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlicloudRunConfig {
    pub instance_type: String,
    pub source_image: String,
    pub zone_id: String,
    pub io_optimized: Option<bool>,
    pub instance_name: String,
    pub internet_charge_type: String,
    pub internet_max_bandwidth_out: u32,
    pub security_group_id: String,
    pub security_group_name: String,
    pub vpc_id: String,
    pub vswitch_id: String,
    pub user_data: String,
    pub user_data_file: String,
    pub force_stop_instance: bool,
    pub disable_stop_instance: bool,
}

impl Section for AlicloudRunConfig {
    const NAME: &'static str = "run_config";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("instance_type"),
        FieldSpec::replace("source_image"),
        FieldSpec::replace("zone_id"),
        FieldSpec::replace("io_optimized"),
        FieldSpec::replace("instance_name"),
        FieldSpec::replace("internet_charge_type"),
        FieldSpec::replace("internet_max_bandwidth_out"),
        FieldSpec::replace("security_group_id"),
        FieldSpec::replace("security_group_name"),
        FieldSpec::replace("vpc_id"),
        FieldSpec::replace("vswitch_id"),
        FieldSpec::replace("user_data"),
        FieldSpec::replace("user_data_file"),
        FieldSpec::replace("force_stop_instance"),
        FieldSpec::replace("disable_stop_instance"),
    ];
}

impl Prepare for AlicloudRunConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        let mut errs = validate::collect([
            validate::required("instance_type", &self.instance_type),
            validate::required("source_image", &self.source_image),
        ]);
        match validate::mutually_exclusive(
            ("user_data", !self.user_data.is_empty()),
            ("user_data_file", !self.user_data_file.is_empty()),
        ) {
            Some(e) => errs.push(e),
            None => errs.extend(validate::file_exists("user_data_file", &self.user_data_file)),
        }
        errs
    }
}

/// One disk attached to the image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlicloudDiskDevice {
    pub disk_name: String,
    pub disk_category: String,
    pub disk_size: u32,
    pub disk_snapshot_id: String,
    pub disk_description: String,
    pub disk_delete_with_instance: bool,
    pub disk_device: String,
    pub disk_encrypted: Option<bool>,
}

/// The custom image produced by the build
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlicloudImageConfig {
    pub image_name: String,
    pub image_version: String,
    pub image_description: String,
    pub image_share_account: Vec<String>,
    pub image_unshare_account: Vec<String>,
    pub image_copy_regions: Vec<String>,
    pub image_copy_names: Vec<String>,
    pub image_encrypted: Option<bool>,
    pub image_force_delete: bool,
    pub image_force_delete_snapshots: bool,
    pub image_force_delete_instances: bool,
    pub image_ignore_data_disks: bool,
    pub tags: BTreeMap<String, String>,
    pub system_disk_mapping: AlicloudDiskDevice,
    pub image_disk_mappings: Vec<AlicloudDiskDevice>,
}

impl Section for AlicloudImageConfig {
    const NAME: &'static str = "image_config";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("image_name"),
        FieldSpec::replace("image_version"),
        FieldSpec::replace("image_description"),
        FieldSpec::replace("image_share_account"),
        FieldSpec::replace("image_unshare_account"),
        FieldSpec::replace("image_copy_regions"),
        FieldSpec::replace("image_copy_names"),
        FieldSpec::replace("image_encrypted"),
        FieldSpec::replace("image_force_delete"),
        FieldSpec::replace("image_force_delete_snapshots"),
        FieldSpec::replace("image_force_delete_instances"),
        FieldSpec::replace("image_ignore_data_disks"),
        FieldSpec::replace("tags"),
        FieldSpec::replace("system_disk_mapping"),
        FieldSpec::replace("image_disk_mappings"),
    ];
}

impl Prepare for AlicloudImageConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        let mut errs = Vec::new();
        let name = &self.image_name;
        let len = name.chars().count();

        if let Some(e) = validate::required("image_name", name) {
            errs.push(e);
        } else if !(IMAGE_NAME_MIN..=IMAGE_NAME_MAX).contains(&len) {
            errs.push(ConfigError::validation(
                "image_name",
                format!(
                    "`image_name` must be between {} and {} characters long",
                    IMAGE_NAME_MIN, IMAGE_NAME_MAX
                ),
            ));
        } else if name.starts_with("http://") || name.starts_with("https://") {
            errs.push(ConfigError::validation(
                "image_name",
                "`image_name` can't start with 'http://' or 'https://'",
            ));
        }
        if name.chars().any(char::is_whitespace) {
            errs.push(ConfigError::validation("image_name", "`image_name` can't include spaces"));
        }

        defaults::dedup_preserving_order(&mut self.image_copy_regions);

        errs
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlicloudConfig {
    pub access: AlicloudAccessConfig,
    pub image: AlicloudImageConfig,
    pub run: AlicloudRunConfig,
    pub comm: Communicator,
}

impl Configuration for AlicloudConfig {
    const BUILDER_TYPE: &'static str = "alicloud-ecs";

    fn schema() -> Schema {
        Schema::new()
            .section::<AlicloudAccessConfig>()
            .section::<AlicloudImageConfig>()
            .section::<AlicloudRunConfig>()
            .section::<Communicator>()
            .exclude_from_interpolation(&["user_data"])
    }

    fn from_sections(reader: &mut SectionReader) -> Self {
        Self {
            access: reader.section(),
            image: reader.section(),
            run: reader.section(),
            comm: reader.section(),
        }
    }

    fn prepare(&mut self, ctx: &InterpolationContext) -> Vec<ComponentErrors> {
        self.comm.default_temporary_key_pair(ctx);

        vec![
            ComponentErrors::new(AlicloudAccessConfig::NAME, self.access.prepare(ctx)),
            ComponentErrors::new(AlicloudImageConfig::NAME, self.image.prepare(ctx)),
            ComponentErrors::new(AlicloudRunConfig::NAME, self.run.prepare(ctx)),
            ComponentErrors::new(Communicator::NAME, self.comm.prepare(ctx)),
        ]
    }

    fn to_fragment(&self) -> brokkr_core::Result<Fragment> {
        Fragment::from_sections([
            serde_json::to_value(&self.access),
            serde_json::to_value(&self.image),
            serde_json::to_value(&self.run),
            serde_json::to_value(&self.comm),
        ])
    }
}
