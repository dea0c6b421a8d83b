//! Settings for the AMI produced by the build

use brokkr_core::{defaults, validate, ConfigError, FieldSpec, InterpolationContext, Prepare, Section};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

const AMI_NAME_MIN: usize = 3;
const AMI_NAME_MAX: usize = 128;

static AMI_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w()\[\]. /'@-]+$").expect("ami name regex is valid"));

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmiConfig {
    pub ami_name: String,
    pub ami_description: String,
    pub ami_virtualization_type: String,
    pub ami_users: Vec<String>,
    pub ami_groups: Vec<String>,
    pub ami_product_codes: Vec<String>,
    pub ami_regions: Vec<String>,
    pub tags: BTreeMap<String, String>,
    pub ena_support: Option<bool>,
    pub sriov_support: bool,
    pub force_deregister: bool,
    pub force_delete_snapshot: bool,
    pub encrypt_boot: Option<bool>,
    pub kms_key_id: String,
    pub region_kms_key_ids: BTreeMap<String, String>,
    pub snapshot_tags: BTreeMap<String, String>,
    pub snapshot_users: Vec<String>,
    pub snapshot_groups: Vec<String>,
}

impl Section for AmiConfig {
    const NAME: &'static str = "ami_config";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("ami_name"),
        FieldSpec::replace("ami_description"),
        FieldSpec::replace("ami_virtualization_type"),
        FieldSpec::replace("ami_users"),
        FieldSpec::replace("ami_groups"),
        FieldSpec::replace("ami_product_codes"),
        FieldSpec::replace("ami_regions"),
        FieldSpec::union("tags"),
        FieldSpec::replace("ena_support"),
        FieldSpec::replace("sriov_support"),
        FieldSpec::replace("force_deregister"),
        FieldSpec::replace("force_delete_snapshot"),
        FieldSpec::replace("encrypt_boot"),
        FieldSpec::replace("kms_key_id"),
        FieldSpec::union("region_kms_key_ids"),
        FieldSpec::union("snapshot_tags"),
        FieldSpec::replace("snapshot_users"),
        FieldSpec::replace("snapshot_groups"),
    ];
}

impl AmiConfig {
    fn name_rules(&self) -> Vec<ConfigError> {
        if let Some(e) = validate::required("ami_name", &self.ami_name) {
            return vec![e];
        }

        let mut errs = Vec::new();
        let len = self.ami_name.chars().count();
        if !(AMI_NAME_MIN..=AMI_NAME_MAX).contains(&len) {
            errs.push(ConfigError::validation(
                "ami_name",
                format!(
                    "`ami_name` must be between {} and {} characters long",
                    AMI_NAME_MIN, AMI_NAME_MAX
                ),
            ));
        }
        if !AMI_NAME_RE.is_match(&self.ami_name) {
            errs.push(ConfigError::validation(
                "ami_name",
                "`ami_name` should only contain alphanumeric characters, parentheses (()), square brackets ([]), spaces ( ), periods (.), slashes (/), dashes (-), single quotes ('), at-signs (@), or underscores(_)",
            ));
        }
        errs
    }
}

impl Prepare for AmiConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        defaults::dedup_preserving_order(&mut self.ami_regions);

        let mut errs = self.name_rules();

        if self.encrypt_boot == Some(false) && !self.kms_key_id.is_empty() {
            errs.push(ConfigError::validation(
                "kms_key_id",
                "`kms_key_id` is set but `encrypt_boot` is false; the boot volume must be encrypted to use a KMS key",
            ));
        }

        if !self.region_kms_key_ids.is_empty() {
            for region in &self.ami_regions {
                if !self.region_kms_key_ids.contains_key(region) {
                    errs.push(ConfigError::validation(
                        "region_kms_key_ids",
                        format!("region {} is in `ami_regions` but not in `region_kms_key_ids`", region),
                    ));
                }
            }
        }

        errs
    }
}
