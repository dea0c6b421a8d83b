//! Settings for the instance that runs the build

use brokkr_core::common::Communicator;
use brokkr_core::{defaults, validate, ConfigError, FieldSpec, InterpolationContext, Prepare, Section};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

const SHUTDOWN_BEHAVIORS: &[&str] = &["stop", "terminate"];
const SSH_INTERFACES: &[&str] = &["public_ip", "private_ip", "public_dns", "private_dns"];

/// Filters used to look up the source AMI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmiFilterOptions {
    pub filters: BTreeMap<String, String>,
    pub owners: Vec<String>,
    pub most_recent: bool,
}

impl AmiFilterOptions {
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty() && self.filters.is_empty()
    }

    pub fn has_owner(&self) -> bool {
        !self.owners.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubnetFilterOptions {
    pub filters: BTreeMap<String, String>,
    pub most_free: bool,
    pub random: bool,
}

/// Filters for VPC and security group lookups
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterOptions {
    pub filters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub associate_public_ip_address: bool,
    pub availability_zone: String,
    pub block_duration_minutes: i64,
    pub disable_stop_instance: bool,
    pub ebs_optimized: bool,
    pub enable_t2_unlimited: bool,
    pub iam_instance_profile: String,
    pub instance_type: String,
    pub run_tags: BTreeMap<String, String>,
    pub security_group_filter: FilterOptions,
    pub security_group_id: String,
    pub security_group_ids: Vec<String>,
    pub shutdown_behavior: String,
    pub source_ami: String,
    pub source_ami_filter: AmiFilterOptions,
    pub spot_instance_types: Vec<String>,
    pub spot_price: String,
    pub spot_price_auto_product: String,
    /// `Some` even when empty means the user asked for spot tags
    pub spot_tags: Option<BTreeMap<String, String>>,
    pub subnet_filter: SubnetFilterOptions,
    pub subnet_id: String,
    /// Older spelling of `ssh_temporary_key_pair_name`
    pub temporary_key_pair_name: String,
    pub temporary_security_group_source_cidrs: Vec<String>,
    pub user_data: String,
    pub user_data_file: String,
    pub vpc_filter: FilterOptions,
    pub vpc_id: String,
    #[serde(rename = "windows_password_timeout")]
    pub raw_windows_password_timeout: String,
    #[serde(skip)]
    pub windows_password_timeout: Duration,
}

impl Section for RunConfig {
    const NAME: &'static str = "run_config";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("associate_public_ip_address"),
        FieldSpec::replace("availability_zone"),
        FieldSpec::replace("block_duration_minutes"),
        FieldSpec::replace("disable_stop_instance"),
        FieldSpec::replace("ebs_optimized"),
        FieldSpec::replace("enable_t2_unlimited"),
        FieldSpec::replace("iam_instance_profile"),
        FieldSpec::replace("instance_type"),
        FieldSpec::union("run_tags"),
        FieldSpec::replace("security_group_filter"),
        FieldSpec::replace("security_group_id"),
        FieldSpec::replace("security_group_ids"),
        FieldSpec::replace("shutdown_behavior"),
        FieldSpec::replace("source_ami"),
        FieldSpec::replace("source_ami_filter"),
        FieldSpec::replace("spot_instance_types"),
        FieldSpec::replace("spot_price"),
        FieldSpec::replace("spot_price_auto_product"),
        FieldSpec::union("spot_tags"),
        FieldSpec::replace("subnet_filter"),
        FieldSpec::replace("subnet_id"),
        FieldSpec::replace("temporary_key_pair_name"),
        FieldSpec::replace("temporary_security_group_source_cidrs"),
        FieldSpec::replace("user_data"),
        FieldSpec::replace("user_data_file"),
        FieldSpec::replace("vpc_filter"),
        FieldSpec::replace("vpc_id"),
        FieldSpec::replace("windows_password_timeout"),
    ];
}

impl RunConfig {
    /// A spot price of `""` or `"0"` means an on-demand instance
    pub fn is_spot_instance(&self) -> bool {
        !self.spot_price.is_empty() && self.spot_price != "0"
    }

    /// Rules tying run settings to the communicator
    pub fn communicator_rules(&self, comm: &Communicator) -> Vec<ConfigError> {
        let mut errs = Vec::new();

        if !comm.ssh_interface.is_empty() {
            errs.extend(validate::one_of("ssh_interface", &comm.ssh_interface, SSH_INTERFACES));
        }

        if !comm.ssh_keypair_name.is_empty() {
            if comm.is_winrm() && comm.winrm_password.is_empty() && comm.ssh_private_key_file.is_empty() {
                errs.push(ConfigError::validation(
                    "ssh_private_key_file",
                    "`ssh_private_key_file` must be provided to retrieve the winrm password when using `ssh_keypair_name`",
                ));
            } else if comm.ssh_private_key_file.is_empty() && !comm.ssh_agent_auth {
                errs.push(ConfigError::validation(
                    "ssh_private_key_file",
                    "`ssh_private_key_file` must be provided or `ssh_agent_auth` enabled when `ssh_keypair_name` is specified",
                ));
            }
        }

        errs
    }

    fn apply_defaults(&mut self) {
        defaults::string(&mut self.raw_windows_password_timeout, "20m");
        defaults::string(&mut self.shutdown_behavior, "stop");
        if self.temporary_security_group_source_cidrs.is_empty() {
            self.temporary_security_group_source_cidrs = vec!["0.0.0.0/0".to_string()];
        }
    }

    fn t2_unlimited_rules(&self) -> Vec<ConfigError> {
        if !self.enable_t2_unlimited {
            return Vec::new();
        }

        let mut errs = Vec::new();
        if !self.spot_price.is_empty() {
            errs.push(ConfigError::validation(
                "enable_t2_unlimited",
                "T2 Unlimited cannot be used in conjunction with Spot Instances",
            ));
        }
        match self.instance_type.split_once('.') {
            None => errs.push(ConfigError::validation(
                "instance_type",
                format!("error determining main instance type from '{}'", self.instance_type),
            )),
            Some((family, _)) if family != "t2" => errs.push(ConfigError::validation(
                "instance_type",
                format!("T2 Unlimited enabled with a non-T2 instance type: {}", self.instance_type),
            )),
            Some(_) => {}
        }
        errs
    }
}

impl Prepare for RunConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        self.apply_defaults();

        let mut errs = Vec::new();

        match validate::duration("windows_password_timeout", &self.raw_windows_password_timeout) {
            Ok(d) => self.windows_password_timeout = d,
            Err(e) => errs.push(e),
        }

        errs.extend(validate::required_any(&[
            ("source_ami", !self.source_ami.is_empty()),
            ("source_ami_filter", !self.source_ami_filter.is_empty()),
        ]));
        errs.extend(validate::mutually_exclusive(
            ("source_ami", !self.source_ami.is_empty()),
            ("source_ami_filter", !self.source_ami_filter.is_empty()),
        ));
        if self.source_ami.is_empty() && !self.source_ami_filter.is_empty() && !self.source_ami_filter.has_owner() {
            errs.push(ConfigError::validation(
                "source_ami_filter",
                "for security reasons, your source AMI filter must declare an owner",
            ));
        }

        errs.extend(validate::required_any(&[
            ("instance_type", !self.instance_type.is_empty()),
            ("spot_instance_types", !self.spot_instance_types.is_empty()),
        ]));
        errs.extend(validate::mutually_exclusive(
            ("instance_type", !self.instance_type.is_empty()),
            ("spot_instance_types", !self.spot_instance_types.is_empty()),
        ));

        errs.extend(validate::multiple_of("block_duration_minutes", self.block_duration_minutes, 60));

        errs.extend(validate::required_when(
            "spot_price_auto_product",
            !self.spot_price_auto_product.is_empty(),
            self.spot_price == "auto",
            "`spot_price` is auto",
        ));
        if !self.spot_price_auto_product.is_empty() && self.spot_price != "auto" {
            errs.push(ConfigError::validation(
                "spot_price",
                "`spot_price` should be set to auto when `spot_price_auto_product` is specified",
            ));
        }

        if self.spot_tags.is_some() && !self.is_spot_instance() {
            errs.push(ConfigError::validation(
                "spot_tags",
                "`spot_tags` should not be set when not requesting a spot instance",
            ));
        }

        match validate::mutually_exclusive(
            ("user_data", !self.user_data.is_empty()),
            ("user_data_file", !self.user_data_file.is_empty()),
        ) {
            Some(e) => errs.push(e),
            None => errs.extend(validate::file_exists("user_data_file", &self.user_data_file)),
        }

        if !self.security_group_id.is_empty() {
            if self.security_group_ids.is_empty() {
                self.security_group_ids = vec![std::mem::take(&mut self.security_group_id)];
            } else {
                errs.extend(validate::mutually_exclusive(
                    ("security_group_id", true),
                    ("security_group_ids", true),
                ));
            }
        }

        errs.extend(validate::cidrs(
            "temporary_security_group_source_cidrs",
            &self.temporary_security_group_source_cidrs,
        ));

        errs.extend(validate::one_of("shutdown_behavior", &self.shutdown_behavior, SHUTDOWN_BEHAVIORS));

        errs.extend(self.t2_unlimited_rules());

        errs
    }
}
