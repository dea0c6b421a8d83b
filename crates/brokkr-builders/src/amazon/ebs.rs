//! The `amazon-ebs` builder configuration

use brokkr_core::common::Communicator;
use brokkr_core::{
    ComponentErrors, ConfigError, Configuration, FieldSpec, Fragment, InterpolationContext, Prepare,
    Schema, Section, SectionReader,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::access::AccessConfig;
use super::ami_config::AmiConfig;
use super::block_device::{AmiBlockDevices, BlockDeviceMapping, BlockDevices, LaunchBlockDevices};
use super::run_config::RunConfig;

/// Device mappings derived from a resolved configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceMappings {
    pub ami: Vec<BlockDeviceMapping>,
    pub launch: Vec<BlockDeviceMapping>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EbsConfig {
    /// Tags applied to volumes attached to the build instance
    pub run_volume_tags: BTreeMap<String, String>,

    #[serde(skip)]
    pub access: AccessConfig,
    #[serde(skip)]
    pub ami: AmiConfig,
    #[serde(skip)]
    pub block_devices: BlockDevices,
    #[serde(skip)]
    pub run: RunConfig,
    #[serde(skip)]
    pub comm: Communicator,
}

impl Section for EbsConfig {
    const NAME: &'static str = "amazon-ebs";
    const FIELDS: &'static [FieldSpec] = &[FieldSpec::union("run_volume_tags")];
}

impl EbsConfig {
    /// Build the AMI and launch mappings. Only meaningful once resolved.
    pub fn device_mappings(&self) -> Result<DeviceMappings, ConfigError> {
        Ok(DeviceMappings {
            ami: self.block_devices.ami.build_ami_devices()?,
            launch: self.block_devices.launch.build_launch_devices()?,
        })
    }
}

impl Configuration for EbsConfig {
    const BUILDER_TYPE: &'static str = "amazon-ebs";

    fn schema() -> Schema {
        Schema::new()
            .section::<AccessConfig>()
            .section::<AmiConfig>()
            .section::<AmiBlockDevices>()
            .section::<LaunchBlockDevices>()
            .section::<RunConfig>()
            .section::<Communicator>()
            .section::<EbsConfig>()
            // Rendered at build time against the launched instance
            .exclude_from_interpolation(&[
                "ami_description",
                "run_tags",
                "run_volume_tags",
                "snapshot_tags",
                "spot_tags",
                "tags",
            ])
    }

    fn from_sections(reader: &mut SectionReader) -> Self {
        let access = reader.section::<AccessConfig>();
        let ami = reader.section::<AmiConfig>();
        let block_devices = BlockDevices {
            ami: reader.section::<AmiBlockDevices>(),
            launch: reader.section::<LaunchBlockDevices>(),
        };
        let run = reader.section::<RunConfig>();
        let comm = reader.section::<Communicator>();
        Self {
            access,
            ami,
            block_devices,
            run,
            comm,
            ..reader.section::<EbsConfig>()
        }
    }

    fn prepare(&mut self, ctx: &InterpolationContext) -> Vec<ComponentErrors> {
        if self.comm.ssh_temporary_key_pair_name.is_empty() && !self.run.temporary_key_pair_name.is_empty() {
            self.comm.ssh_temporary_key_pair_name = self.run.temporary_key_pair_name.clone();
        }
        self.comm.default_temporary_key_pair(ctx);

        let access = self.access.prepare(ctx);
        let ami = self.ami.prepare(ctx);
        let block_devices = self.block_devices.prepare(ctx);
        let mut run = self.run.prepare(ctx);
        run.extend(self.run.communicator_rules(&self.comm));
        let comm = self.comm.prepare(ctx);

        vec![
            ComponentErrors::new(AccessConfig::NAME, access),
            ComponentErrors::new(AmiConfig::NAME, ami),
            ComponentErrors::new(BlockDevices::NAME, block_devices),
            ComponentErrors::new(RunConfig::NAME, run),
            ComponentErrors::new(Communicator::NAME, comm),
        ]
    }

    fn to_fragment(&self) -> brokkr_core::Result<Fragment> {
        Fragment::from_sections([
            serde_json::to_value(&self.access),
            serde_json::to_value(&self.ami),
            serde_json::to_value(&self.block_devices.ami),
            serde_json::to_value(&self.block_devices.launch),
            serde_json::to_value(&self.run),
            serde_json::to_value(&self.comm),
            serde_json::to_value(self),
        ])
    }
}
