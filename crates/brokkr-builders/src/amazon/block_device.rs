//! Block device mappings
//!
//! Users describe devices declaratively; [`build_block_devices`] turns each
//! description into exactly one EC2 mapping request: suppressed, ephemeral or
//! EBS-backed.

use brokkr_core::{ConfigError, FieldSpec, InterpolationContext, Prepare, Section};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ARTIFACT: &str = "block device mappings";

/// One user-declared device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlockDevice {
    pub device_name: String,
    pub delete_on_termination: bool,
    pub encrypted: Option<bool>,
    pub iops: i64,
    pub kms_key_id: String,
    pub no_device: bool,
    pub omit_from_artifact: bool,
    pub snapshot_id: String,
    pub virtual_name: String,
    pub volume_size: i64,
    pub volume_type: String,
}

impl BlockDevice {
    /// Rules every device must satisfy; `None` when it is valid
    pub fn check(&self) -> Option<String> {
        if self.device_name.is_empty() {
            return Some(
                "the `device_name` must be specified for every device in the block device mapping"
                    .to_string(),
            );
        }
        if !self.kms_key_id.is_empty() && self.encrypted == Some(false) {
            return Some(format!(
                "the device {} must also have `encrypted: true` when setting a kms_key_id",
                self.device_name
            ));
        }
        None
    }

    fn is_ephemeral(&self) -> bool {
        self.virtual_name.starts_with("ephemeral")
    }
}

/// EBS parameters of a mapping; unset values are left for EC2 to decide
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EbsBlockDevice {
    pub delete_on_termination: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iops: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
}

/// What EC2 should do with a named device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceRequest {
    /// Leave the device out of the image
    Suppressed,
    /// Back the device with instance store
    Ephemeral { virtual_name: String },
    /// Back the device with an EBS volume
    Ebs(EbsBlockDevice),
}

/// One entry of an EC2 block device mapping request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockDeviceMapping {
    pub device_name: String,
    pub device: DeviceRequest,
}

fn empty_as_none(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn build_one(device: &BlockDevice) -> BlockDeviceMapping {
    let request = if device.no_device {
        DeviceRequest::Suppressed
    } else if device.is_ephemeral() {
        DeviceRequest::Ephemeral {
            virtual_name: device.virtual_name.clone(),
        }
    } else {
        DeviceRequest::Ebs(EbsBlockDevice {
            delete_on_termination: device.delete_on_termination,
            volume_type: empty_as_none(&device.volume_type),
            volume_size: (device.volume_size > 0).then_some(device.volume_size),
            iops: (device.volume_type == "io1").then_some(device.iops),
            snapshot_id: empty_as_none(&device.snapshot_id),
            encrypted: device.encrypted,
            kms_key_id: empty_as_none(&device.kms_key_id),
        })
    };

    BlockDeviceMapping {
        device_name: device.device_name.clone(),
        device: request,
    }
}

/// Translate validated device declarations into mapping requests, in order.
///
/// Input that would have failed validation is refused rather than mapped.
pub fn build_block_devices(devices: &[BlockDevice]) -> Result<Vec<BlockDeviceMapping>, ConfigError> {
    devices
        .iter()
        .map(|device| match device.check() {
            Some(problem) => Err(ConfigError::derivation(ARTIFACT, problem)),
            None => Ok(build_one(device)),
        })
        .collect()
}

/// Devices baked into the resulting AMI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmiBlockDevices {
    pub ami_block_device_mappings: Vec<BlockDevice>,
}

impl Section for AmiBlockDevices {
    const NAME: &'static str = "ami_block_devices";
    const FIELDS: &'static [FieldSpec] = &[FieldSpec::replace("ami_block_device_mappings")];
}

impl AmiBlockDevices {
    pub fn build_ami_devices(&self) -> Result<Vec<BlockDeviceMapping>, ConfigError> {
        build_block_devices(&self.ami_block_device_mappings)
    }
}

/// Devices attached to the build instance at launch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchBlockDevices {
    pub launch_block_device_mappings: Vec<BlockDevice>,
}

impl Section for LaunchBlockDevices {
    const NAME: &'static str = "launch_block_devices";
    const FIELDS: &'static [FieldSpec] = &[FieldSpec::replace("launch_block_device_mappings")];
}

impl LaunchBlockDevices {
    pub fn build_launch_devices(&self) -> Result<Vec<BlockDeviceMapping>, ConfigError> {
        build_block_devices(&self.launch_block_device_mappings)
    }

    /// Device name to whether it is left out of the final artifact
    pub fn omissions(&self) -> BTreeMap<String, bool> {
        self.launch_block_device_mappings
            .iter()
            .map(|d| (d.device_name.clone(), d.omit_from_artifact))
            .collect()
    }
}

/// Both device lists, validated together
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockDevices {
    pub ami: AmiBlockDevices,
    pub launch: LaunchBlockDevices,
}

impl BlockDevices {
    pub const NAME: &'static str = "block_devices";
}

impl Prepare for BlockDevices {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        let ami = self
            .ami
            .ami_block_device_mappings
            .iter()
            .enumerate()
            .filter_map(|(i, d)| {
                d.check().map(|problem| {
                    ConfigError::validation(
                        "ami_block_device_mappings",
                        format!("AMI mapping {}: {}", i, problem),
                    )
                })
            });
        let launch = self
            .launch
            .launch_block_device_mappings
            .iter()
            .enumerate()
            .filter_map(|(i, d)| {
                d.check().map(|problem| {
                    ConfigError::validation(
                        "launch_block_device_mappings",
                        format!("launch mapping {}: {}", i, problem),
                    )
                })
            });
        ami.chain(launch).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev(name: &str) -> BlockDevice {
        BlockDevice {
            device_name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_ebs_mapping_only_sets_given_values() {
        let mappings = build_block_devices(&[BlockDevice {
            volume_type: "gp2".into(),
            volume_size: 0,
            iops: 1000,
            delete_on_termination: true,
            ..dev("/dev/sdb")
        }])
        .unwrap();

        assert_eq!(
            mappings,
            vec![BlockDeviceMapping {
                device_name: "/dev/sdb".into(),
                device: DeviceRequest::Ebs(EbsBlockDevice {
                    delete_on_termination: true,
                    volume_type: Some("gp2".into()),
                    ..Default::default()
                }),
            }]
        );
    }

    #[test]
    fn test_iops_only_for_io1() {
        let mappings = build_block_devices(&[BlockDevice {
            volume_type: "io1".into(),
            volume_size: 100,
            iops: 1000,
            snapshot_id: "snap-1234".into(),
            encrypted: Some(true),
            kms_key_id: "arn:aws:kms:key".into(),
            ..dev("/dev/sdb")
        }])
        .unwrap();

        let DeviceRequest::Ebs(ebs) = &mappings[0].device else {
            panic!("expected an EBS request");
        };
        assert_eq!(ebs.iops, Some(1000));
        assert_eq!(ebs.volume_size, Some(100));
        assert_eq!(ebs.snapshot_id.as_deref(), Some("snap-1234"));
        assert_eq!(ebs.encrypted, Some(true));
        assert_eq!(ebs.kms_key_id.as_deref(), Some("arn:aws:kms:key"));
    }

    #[test]
    fn test_suppressed_wins_over_everything() {
        let mappings = build_block_devices(&[BlockDevice {
            no_device: true,
            virtual_name: "ephemeral0".into(),
            volume_size: 8,
            ..dev("/dev/sdc")
        }])
        .unwrap();
        assert_eq!(mappings[0].device, DeviceRequest::Suppressed);
    }

    #[test]
    fn test_ephemeral_requires_prefix() {
        let mappings = build_block_devices(&[
            BlockDevice {
                virtual_name: "ephemeral1".into(),
                ..dev("/dev/sdd")
            },
            BlockDevice {
                virtual_name: "scratch".into(),
                ..dev("/dev/sde")
            },
        ])
        .unwrap();

        assert_eq!(
            mappings[0].device,
            DeviceRequest::Ephemeral {
                virtual_name: "ephemeral1".into()
            }
        );
        assert!(matches!(mappings[1].device, DeviceRequest::Ebs(_)));
    }

    #[test]
    fn test_order_preserved() {
        let names: Vec<_> = build_block_devices(&[dev("/dev/sdz"), dev("/dev/sda"), dev("/dev/sdm")])
            .unwrap()
            .into_iter()
            .map(|m| m.device_name)
            .collect();
        assert_eq!(names, vec!["/dev/sdz", "/dev/sda", "/dev/sdm"]);
    }

    #[test]
    fn test_invalid_input_refused() {
        let err = build_block_devices(&[BlockDevice {
            kms_key_id: "key".into(),
            encrypted: Some(false),
            ..dev("/dev/sdb")
        }])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Derivation { .. }));

        assert!(build_block_devices(&[dev("")]).is_err());
    }

    #[test]
    fn test_prepare_reports_every_bad_device() {
        let mut devices = BlockDevices {
            ami: AmiBlockDevices {
                ami_block_device_mappings: vec![dev(""), dev("/dev/sda1")],
            },
            launch: LaunchBlockDevices {
                launch_block_device_mappings: vec![BlockDevice {
                    kms_key_id: "key".into(),
                    encrypted: Some(false),
                    ..dev("/dev/sdb")
                }],
            },
        };
        let errs = devices.prepare(&InterpolationContext::new("b", "amazon-ebs"));
        assert_eq!(errs.len(), 2);
        assert!(errs[0].to_string().starts_with("AMI mapping 0:"));
        assert!(errs[1].to_string().contains("encrypted: true"));
        assert_eq!(errs[1].field(), Some("launch_block_device_mappings"));
    }

    #[test]
    fn test_kms_with_unset_encryption_is_allowed() {
        assert!(BlockDevice {
            kms_key_id: "key".into(),
            ..dev("/dev/sdb")
        }
        .check()
        .is_none());
    }

    #[test]
    fn test_omissions() {
        let launch = LaunchBlockDevices {
            launch_block_device_mappings: vec![
                BlockDevice {
                    omit_from_artifact: true,
                    ..dev("/dev/sdb")
                },
                dev("/dev/sda1"),
            ],
        };
        let omissions = launch.omissions();
        assert_eq!(omissions.get("/dev/sdb"), Some(&true));
        assert_eq!(omissions.get("/dev/sda1"), Some(&false));
    }
}
