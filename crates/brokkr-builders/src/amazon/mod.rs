//! Amazon EC2 builders
//!
//! Configuration shared by the EC2 builders lives in its own sections
//! (access, AMI, block devices, run settings); [`EbsConfig`] composes them
//! for the `amazon-ebs` builder.

mod access;
mod ami_config;
pub mod block_device;
mod ebs;
mod run_config;

pub use access::AccessConfig;
pub use ami_config::AmiConfig;
pub use block_device::{
    build_block_devices, AmiBlockDevices, BlockDevice, BlockDeviceMapping, BlockDevices,
    DeviceRequest, EbsBlockDevice, LaunchBlockDevices,
};
pub use ebs::{DeviceMappings, EbsConfig};
pub use run_config::{AmiFilterOptions, FilterOptions, RunConfig, SubnetFilterOptions};
