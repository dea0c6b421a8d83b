//! Builder configurations for Brokkr
//!
//! Each builder composes the shared sub-configurations from `brokkr-core`
//! with its own sections:
//!
//! - **amazon-ebs** - EBS-backed EC2 AMIs
//! - **cloudstack** - CloudStack templates
//! - **lxc** / **lxd** - Linux container images
//! - **triton** - Joyent Triton machine images
//! - **alicloud-ecs** - Alibaba Cloud ECS custom images
//! - **virtualbox-ovf** - VirtualBox appliances built from an existing OVF/OVA
//! - **vmware-vmx** - VMware machines cloned from an existing VMX
//!
//! # Usage
//!
//! ```yaml
//! # base.yaml
//! region: us-east-1
//! instance_type: t3.micro
//! source_ami: ami-0abcdef
//! ssh_username: ubuntu
//! ami_name: "web-{{ timestamp }}"
//! ```
//!
//! ```ignore
//! let kind: BuilderKind = "amazon-ebs".parse()?;
//! let ctx = InterpolationContext::new("web", kind.as_str());
//! let build = kind.resolve(&fragments, &DecodeOptions::default(), &ctx)?;
//! ```

pub mod alicloud;
pub mod amazon;
pub mod cloudstack;
pub mod lxc;
pub mod lxd;
pub mod triton;
pub mod virtualbox;
pub mod vmware;

#[cfg(test)]
mod tests;

use brokkr_core::{
    resolve, AggregateError, ConfigError, Configuration, DecodeOptions, Error, Fragment,
    InterpolationContext, Resolution, Schema,
};
use tracing::debug;

pub use alicloud::AlicloudConfig;
pub use amazon::{DeviceMappings, EbsConfig};
pub use cloudstack::CloudStackConfig;
pub use lxc::LxcConfig;
pub use lxd::LxdConfig;
pub use triton::TritonConfig;
pub use virtualbox::VirtualBoxOvfConfig;
pub use vmware::VmwareVmxConfig;

/// Every builder type Brokkr can resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderKind {
    AmazonEbs,
    CloudStack,
    Lxc,
    Lxd,
    Triton,
    Alicloud,
    VirtualBoxOvf,
    VmwareVmx,
}

impl BuilderKind {
    pub const fn all() -> &'static [BuilderKind] {
        &[
            BuilderKind::AmazonEbs,
            BuilderKind::CloudStack,
            BuilderKind::Lxc,
            BuilderKind::Lxd,
            BuilderKind::Triton,
            BuilderKind::Alicloud,
            BuilderKind::VirtualBoxOvf,
            BuilderKind::VmwareVmx,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BuilderKind::AmazonEbs => EbsConfig::BUILDER_TYPE,
            BuilderKind::CloudStack => CloudStackConfig::BUILDER_TYPE,
            BuilderKind::Lxc => LxcConfig::BUILDER_TYPE,
            BuilderKind::Lxd => LxdConfig::BUILDER_TYPE,
            BuilderKind::Triton => TritonConfig::BUILDER_TYPE,
            BuilderKind::Alicloud => AlicloudConfig::BUILDER_TYPE,
            BuilderKind::VirtualBoxOvf => VirtualBoxOvfConfig::BUILDER_TYPE,
            BuilderKind::VmwareVmx => VmwareVmxConfig::BUILDER_TYPE,
        }
    }

    /// Field table of this builder
    pub fn schema(&self) -> Schema {
        match self {
            BuilderKind::AmazonEbs => EbsConfig::schema(),
            BuilderKind::CloudStack => CloudStackConfig::schema(),
            BuilderKind::Lxc => LxcConfig::schema(),
            BuilderKind::Lxd => LxdConfig::schema(),
            BuilderKind::Triton => TritonConfig::schema(),
            BuilderKind::Alicloud => AlicloudConfig::schema(),
            BuilderKind::VirtualBoxOvf => VirtualBoxOvfConfig::schema(),
            BuilderKind::VmwareVmx => VmwareVmxConfig::schema(),
        }
    }

    /// Resolve fragments into this builder's configuration
    pub fn resolve(
        &self,
        fragments: &[Fragment],
        options: &DecodeOptions,
        ctx: &InterpolationContext,
    ) -> Result<ResolvedBuild, AggregateError> {
        let ctx = ctx.for_builder(self.as_str());
        debug!(
            "Resolving {} from {} fragment(s) for build '{}'",
            self,
            fragments.len(),
            ctx.build_name
        );
        Ok(match self {
            BuilderKind::AmazonEbs => ResolvedBuild::AmazonEbs(resolve(fragments, options, &ctx)?),
            BuilderKind::CloudStack => {
                ResolvedBuild::CloudStack(resolve(fragments, options, &ctx)?)
            }
            BuilderKind::Lxc => ResolvedBuild::Lxc(resolve(fragments, options, &ctx)?),
            BuilderKind::Lxd => ResolvedBuild::Lxd(resolve(fragments, options, &ctx)?),
            BuilderKind::Triton => ResolvedBuild::Triton(resolve(fragments, options, &ctx)?),
            BuilderKind::Alicloud => ResolvedBuild::Alicloud(resolve(fragments, options, &ctx)?),
            BuilderKind::VirtualBoxOvf => {
                ResolvedBuild::VirtualBoxOvf(resolve(fragments, options, &ctx)?)
            }
            BuilderKind::VmwareVmx => ResolvedBuild::VmwareVmx(resolve(fragments, options, &ctx)?),
        })
    }
}

impl std::fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BuilderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "amazon-ebs" | "ebs" => Ok(BuilderKind::AmazonEbs),
            "cloudstack" => Ok(BuilderKind::CloudStack),
            "lxc" => Ok(BuilderKind::Lxc),
            "lxd" => Ok(BuilderKind::Lxd),
            "triton" => Ok(BuilderKind::Triton),
            "alicloud-ecs" | "alicloud" => Ok(BuilderKind::Alicloud),
            "virtualbox-ovf" => Ok(BuilderKind::VirtualBoxOvf),
            "vmware-vmx" => Ok(BuilderKind::VmwareVmx),
            _ => {
                let valid: Vec<&str> = BuilderKind::all().iter().map(|k| k.as_str()).collect();
                Err(Error::unknown_builder(s, &valid))
            }
        }
    }
}

/// A resolved configuration for any builder
#[derive(Debug, Clone)]
pub enum ResolvedBuild {
    AmazonEbs(Resolution<EbsConfig>),
    CloudStack(Resolution<CloudStackConfig>),
    Lxc(Resolution<LxcConfig>),
    Lxd(Resolution<LxdConfig>),
    Triton(Resolution<TritonConfig>),
    Alicloud(Resolution<AlicloudConfig>),
    VirtualBoxOvf(Resolution<VirtualBoxOvfConfig>),
    VmwareVmx(Resolution<VmwareVmxConfig>),
}

impl ResolvedBuild {
    pub fn kind(&self) -> BuilderKind {
        match self {
            ResolvedBuild::AmazonEbs(_) => BuilderKind::AmazonEbs,
            ResolvedBuild::CloudStack(_) => BuilderKind::CloudStack,
            ResolvedBuild::Lxc(_) => BuilderKind::Lxc,
            ResolvedBuild::Lxd(_) => BuilderKind::Lxd,
            ResolvedBuild::Triton(_) => BuilderKind::Triton,
            ResolvedBuild::Alicloud(_) => BuilderKind::Alicloud,
            ResolvedBuild::VirtualBoxOvf(_) => BuilderKind::VirtualBoxOvf,
            ResolvedBuild::VmwareVmx(_) => BuilderKind::VmwareVmx,
        }
    }

    pub fn warnings(&self) -> &[String] {
        match self {
            ResolvedBuild::AmazonEbs(r) => &r.warnings,
            ResolvedBuild::CloudStack(r) => &r.warnings,
            ResolvedBuild::Lxc(r) => &r.warnings,
            ResolvedBuild::Lxd(r) => &r.warnings,
            ResolvedBuild::Triton(r) => &r.warnings,
            ResolvedBuild::Alicloud(r) => &r.warnings,
            ResolvedBuild::VirtualBoxOvf(r) => &r.warnings,
            ResolvedBuild::VmwareVmx(r) => &r.warnings,
        }
    }

    /// Flattened view of the resolved configuration
    pub fn to_fragment(&self) -> brokkr_core::Result<Fragment> {
        match self {
            ResolvedBuild::AmazonEbs(r) => r.config.to_fragment(),
            ResolvedBuild::CloudStack(r) => r.config.to_fragment(),
            ResolvedBuild::Lxc(r) => r.config.to_fragment(),
            ResolvedBuild::Lxd(r) => r.config.to_fragment(),
            ResolvedBuild::Triton(r) => r.config.to_fragment(),
            ResolvedBuild::Alicloud(r) => r.config.to_fragment(),
            ResolvedBuild::VirtualBoxOvf(r) => r.config.to_fragment(),
            ResolvedBuild::VmwareVmx(r) => r.config.to_fragment(),
        }
    }

    /// Derived block device mappings; `None` for builders without them
    pub fn device_mappings(&self) -> Option<Result<DeviceMappings, ConfigError>> {
        match self {
            ResolvedBuild::AmazonEbs(r) => Some(r.config.device_mappings()),
            _ => None,
        }
    }
}
