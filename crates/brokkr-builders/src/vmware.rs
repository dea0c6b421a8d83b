//! The `vmware-vmx` builder configuration
//!
//! Clones an existing VMX virtual machine, provisions it, and optionally
//! exports it.

use brokkr_core::common::{Communicator, OutputConfig, ShutdownConfig};
use brokkr_core::{
    defaults, validate, ComponentErrors, ConfigError, Configuration, FieldSpec, Fragment,
    InterpolationContext, Prepare, Schema, Section, SectionReader,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const EXPORT_FORMATS: &[&str] = &["ova", "ovf", "vmx"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmwareExportConfig {
    /// Empty means the VM is left as VMX without conversion
    pub format: String,
    pub ovftool_options: Vec<String>,
    pub skip_export: bool,
    pub keep_registered: bool,
    pub skip_compaction: bool,
}

impl Section for VmwareExportConfig {
    const NAME: &'static str = "export";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("format"),
        FieldSpec::replace("ovftool_options"),
        FieldSpec::replace("skip_export"),
        FieldSpec::replace("keep_registered"),
        FieldSpec::replace("skip_compaction"),
    ];
}

impl Prepare for VmwareExportConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        if self.format.is_empty() {
            return Vec::new();
        }
        validate::collect([validate::one_of("format", &self.format, EXPORT_FORMATS)])
    }
}

/// Raw `.vmx` entries applied to the machine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmxConfig {
    pub vmx_data: BTreeMap<String, String>,
    pub vmx_data_post: BTreeMap<String, String>,
    pub vmx_remove_ethernet_interfaces: bool,
    pub display_name: String,
}

impl Section for VmxConfig {
    const NAME: &'static str = "vmx";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::union("vmx_data"),
        FieldSpec::union("vmx_data_post"),
        FieldSpec::replace("vmx_remove_ethernet_interfaces"),
        FieldSpec::replace("display_name"),
    ];
}

impl Prepare for VmxConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        Vec::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmwareVmxConfig {
    pub source_path: String,
    pub vm_name: String,
    pub linked: bool,
    pub attach_snapshot: String,

    #[serde(skip)]
    pub export: VmwareExportConfig,
    #[serde(skip)]
    pub output: OutputConfig,
    #[serde(skip)]
    pub shutdown: ShutdownConfig,
    #[serde(skip)]
    pub comm: Communicator,
    #[serde(skip)]
    pub vmx: VmxConfig,
}

impl Section for VmwareVmxConfig {
    const NAME: &'static str = "vmware-vmx";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("source_path"),
        FieldSpec::replace("vm_name"),
        FieldSpec::replace("linked"),
        FieldSpec::replace("attach_snapshot"),
    ];
}

impl VmwareVmxConfig {
    fn leaf(&mut self, ctx: &InterpolationContext) -> Vec<ConfigError> {
        defaults::string(&mut self.vm_name, defaults::build_scoped_name(ctx));

        match validate::required("source_path", &self.source_path) {
            Some(e) => vec![e],
            None => validate::collect([validate::file_exists("source_path", &self.source_path)]),
        }
    }
}

impl Configuration for VmwareVmxConfig {
    const BUILDER_TYPE: &'static str = "vmware-vmx";

    fn schema() -> Schema {
        Schema::new()
            .section::<VmwareExportConfig>()
            .section::<OutputConfig>()
            .section::<ShutdownConfig>()
            .section::<Communicator>()
            .section::<VmxConfig>()
            .section::<VmwareVmxConfig>()
    }

    fn from_sections(reader: &mut SectionReader) -> Self {
        let export = reader.section::<VmwareExportConfig>();
        let output = reader.section::<OutputConfig>();
        let shutdown = reader.section::<ShutdownConfig>();
        let comm = reader.section::<Communicator>();
        let vmx = reader.section::<VmxConfig>();
        Self {
            export,
            output,
            shutdown,
            comm,
            vmx,
            ..reader.section::<VmwareVmxConfig>()
        }
    }

    fn prepare(&mut self, ctx: &InterpolationContext) -> Vec<ComponentErrors> {
        vec![
            ComponentErrors::new(VmwareExportConfig::NAME, self.export.prepare(ctx)),
            ComponentErrors::new(OutputConfig::NAME, self.output.prepare(ctx)),
            ComponentErrors::new(ShutdownConfig::NAME, self.shutdown.prepare(ctx)),
            ComponentErrors::new(Communicator::NAME, self.comm.prepare(ctx)),
            ComponentErrors::new(VmxConfig::NAME, self.vmx.prepare(ctx)),
            ComponentErrors::new(Self::BUILDER_TYPE, self.leaf(ctx)),
        ]
    }

    fn warnings(&self) -> Vec<String> {
        if self.shutdown.shutdown_command.is_empty() {
            vec!["A shutdown_command was not specified. Without a shutdown command, the virtual \
                  machine will be forcibly halted, which may result in data loss."
                .to_string()]
        } else {
            Vec::new()
        }
    }

    fn to_fragment(&self) -> brokkr_core::Result<Fragment> {
        Fragment::from_sections([
            serde_json::to_value(&self.export),
            serde_json::to_value(&self.output),
            serde_json::to_value(&self.shutdown),
            serde_json::to_value(&self.comm),
            serde_json::to_value(&self.vmx),
            serde_json::to_value(self),
        ])
    }
}
