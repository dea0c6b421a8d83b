//! The `virtualbox-ovf` builder configuration
//!
//! Imports an existing OVF/OVA appliance, provisions it, and exports it again.

use brokkr_core::common::{Communicator, HttpConfig, OutputConfig, ShutdownConfig};
use brokkr_core::{
    defaults, validate, ComponentErrors, ConfigError, Configuration, FieldSpec, Fragment,
    InterpolationContext, Prepare, Schema, Section, SectionReader,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const GUEST_ADDITIONS_MODES: &[&str] = &["disable", "attach", "upload"];
const EXPORT_FORMATS: &[&str] = &["ovf", "ova"];

/// Appliance export settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VboxExportConfig {
    pub format: String,
    pub export_opts: Vec<String>,
    pub keep_registered: bool,
    pub skip_export: bool,
}

impl Section for VboxExportConfig {
    const NAME: &'static str = "export";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("format"),
        FieldSpec::replace("export_opts"),
        FieldSpec::replace("keep_registered"),
        FieldSpec::replace("skip_export"),
    ];
}

impl Prepare for VboxExportConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        defaults::string(&mut self.format, "ovf");
        validate::collect([validate::one_of("format", &self.format, EXPORT_FORMATS)])
    }
}

/// Extra `VBoxManage` invocations, run before boot and after export
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VBoxManageConfig {
    pub vboxmanage: Vec<Vec<String>>,
    pub vboxmanage_post: Vec<Vec<String>>,
}

impl Section for VBoxManageConfig {
    const NAME: &'static str = "vboxmanage";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("vboxmanage"),
        FieldSpec::replace("vboxmanage_post"),
    ];
}

impl Prepare for VBoxManageConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        Vec::new()
    }
}

/// Keystrokes typed into the console after boot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    pub boot_command: Vec<String>,
    #[serde(rename = "boot_wait")]
    pub raw_boot_wait: String,
    #[serde(skip)]
    pub boot_wait: Duration,
}

impl Section for BootConfig {
    const NAME: &'static str = "boot";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("boot_command"),
        FieldSpec::replace("boot_wait"),
    ];
}

impl Prepare for BootConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        defaults::string(&mut self.raw_boot_wait, "10s");
        match validate::duration("boot_wait", &self.raw_boot_wait) {
            Ok(d) => {
                self.boot_wait = d;
                Vec::new()
            }
            Err(e) => vec![e],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualBoxOvfConfig {
    pub checksum: String,
    pub checksum_type: String,
    pub guest_additions_mode: String,
    pub guest_additions_path: String,
    pub guest_additions_interface: String,
    pub guest_additions_sha256: String,
    pub guest_additions_url: String,
    pub import_flags: Vec<String>,
    /// Folded into `import_flags` once the configuration is resolved
    pub import_opts: String,
    pub source_path: String,
    pub target_path: String,
    pub vm_name: String,

    #[serde(skip)]
    pub http: HttpConfig,
    #[serde(skip)]
    pub export: VboxExportConfig,
    #[serde(skip)]
    pub output: OutputConfig,
    #[serde(skip)]
    pub shutdown: ShutdownConfig,
    #[serde(skip)]
    pub comm: Communicator,
    #[serde(skip)]
    pub vboxmanage: VBoxManageConfig,
    #[serde(skip)]
    pub boot: BootConfig,
}

impl Section for VirtualBoxOvfConfig {
    const NAME: &'static str = "virtualbox-ovf";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("checksum"),
        FieldSpec::replace("checksum_type"),
        FieldSpec::replace("guest_additions_mode"),
        FieldSpec::replace("guest_additions_path"),
        FieldSpec::replace("guest_additions_interface"),
        FieldSpec::replace("guest_additions_sha256"),
        FieldSpec::replace("guest_additions_url"),
        FieldSpec::replace("import_flags"),
        FieldSpec::replace("import_opts"),
        FieldSpec::replace("source_path"),
        FieldSpec::replace("target_path"),
        FieldSpec::replace("vm_name"),
    ];
}

impl VirtualBoxOvfConfig {
    fn leaf(&mut self, ctx: &InterpolationContext) -> Vec<ConfigError> {
        defaults::string(&mut self.guest_additions_mode, "upload");
        defaults::string(&mut self.guest_additions_path, "VBoxGuestAdditions.iso");
        defaults::string(&mut self.guest_additions_interface, "ide");
        defaults::string(&mut self.vm_name, defaults::timestamped_name(ctx));

        self.checksum = self.checksum.to_lowercase();
        self.checksum_type = self.checksum_type.to_lowercase();
        self.guest_additions_sha256 = self.guest_additions_sha256.to_lowercase();

        let mut errs = Vec::new();
        match validate::required("source_path", &self.source_path) {
            Some(e) => errs.push(e),
            None => {
                if let Some(missing) = validate::file_exists("source_path", &self.source_path) {
                    errs.push(ConfigError::validation(
                        "source_path",
                        format!("source file must exist at time of config validation: {}", missing),
                    ));
                }
            }
        }
        errs.extend(validate::one_of(
            "guest_additions_mode",
            &self.guest_additions_mode,
            GUEST_ADDITIONS_MODES,
        ));
        errs
    }
}

impl Configuration for VirtualBoxOvfConfig {
    const BUILDER_TYPE: &'static str = "virtualbox-ovf";

    fn schema() -> Schema {
        Schema::new()
            .section::<HttpConfig>()
            .section::<VboxExportConfig>()
            .section::<OutputConfig>()
            .section::<ShutdownConfig>()
            .section::<Communicator>()
            .section::<VBoxManageConfig>()
            .section::<BootConfig>()
            .section::<VirtualBoxOvfConfig>()
            .exclude_from_interpolation(&[
                "boot_command",
                "guest_additions_path",
                "guest_additions_url",
                "vboxmanage",
                "vboxmanage_post",
            ])
    }

    fn from_sections(reader: &mut SectionReader) -> Self {
        let http = reader.section::<HttpConfig>();
        let export = reader.section::<VboxExportConfig>();
        let output = reader.section::<OutputConfig>();
        let shutdown = reader.section::<ShutdownConfig>();
        let comm = reader.section::<Communicator>();
        let vboxmanage = reader.section::<VBoxManageConfig>();
        let boot = reader.section::<BootConfig>();
        Self {
            http,
            export,
            output,
            shutdown,
            comm,
            vboxmanage,
            boot,
            ..reader.section::<VirtualBoxOvfConfig>()
        }
    }

    fn prepare(&mut self, ctx: &InterpolationContext) -> Vec<ComponentErrors> {
        vec![
            ComponentErrors::new(HttpConfig::NAME, self.http.prepare(ctx)),
            ComponentErrors::new(VboxExportConfig::NAME, self.export.prepare(ctx)),
            ComponentErrors::new(OutputConfig::NAME, self.output.prepare(ctx)),
            ComponentErrors::new(ShutdownConfig::NAME, self.shutdown.prepare(ctx)),
            ComponentErrors::new(Communicator::NAME, self.comm.prepare(ctx)),
            ComponentErrors::new(VBoxManageConfig::NAME, self.vboxmanage.prepare(ctx)),
            ComponentErrors::new(BootConfig::NAME, self.boot.prepare(ctx)),
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

    fn finalize(&mut self) {
        if !self.import_opts.is_empty() {
            let opts = std::mem::take(&mut self.import_opts);
            self.import_flags.push("--options".to_string());
            self.import_flags.push(opts);
        }
    }

    fn to_fragment(&self) -> brokkr_core::Result<Fragment> {
        Fragment::from_sections([
            serde_json::to_value(&self.http),
            serde_json::to_value(&self.export),
            serde_json::to_value(&self.output),
            serde_json::to_value(&self.shutdown),
            serde_json::to_value(&self.comm),
            serde_json::to_value(&self.vboxmanage),
            serde_json::to_value(&self.boot),
            serde_json::to_value(self),
        ])
    }
}
