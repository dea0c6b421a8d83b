//! The `cloudstack` builder configuration

use brokkr_core::common::{Communicator, HttpConfig};
use brokkr_core::{
    defaults, validate, ComponentErrors, ConfigError, Configuration, FieldSpec, Fragment,
    InterpolationContext, Prepare, Schema, Section, SectionReader,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudStackConfig {
    pub api_url: String,
    pub api_key: String,
    pub secret_key: String,
    #[serde(rename = "async_timeout")]
    pub raw_async_timeout: String,
    #[serde(skip)]
    pub async_timeout: Duration,
    pub http_get_only: bool,
    pub ssl_no_verify: bool,

    pub cidr_list: Vec<String>,
    pub create_security_group: bool,
    pub disk_offering: String,
    pub disk_size: i64,
    pub expunge: bool,
    pub hypervisor: String,
    pub instance_name: String,
    pub network: String,
    pub project: String,
    pub public_ip_address: String,
    pub public_port: u16,
    pub security_groups: Vec<String>,
    pub service_offering: String,
    pub prevent_firewall_changes: bool,
    pub source_iso: String,
    pub source_template: String,
    pub use_local_ip_address: bool,
    pub user_data: String,
    pub user_data_file: String,
    pub zone: String,

    pub template_name: String,
    pub template_display_text: String,
    pub template_os: String,
    pub template_featured: bool,
    pub template_public: bool,
    pub template_password_enabled: bool,
    pub template_requires_hvm: bool,
    pub template_scalable: bool,
    pub template_tag: String,

    #[serde(skip)]
    pub http: HttpConfig,
    #[serde(skip)]
    pub comm: Communicator,
}

impl Section for CloudStackConfig {
    const NAME: &'static str = "cloudstack";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("api_url"),
        FieldSpec::replace("api_key"),
        FieldSpec::replace("secret_key"),
        FieldSpec::replace("async_timeout"),
        FieldSpec::replace("http_get_only"),
        FieldSpec::replace("ssl_no_verify"),
        FieldSpec::replace("cidr_list"),
        FieldSpec::replace("create_security_group"),
        FieldSpec::replace("disk_offering"),
        FieldSpec::replace("disk_size"),
        FieldSpec::replace("expunge"),
        FieldSpec::replace("hypervisor"),
        FieldSpec::replace("instance_name"),
        FieldSpec::replace("network"),
        FieldSpec::replace("project"),
        FieldSpec::replace("public_ip_address"),
        FieldSpec::replace("public_port"),
        FieldSpec::replace("security_groups"),
        FieldSpec::replace("service_offering"),
        FieldSpec::replace("prevent_firewall_changes"),
        FieldSpec::replace("source_iso"),
        FieldSpec::replace("source_template"),
        FieldSpec::replace("use_local_ip_address"),
        FieldSpec::replace("user_data"),
        FieldSpec::replace("user_data_file"),
        FieldSpec::replace("zone"),
        FieldSpec::replace("template_name"),
        FieldSpec::replace("template_display_text"),
        FieldSpec::replace("template_os"),
        FieldSpec::replace("template_featured"),
        FieldSpec::replace("template_public"),
        FieldSpec::replace("template_password_enabled"),
        FieldSpec::replace("template_requires_hvm"),
        FieldSpec::replace("template_scalable"),
        FieldSpec::replace("template_tag"),
    ];
}

impl CloudStackConfig {
    fn apply_defaults(&mut self, ctx: &InterpolationContext) -> Vec<ConfigError> {
        let mut errs = Vec::new();

        defaults::from_env("api_url", &mut self.api_url, "CLOUDSTACK_API_URL");
        defaults::from_env("api_key", &mut self.api_key, "CLOUDSTACK_API_KEY");
        defaults::from_env("secret_key", &mut self.secret_key, "CLOUDSTACK_SECRET_KEY");
        defaults::string(&mut self.raw_async_timeout, "30m");

        if self.cidr_list.is_empty() {
            self.cidr_list = vec!["0.0.0.0/0".to_string()];
        }

        defaults::string(&mut self.instance_name, format!("packer-{}", ctx.time_ordered_uuid()));

        if self.template_name.is_empty() {
            match ctx.render("packer-{{ timestamp }}") {
                Ok(name) => self.template_name = name,
                Err(e) => errs.push(ConfigError::validation(
                    "template_name",
                    format!("unable to render the default `template_name`: {}", e),
                )),
            }
        }
        defaults::string(&mut self.template_display_text, self.template_name.clone());

        self.comm.default_temporary_key_pair(ctx);

        errs
    }

    fn leaf_rules(&mut self) -> Vec<ConfigError> {
        let mut errs = Vec::new();

        match validate::duration("async_timeout", &self.raw_async_timeout) {
            Ok(d) => self.async_timeout = d,
            Err(e) => errs.push(e),
        }

        errs.extend(validate::collect([
            validate::required("api_url", &self.api_url),
            validate::required("api_key", &self.api_key),
            validate::required("secret_key", &self.secret_key),
            validate::required("network", &self.network),
        ]));

        if self.create_security_group && !self.expunge {
            errs.push(ConfigError::validation(
                "create_security_group",
                "auto creating a temporary security group requires `expunge`",
            ));
        }

        errs.extend(validate::required("service_offering", &self.service_offering));

        let iso = !self.source_iso.is_empty();
        errs.extend(validate::collect([
            validate::required_any(&[("source_iso", iso), ("source_template", !self.source_template.is_empty())]),
            validate::mutually_exclusive(("source_iso", iso), ("source_template", !self.source_template.is_empty())),
            validate::required_when("disk_offering", !self.disk_offering.is_empty(), iso, "using `source_iso`"),
            validate::required_when("hypervisor", !self.hypervisor.is_empty(), iso, "using `source_iso`"),
            validate::required("template_os", &self.template_os),
            validate::mutually_exclusive(
                ("user_data", !self.user_data.is_empty()),
                ("user_data_file", !self.user_data_file.is_empty()),
            ),
            validate::file_exists("user_data_file", &self.user_data_file),
            validate::required("zone", &self.zone),
        ]));

        errs.extend(validate::cidrs("cidr_list", &self.cidr_list));

        errs
    }
}

impl Configuration for CloudStackConfig {
    const BUILDER_TYPE: &'static str = "cloudstack";

    fn schema() -> Schema {
        Schema::new()
            .section::<HttpConfig>()
            .section::<Communicator>()
            .section::<CloudStackConfig>()
            .exclude_from_interpolation(&["user_data"])
    }

    fn from_sections(reader: &mut SectionReader) -> Self {
        let http = reader.section::<HttpConfig>();
        let comm = reader.section::<Communicator>();
        Self {
            http,
            comm,
            ..reader.section::<CloudStackConfig>()
        }
    }

    fn prepare(&mut self, ctx: &InterpolationContext) -> Vec<ComponentErrors> {
        let mut leaf = self.apply_defaults(ctx);
        let http = self.http.prepare(ctx);
        let comm = self.comm.prepare(ctx);
        leaf.extend(self.leaf_rules());

        vec![
            ComponentErrors::new(HttpConfig::NAME, http),
            ComponentErrors::new(Communicator::NAME, comm),
            ComponentErrors::new(Self::BUILDER_TYPE, leaf),
        ]
    }

    fn to_fragment(&self) -> brokkr_core::Result<Fragment> {
        Fragment::from_sections([
            serde_json::to_value(&self.http),
            serde_json::to_value(&self.comm),
            serde_json::to_value(self),
        ])
    }
}
