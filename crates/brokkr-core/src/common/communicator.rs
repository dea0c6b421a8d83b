//! Communicator settings
//!
//! How the build connects to the machine it is provisioning. Only the
//! settings and their rules live here; connecting is someone else's job.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::decode::{FieldSpec, Prepare, Section};
use crate::defaults;
use crate::error::ConfigError;
use crate::interpolate::InterpolationContext;
use crate::validate;

pub const COMMUNICATOR_TYPES: &[&str] = &["ssh", "winrm", "none"];

const DEFAULT_SSH_PORT: u16 = 22;
const DEFAULT_WINRM_PORT: u16 = 5985;
const DEFAULT_WINRM_SSL_PORT: u16 = 5986;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Communicator {
    #[serde(rename = "communicator")]
    pub kind: String,

    pub ssh_host: String,
    pub ssh_port: u16,
    pub ssh_username: String,
    pub ssh_password: String,
    pub ssh_private_key_file: String,
    pub ssh_keypair_name: String,
    pub ssh_temporary_key_pair_name: String,
    pub ssh_agent_auth: bool,
    pub ssh_interface: String,
    #[serde(rename = "ssh_timeout")]
    pub raw_ssh_timeout: String,
    #[serde(skip)]
    pub ssh_timeout: Duration,

    pub winrm_host: String,
    pub winrm_port: u16,
    pub winrm_username: String,
    pub winrm_password: String,
    pub winrm_use_ssl: bool,
    pub winrm_insecure: bool,
    #[serde(rename = "winrm_timeout")]
    pub raw_winrm_timeout: String,
    #[serde(skip)]
    pub winrm_timeout: Duration,
}

impl Section for Communicator {
    const NAME: &'static str = "communicator";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("communicator"),
        FieldSpec::replace("ssh_host"),
        FieldSpec::replace("ssh_port"),
        FieldSpec::replace("ssh_username"),
        FieldSpec::replace("ssh_password"),
        FieldSpec::replace("ssh_private_key_file"),
        FieldSpec::replace("ssh_keypair_name"),
        FieldSpec::replace("ssh_temporary_key_pair_name"),
        FieldSpec::replace("ssh_agent_auth"),
        FieldSpec::replace("ssh_interface"),
        FieldSpec::replace("ssh_timeout"),
        FieldSpec::replace("winrm_host"),
        FieldSpec::replace("winrm_port"),
        FieldSpec::replace("winrm_username"),
        FieldSpec::replace("winrm_password"),
        FieldSpec::replace("winrm_use_ssl"),
        FieldSpec::replace("winrm_insecure"),
        FieldSpec::replace("winrm_timeout"),
    ];
}

impl Communicator {
    pub fn is_ssh(&self) -> bool {
        self.kind == "ssh"
    }

    pub fn is_winrm(&self) -> bool {
        self.kind == "winrm"
    }

    /// Use a generated key pair when no other SSH credential is configured.
    ///
    /// Backends that can create key pairs call this before [`Prepare::prepare`].
    pub fn default_temporary_key_pair(&mut self, ctx: &InterpolationContext) {
        if self.ssh_keypair_name.is_empty()
            && self.ssh_temporary_key_pair_name.is_empty()
            && self.ssh_private_key_file.is_empty()
            && self.ssh_password.is_empty()
        {
            self.ssh_temporary_key_pair_name = defaults::temporary_name(ctx);
        }
    }

    fn apply_defaults(&mut self) {
        defaults::string(&mut self.kind, "ssh");
        defaults::string(&mut self.raw_ssh_timeout, "5m");
        defaults::string(&mut self.raw_winrm_timeout, "30m");

        if self.ssh_port == 0 {
            self.ssh_port = DEFAULT_SSH_PORT;
        }
        if self.winrm_port == 0 {
            self.winrm_port = if self.winrm_use_ssl {
                DEFAULT_WINRM_SSL_PORT
            } else {
                DEFAULT_WINRM_PORT
            };
        }
    }
}

impl Prepare for Communicator {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        self.apply_defaults();

        let mut errs = Vec::new();

        if let Some(e) = validate::one_of("communicator", &self.kind, COMMUNICATOR_TYPES) {
            errs.push(e);
        }

        match validate::duration("ssh_timeout", &self.raw_ssh_timeout) {
            Ok(d) => self.ssh_timeout = d,
            Err(e) => errs.push(e),
        }
        match validate::duration("winrm_timeout", &self.raw_winrm_timeout) {
            Ok(d) => self.winrm_timeout = d,
            Err(e) => errs.push(e),
        }

        if self.is_ssh() {
            errs.extend(validate::required("ssh_username", &self.ssh_username));
            errs.extend(validate::file_exists("ssh_private_key_file", &self.ssh_private_key_file));
        }

        if self.is_winrm() {
            errs.extend(validate::required("winrm_username", &self.winrm_username));
        }

        errs
    }
}
