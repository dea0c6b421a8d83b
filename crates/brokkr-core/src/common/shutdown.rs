//! Guest shutdown settings

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::decode::{FieldSpec, Prepare, Section};
use crate::defaults;
use crate::error::ConfigError;
use crate::interpolate::InterpolationContext;
use crate::validate;

const DEFAULT_SHUTDOWN_TIMEOUT: &str = "5m";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Command run inside the guest to shut it down; empty means a hard stop
    pub shutdown_command: String,
    #[serde(rename = "shutdown_timeout")]
    pub raw_shutdown_timeout: String,
    #[serde(skip)]
    pub shutdown_timeout: Duration,
}

impl Section for ShutdownConfig {
    const NAME: &'static str = "shutdown";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("shutdown_command"),
        FieldSpec::replace("shutdown_timeout"),
    ];
}

impl Prepare for ShutdownConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        defaults::string(&mut self.raw_shutdown_timeout, DEFAULT_SHUTDOWN_TIMEOUT);

        match validate::duration("shutdown_timeout", &self.raw_shutdown_timeout) {
            Ok(d) => {
                self.shutdown_timeout = d;
                Vec::new()
            }
            Err(e) => vec![e],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_defaults_to_five_minutes() {
        let mut cfg = ShutdownConfig::default();
        assert!(cfg.prepare(&InterpolationContext::new("b", "vmware-vmx")).is_empty());
        assert_eq!(cfg.raw_shutdown_timeout, "5m");
        assert_eq!(cfg.shutdown_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_explicit_timeout() {
        let mut cfg = ShutdownConfig {
            raw_shutdown_timeout: "10s".into(),
            ..Default::default()
        };
        assert!(cfg.prepare(&InterpolationContext::new("b", "vmware-vmx")).is_empty());
        assert_eq!(cfg.shutdown_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_bad_timeout() {
        let mut cfg = ShutdownConfig {
            raw_shutdown_timeout: "bad".into(),
            ..Default::default()
        };
        let errs = cfg.prepare(&InterpolationContext::new("b", "vmware-vmx"));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field(), Some("shutdown_timeout"));
    }
}
