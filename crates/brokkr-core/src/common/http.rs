//! Local HTTP server used to serve files to the guest during boot

use serde::{Deserialize, Serialize};

use crate::decode::{FieldSpec, Prepare, Section};
use crate::error::ConfigError;
use crate::interpolate::InterpolationContext;

const DEFAULT_PORT_MIN: u16 = 8000;
const DEFAULT_PORT_MAX: u16 = 9000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub http_directory: String,
    pub http_port_min: u16,
    pub http_port_max: u16,
}

impl Section for HttpConfig {
    const NAME: &'static str = "http";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("http_directory"),
        FieldSpec::replace("http_port_min"),
        FieldSpec::replace("http_port_max"),
    ];
}

impl Prepare for HttpConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        if self.http_port_min == 0 {
            self.http_port_min = DEFAULT_PORT_MIN;
        }
        if self.http_port_max == 0 {
            self.http_port_max = DEFAULT_PORT_MAX;
        }

        if self.http_port_min > self.http_port_max {
            return vec![ConfigError::validation(
                "http_port_min",
                "`http_port_min` must be less than or equal to `http_port_max`",
            )];
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_defaults() {
        let mut cfg = HttpConfig::default();
        assert!(cfg.prepare(&InterpolationContext::new("b", "virtualbox-ovf")).is_empty());
        assert_eq!((cfg.http_port_min, cfg.http_port_max), (8000, 9000));
    }

    #[test]
    fn test_min_above_max() {
        let mut cfg = HttpConfig {
            http_port_min: 9500,
            ..Default::default()
        };
        let errs = cfg.prepare(&InterpolationContext::new("b", "virtualbox-ovf"));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field(), Some("http_port_min"));
    }
}
