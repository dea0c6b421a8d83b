//! AWS credentials and region

use brokkr_core::{defaults, validate, ConfigError, FieldSpec, InterpolationContext, Prepare, Section};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub access_key: String,
    pub secret_key: String,
    pub token: String,
    pub profile: String,
    pub region: String,
    pub skip_region_validation: bool,
}

impl Section for AccessConfig {
    const NAME: &'static str = "access_config";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::replace("access_key"),
        FieldSpec::replace("secret_key"),
        FieldSpec::replace("token"),
        FieldSpec::replace("profile"),
        FieldSpec::replace("region"),
        FieldSpec::replace("skip_region_validation"),
    ];
}

impl Prepare for AccessConfig {
    fn prepare(&mut self, _ctx: &InterpolationContext) -> Vec<ConfigError> {
        defaults::from_env("region", &mut self.region, "AWS_DEFAULT_REGION");

        let mut errs = Vec::new();
        errs.extend(validate::required("region", &self.region));
        if self.access_key.is_empty() != self.secret_key.is_empty() {
            errs.push(ConfigError::validation(
                "access_key",
                "`access_key` and `secret_key` must be specified together",
            ));
        }
        errs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_region_from_env() {
        env::set_var("AWS_DEFAULT_REGION", "ap-south-1");
        let mut c = AccessConfig::default();
        assert!(c.prepare(&InterpolationContext::new("b", "amazon-ebs")).is_empty());
        assert_eq!(c.region, "ap-south-1");
        env::remove_var("AWS_DEFAULT_REGION");

        let mut c = AccessConfig::default();
        let errs = c.prepare(&InterpolationContext::new("b", "amazon-ebs"));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field(), Some("region"));
    }

    #[test]
    #[serial]
    fn test_keys_come_in_pairs() {
        let mut c = AccessConfig {
            region: "us-east-1".into(),
            access_key: "AKIA".into(),
            ..Default::default()
        };
        let errs = c.prepare(&InterpolationContext::new("b", "amazon-ebs"));
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].field(), Some("access_key"));
    }
}
