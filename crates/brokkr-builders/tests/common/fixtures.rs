//! Fragment fixtures for resolution tests

use brokkr_core::{Fragment, InterpolationContext};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{TimeZone, Utc};
use tempfile::TempDir;

/// A directory of fragment files that lives as long as the fixture
pub struct FragmentDir {
    dir: TempDir,
}

impl FragmentDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Utf8Path {
        Utf8Path::from_path(self.dir.path()).expect("temp dir is utf-8")
    }

    /// Write `content` to `name` and return its path
    pub fn write(&self, name: &str, content: &str) -> Utf8PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, content).expect("write fragment");
        path
    }

    /// Write and load a fragment
    pub fn fragment(&self, name: &str, content: &str) -> Fragment {
        Fragment::load(&self.write(name, content)).expect("load fragment")
    }
}

/// Context for build `web` started at 2024-03-01T12:00:00Z
pub fn fixed_context() -> InterpolationContext {
    InterpolationContext::at(
        "web",
        "unset",
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    )
}

pub const AMAZON_BASE: &str = r#"
region: us-east-1
instance_type: t3.micro
source_ami: ami-0abcdef
ssh_username: ubuntu
ami_name: "{{ build_name }}-{{ timestamp }}"
tags:
  Team: platform
"#;

pub const AMAZON_PRODUCTION: &str = r#"{
  "instance_type": "m5.large",
  "ami_regions": ["us-west-2", "eu-west-1", "us-west-2"],
  "tags": { "Environment": "production" },
  "launch_block_device_mappings": [
    { "device_name": "/dev/sda1", "volume_size": 40, "volume_type": "gp3", "delete_on_termination": true }
  ]
}"#;
