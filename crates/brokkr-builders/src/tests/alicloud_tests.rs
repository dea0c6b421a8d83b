//! alicloud-ecs builder tests

use super::*;
use crate::alicloud::{AlicloudAccessConfig, AlicloudConfig, AlicloudImageConfig, AlicloudRunConfig};
use serial_test::serial;
use std::env;

const BASE: &str = r#"
access_key: LTAI
secret_key: secret
region: cn-hangzhou
instance_type: ecs.n1.tiny
source_image: ubuntu_22_04_x64_20G_alibase_20240101.vhd
image_name: web-image
ssh_username: root
"#;

#[test]
fn test_field_tables_match_structs() {
    assert_field_table::<AlicloudAccessConfig>();
    assert_field_table::<AlicloudImageConfig>();
    assert_field_table::<AlicloudRunConfig>();
    assert!(AlicloudConfig::schema().collisions().is_empty());
}

#[test]
fn test_minimal_config_resolves() {
    let config = resolve_ok::<AlicloudConfig>(&[yaml(BASE)]).config;
    assert_eq!(config.access.region, "cn-hangzhou");
    assert!(config.comm.ssh_temporary_key_pair_name.starts_with("packer_"));
}

#[test]
fn test_resolution_is_idempotent() {
    assert_idempotent::<AlicloudConfig>(&[
        yaml(BASE),
        yaml(
            r#"
image_copy_regions: [cn-beijing, cn-shanghai, cn-beijing]
tags: {team: ops}
system_disk_mapping:
  disk_size: 40
  disk_category: cloud_efficiency
image_disk_mappings:
  - disk_name: data
    disk_size: 100
    disk_encrypted: true
"#,
        ),
    ]);
}

#[test]
fn test_tags_are_replaced_not_unioned() {
    let config = resolve_ok::<AlicloudConfig>(&[
        yaml(BASE),
        yaml("tags: {x: 1}"),
        yaml("tags: {y: 2}"),
    ])
    .config;
    assert_eq!(config.image.tags.len(), 1);
    assert_eq!(config.image.tags["y"], "2");
}

#[test]
fn test_copy_regions_deduplicated_in_order() {
    let config = resolve_ok::<AlicloudConfig>(&[
        yaml(BASE),
        yaml("image_copy_regions: [cn-shanghai, cn-beijing, cn-shanghai]"),
    ])
    .config;
    assert_eq!(config.image.image_copy_regions, vec!["cn-shanghai", "cn-beijing"]);
}

#[test]
fn test_disk_encryption_flag_is_carried() {
    let config = resolve_ok::<AlicloudConfig>(&[
        yaml(BASE),
        yaml("image_disk_mappings: [{disk_name: data, disk_encrypted: false}]"),
    ])
    .config;
    assert_eq!(config.image.image_disk_mappings[0].disk_encrypted, Some(false));
}

#[test]
fn test_image_name_rules() {
    let err = resolve_err::<AlicloudConfig>(&[yaml(BASE), yaml("image_name: x")]);
    assert!(err.mentions("between 2 and 128 characters"));

    let err = resolve_err::<AlicloudConfig>(&[yaml(BASE), yaml("image_name: https://images")]);
    assert!(err.mentions("can't start with 'http://' or 'https://'"));

    let err = resolve_err::<AlicloudConfig>(&[yaml(BASE), yaml("image_name: web image")]);
    assert_eq!(err.len(), 1);
    assert!(err.mentions("can't include spaces"));
}

#[test]
#[serial]
fn test_credentials_from_environment() {
    env::set_var("ALICLOUD_ACCESS_KEY", "env-key");
    env::set_var("ALICLOUD_SECRET_KEY", "env-secret");
    env::set_var("ALICLOUD_REGION", "cn-shenzhen");

    let mut input = yaml(BASE);
    input.remove("access_key");
    input.remove("secret_key");
    input.remove("region");
    let resolved = resolve::<AlicloudConfig>(&[input], &DecodeOptions::default(), &ctx_for::<AlicloudConfig>());

    env::remove_var("ALICLOUD_ACCESS_KEY");
    env::remove_var("ALICLOUD_SECRET_KEY");
    env::remove_var("ALICLOUD_REGION");

    let access = resolved.unwrap().config.access;
    assert_eq!(access.access_key, "env-key");
    assert_eq!(access.region, "cn-shenzhen");
}

#[test]
#[serial]
fn test_required_fields() {
    env::remove_var("ALICLOUD_ACCESS_KEY");
    env::remove_var("ALICLOUD_SECRET_KEY");
    env::remove_var("ALICLOUD_REGION");

    let err = resolve_err::<AlicloudConfig>(&[yaml("ssh_username: root")]);
    assert_eq!(
        components(&err),
        vec!["access_config", "image_config", "run_config"]
    );
    assert_eq!(err.len(), 6);
}
