//! lxd builder tests

use super::*;
use crate::lxd::LxdConfig;

#[test]
fn test_field_tables_match_structs() {
    assert_field_table::<LxdConfig>();
    assert!(LxdConfig::schema().collisions().is_empty());
}

#[test]
fn test_defaults() {
    let config = resolve_ok::<LxdConfig>(&[yaml("image: ubuntu-daily:22.04")]).config;

    assert_eq!(config.container_name, "packer-web");
    assert_eq!(config.output_image, "packer-web");
    assert_eq!(config.profile, "default");
    assert_eq!(config.init_sleep, "3");
    assert_eq!(config.command_wrapper, "{{.Command}}");
}

#[test]
fn test_output_image_follows_container_name() {
    let config = resolve_ok::<LxdConfig>(&[yaml("image: ubuntu-daily:22.04\ncontainer_name: '{{ build_name }}-ct'")]).config;
    assert_eq!(config.container_name, "web-ct");
    assert_eq!(config.output_image, "web-ct");
}

#[test]
fn test_resolution_is_idempotent() {
    assert_idempotent::<LxdConfig>(&[
        yaml("image: ubuntu-daily:22.04\npublish_properties: {description: web}"),
        yaml("launch_config: {limits.cpu: '2'}"),
    ]);
}

#[test]
fn test_property_maps_are_unioned() {
    let config = resolve_ok::<LxdConfig>(&[
        yaml("image: ubuntu-daily:22.04\npublish_properties: {description: web, os: ubuntu}"),
        yaml("publish_properties: {description: api}"),
    ])
    .config;
    assert_eq!(config.publish_properties.len(), 2);
    assert_eq!(config.publish_properties["description"], "api");
    assert_eq!(config.publish_properties["os"], "ubuntu");
}

#[test]
fn test_image_required() {
    let err = resolve_err::<LxdConfig>(&[Fragment::new()]);
    assert_eq!(err.len(), 1);
    assert!(err.mentions("`image` is a required parameter for LXD"));
}

#[test]
fn test_init_sleep_must_be_whole_seconds() {
    let err = resolve_err::<LxdConfig>(&[yaml("image: ubuntu-daily:22.04\ninit_sleep: '2.5'")]);
    assert_eq!(err.len(), 1);
    assert_eq!(err.errors()[0].error.field(), Some("init_sleep"));
}

#[test]
fn test_interpolation_can_be_disabled() {
    let options = DecodeOptions { interpolate: false };
    let resolved = brokkr_core::resolve::<LxdConfig>(
        &[yaml("image: ubuntu-daily:22.04\ncontainer_name: '{{ build_name }}'")],
        &options,
        &ctx_for::<LxdConfig>(),
    )
    .unwrap();
    assert_eq!(resolved.config.container_name, "{{ build_name }}");
}
