//! cloudstack builder tests

use super::*;
use crate::cloudstack::CloudStackConfig;
use brokkr_core::common::{Communicator, HttpConfig};
use serial_test::serial;
use std::env;
use std::io::Write;
use std::time::Duration;

fn base() -> Fragment {
    yaml(
        r#"
api_url: https://cloudstack.example.com/client/api
api_key: key
secret_key: secret
network: net-1
service_offering: small
source_template: tmpl-ubuntu
template_os: Ubuntu 22.04
zone: zone-1
ssh_username: root
"#,
    )
}

#[test]
fn test_field_tables_match_structs() {
    assert_field_table::<HttpConfig>();
    assert_field_table::<Communicator>();
    assert_field_table::<CloudStackConfig>();
    assert!(CloudStackConfig::schema().collisions().is_empty());
}

#[test]
fn test_defaults() {
    let config = resolve_ok::<CloudStackConfig>(&[base()]).config;

    assert_eq!(config.async_timeout, Duration::from_secs(30 * 60));
    assert_eq!(config.cidr_list, vec!["0.0.0.0/0"]);
    assert!(config.instance_name.starts_with("packer-"));
    assert_eq!(config.template_name, "packer-1709294400");
    assert_eq!(config.template_display_text, "packer-1709294400");
    assert_eq!(config.http.http_port_min, 8000);
    assert_eq!(config.http.http_port_max, 9000);
    assert!(!config.comm.ssh_temporary_key_pair_name.is_empty());
}

#[test]
fn test_resolution_is_idempotent() {
    assert_idempotent::<CloudStackConfig>(&[base(), yaml("template_name: golden\nexpunge: true")]);
}

#[test]
fn test_iso_needs_disk_offering_and_hypervisor() {
    let err = resolve_err::<CloudStackConfig>(&[
        base(),
        yaml("source_template: ''\nsource_iso: iso-1"),
    ]);
    assert_eq!(err.len(), 2);
    assert!(err.mentions("`disk_offering` must be specified when using `source_iso`"));
    assert!(err.mentions("`hypervisor` must be specified when using `source_iso`"));
}

#[test]
fn test_security_group_creation_requires_expunge() {
    let err = resolve_err::<CloudStackConfig>(&[base(), yaml("create_security_group: true")]);
    assert_eq!(err.len(), 1);
    assert_eq!(err.errors()[0].component, "cloudstack");
    assert_eq!(err.errors()[0].error.field(), Some("create_security_group"));
}

#[test]
fn test_user_data_is_not_interpolated() {
    let config = resolve_ok::<CloudStackConfig>(&[
        base(),
        yaml("user_data: 'echo {{ build_name }}'\ntemplate_tag: '{{ build_name }}'"),
    ])
    .config;
    assert_eq!(config.user_data, "echo {{ build_name }}");
    assert_eq!(config.template_tag, "web");
}

#[test]
fn test_user_data_file_must_exist() {
    let err = resolve_err::<CloudStackConfig>(&[base(), yaml("user_data_file: /nonexistent/cloud-init.yaml")]);
    assert_eq!(err.len(), 1);
    assert_eq!(err.errors()[0].error.field(), Some("user_data_file"));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "#cloud-config").unwrap();
    let path = file.path().to_str().unwrap().to_string();
    let config = resolve_ok::<CloudStackConfig>(&[base(), Fragment::new().with("user_data_file", path.clone())]).config;
    assert_eq!(config.user_data_file, path);
}

#[test]
fn test_bad_cidr_is_reported() {
    let err = resolve_err::<CloudStackConfig>(&[base(), yaml("cidr_list: [10.0.0.0/8, 10.0.0.0/33]")]);
    assert_eq!(err.len(), 1);
    assert!(err.mentions("error parsing `cidr_list`"));
}

#[test]
fn test_http_port_range() {
    let err = resolve_err::<CloudStackConfig>(&[base(), yaml("http_port_min: 9100\nhttp_port_max: 9000")]);
    assert_eq!(components(&err), vec!["http"]);
}

#[test]
#[serial]
fn test_credentials_from_environment() {
    env::set_var("CLOUDSTACK_API_URL", "https://env.example.com/client/api");
    env::set_var("CLOUDSTACK_API_KEY", "env-key");
    env::set_var("CLOUDSTACK_SECRET_KEY", "env-secret");

    let mut input = base();
    input.remove("api_url");
    input.remove("api_key");
    input.remove("secret_key");
    let resolved = resolve::<CloudStackConfig>(&[input], &DecodeOptions::default(), &ctx_for::<CloudStackConfig>());

    env::remove_var("CLOUDSTACK_API_URL");
    env::remove_var("CLOUDSTACK_API_KEY");
    env::remove_var("CLOUDSTACK_SECRET_KEY");

    let config = resolved.unwrap().config;
    assert_eq!(config.api_url, "https://env.example.com/client/api");
    assert_eq!(config.api_key, "env-key");
    assert_eq!(config.secret_key, "env-secret");
}

#[test]
#[serial]
fn test_every_missing_field_is_reported() {
    env::remove_var("CLOUDSTACK_API_URL");
    env::remove_var("CLOUDSTACK_API_KEY");
    env::remove_var("CLOUDSTACK_SECRET_KEY");

    let err = resolve_err::<CloudStackConfig>(&[yaml("ssh_username: root")]);
    for field in [
        "api_url",
        "api_key",
        "secret_key",
        "network",
        "service_offering",
        "template_os",
        "zone",
    ] {
        assert_eq!(err.for_field(field).count(), 1, "missing error for {}", field);
    }
    assert!(err.mentions("one of `source_iso` or `source_template` must be specified"));
}
