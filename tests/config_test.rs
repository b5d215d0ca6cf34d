//! Loading client configuration from TOML files.
#![cfg(feature = "config")]

mod common;

use std::io::Write;
use std::sync::Arc;

use common::*;
use licat::{ClientConfig, LicatBuilder, LicatError};

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("licat.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"
base_url = "https://catalog.test/api/"
licenses_path = "license"
max_concurrency = 2

[headers]
X-Audit = "1"
"#
    )
    .unwrap();

    let config = ClientConfig::load(&path).unwrap();
    assert_eq!(config.licenses_path.as_deref(), Some("license"));
    assert_eq!(config.max_concurrency, Some(2));
    assert_eq!(config.headers.get("X-Audit").map(String::as_str), Some("1"));
}

#[test]
fn malformed_file_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "base_url = [").unwrap();

    assert!(matches!(
        ClientConfig::load(&path),
        Err(LicatError::Configuration(_))
    ));
}

#[tokio::test]
async fn config_drives_the_builder() {
    let config = ClientConfig::from_toml_str(
        r#"
base_url = "https://catalog.test/api/"
licenses_path = "license"
cache_snapshot = false

[headers]
X-Audit = "1"
"#,
    )
    .unwrap();

    let url = "https://catalog.test/api/license";
    let stub = Arc::new(StubTransport::new().route(
        url,
        Reply::ok(array(&[license_json("mit", "MIT License", Some("MIT"))])),
    ));
    let client = LicatBuilder::from_config(&config)
        .transport(stub.clone())
        .build()
        .unwrap();

    client.get_all().await.unwrap();
    client.get_all().await.unwrap();

    // cache_snapshot = false: one listing request per call
    assert_eq!(stub.calls_to(url), 2);
    assert!(stub.headers_seen().iter().all(|h| h["x-audit"] == "1"));
}

#[test]
fn invalid_header_in_config_fails_build() {
    let config = ClientConfig::from_toml_str(
        r#"
[headers]
"bad header" = "x"
"#,
    )
    .unwrap();
    let result = LicatBuilder::from_config(&config).build();
    assert!(matches!(result, Err(LicatError::Configuration(_))));
}
