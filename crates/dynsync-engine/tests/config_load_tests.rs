// Tests for loading configuration from disk

use dynsync_core::errors::ExErrorKind;
use dynsync_core::identity::KeySpec;
use dynsync_engine::config::AppConfig;
use tempfile::TempDir;

#[test]
fn test_load_from_explicit_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("dynsync.toml");
    std::fs::write(
        &path,
        r#"
        [thresholds]
        fail_error_ratio = 0.2

        [[collections]]
        name = "articles"
        key = { field = "ItemNumber" }
        "#,
    )
    .unwrap();

    let config = AppConfig::load(Some(&path)).unwrap();

    assert_eq!(config.thresholds.fail_error_ratio, 0.2);
    assert_eq!(
        config.collection("articles").unwrap().key,
        KeySpec::single("ItemNumber")
    );
}

#[test]
fn test_missing_file_is_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let err = AppConfig::load(Some(&temp_dir.path().join("absent.toml"))).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Io);
    assert_eq!(err.op(), Some("load_config"));
}

#[test]
fn test_malformed_file_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.toml");
    std::fs::write(&path, "[[collections]]\nname = \"articles\"\n").unwrap();

    let err = AppConfig::load(Some(&path)).unwrap_err();
    assert_eq!(err.kind(), ExErrorKind::Config);
    assert!(err.message().contains("broken.toml"));
}
