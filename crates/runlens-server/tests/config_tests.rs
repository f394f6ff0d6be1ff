use std::collections::HashMap;
use std::path::PathBuf;

use runlens_server::config::{DEFAULT_BIND_ADDR, DEFAULT_ORIGIN};
use runlens_server::ServerConfig;

#[test]
fn test_empty_file_uses_defaults() {
    let config = ServerConfig::from_toml_str("").unwrap();
    assert_eq!(config.server.bind_addr, DEFAULT_BIND_ADDR);
    assert_eq!(config.server.allowed_origins, vec![DEFAULT_ORIGIN.to_string()]);
}

#[test]
fn test_storage_paths_derive_from_data_dir() {
    let config = ServerConfig::from_toml_str(
        r#"
        [storage]
        data_dir = "/srv/runlens"
        scratch_dir = "/tmp/runlens-scratch"
        "#,
    )
    .unwrap();
    let storage = &config.storage;
    assert_eq!(storage.artifacts_dir(), PathBuf::from("/srv/runlens/artifacts"));
    assert_eq!(storage.scratch_dir(), PathBuf::from("/tmp/runlens-scratch"));
    assert_eq!(storage.sessions_file(), PathBuf::from("/srv/runlens/sessions.json"));
    assert_eq!(storage.status_file(), PathBuf::from("/srv/runlens/download_status.json"));
    assert_eq!(storage.activities_dir(), PathBuf::from("/srv/runlens/activities"));
}

#[test]
fn test_env_overrides() {
    let mut config = ServerConfig::from_toml_str(
        r#"
        [server]
        bind_addr = "0.0.0.0:9000"
        "#,
    )
    .unwrap();
    let vars: HashMap<&str, &str> = HashMap::from([
        ("RUNLENS_BIND_ADDR", "127.0.0.1:9100"),
        ("RUNLENS_DATA_DIR", "/data"),
        ("RUNLENS_DOMAIN", "https://runlens.example"),
    ]);
    config.apply_overrides_from(|name| vars.get(name).map(|v| v.to_string()));

    assert_eq!(config.server.bind_addr, "127.0.0.1:9100");
    assert_eq!(config.storage.data_dir, PathBuf::from("/data"));
    assert_eq!(
        config.server.allowed_origins,
        vec![DEFAULT_ORIGIN.to_string(), "https://runlens.example".to_string()]
    );

    // applying twice does not duplicate the origin
    config.apply_overrides_from(|name| vars.get(name).map(|v| v.to_string()));
    assert_eq!(config.server.allowed_origins.len(), 2);
}

#[test]
fn test_invalid_toml_is_rejected() {
    assert!(ServerConfig::from_toml_str("[server]\nbind_addr = 5").is_err());
}

#[test]
fn test_load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runlens.toml");
    std::fs::write(&path, "[server]\nallowed_origins = [\"https://a.example\"]\n").unwrap();
    let config = ServerConfig::load(Some(path.as_path())).unwrap();
    assert!(config
        .server
        .allowed_origins
        .contains(&"https://a.example".to_string()));

    assert!(ServerConfig::load(Some(dir.path().join("absent.toml").as_path())).is_err());
}
