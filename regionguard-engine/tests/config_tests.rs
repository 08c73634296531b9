use pretty_assertions::assert_eq;
use regionguard_engine::{ConfigError, EngineConfig};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn defaults() {
    let config = EngineConfig::default();
    assert_eq!(config.storage.directory, PathBuf::from("worlds"));
    assert!(config.storage.keep_unresolved_names);
    assert!(!config.regions.use_max_priority_association);
    assert!(!config.regions.prefer_cached_queries);
    assert_eq!(config.regions.max_regions_per_player, 7);
    assert_eq!(config.regions.max_chunk_span, regionguard_index::DEFAULT_MAX_CHUNK_SPAN);
}

#[test]
fn parses_every_key() {
    let config = EngineConfig::from_toml_str(
        r#"
        [storage]
        directory = "/srv/regions"
        keep-unresolved-names = false

        [regions]
        use-max-priority-association = true
        max-chunk-span = 64
        prefer-cached-queries = true
        max-regions-per-player = 0
        "#,
    )
    .unwrap();

    assert_eq!(config.storage.directory, PathBuf::from("/srv/regions"));
    assert!(!config.storage.keep_unresolved_names);
    assert!(config.regions.use_max_priority_association);
    assert_eq!(config.regions.max_chunk_span, 64);
    assert!(config.regions.prefer_cached_queries);
    assert_eq!(config.regions.max_regions_per_player, 0);
}

#[test]
fn missing_sections_take_defaults() {
    let config = EngineConfig::from_toml_str("[regions]\nmax-regions-per-player = 3\n").unwrap();
    assert_eq!(config.regions.max_regions_per_player, 3);
    assert_eq!(config.storage, EngineConfig::default().storage);

    assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let err = EngineConfig::from_toml_str("[regions\nmax-chunk-span = ").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));

    let err = EngineConfig::from_toml_str("[regions]\nmax-chunk-span = \"wide\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn zero_chunk_span_is_rejected() {
    let err = EngineConfig::from_toml_str("[regions]\nmax-chunk-span = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "regions.max-chunk-span", .. }));
}

#[test]
fn region_file_is_per_world() {
    let config = EngineConfig::from_toml_str("[storage]\ndirectory = \"data\"\n").unwrap();
    assert_eq!(
        config.region_file("nether"),
        PathBuf::from("data").join("nether").join("regions.json")
    );
}

// ============================================================================
// Loading from disk
// ============================================================================

#[test]
fn load_from_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let config = EngineConfig::load_from(dir.path().join("regionguard.toml"));
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("regionguard.toml");
    fs::write(&path, "[regions]\nprefer-cached-queries = true\n").unwrap();

    let config = EngineConfig::load_from(&path);
    assert!(config.regions.prefer_cached_queries);
}

#[test]
fn load_from_invalid_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("regionguard.toml");
    fs::write(&path, "[regions]\nmax-chunk-span = 0\n").unwrap();
    assert_eq!(EngineConfig::load_from(&path), EngineConfig::default());

    fs::write(&path, "not = [valid").unwrap();
    assert_eq!(EngineConfig::load_from(&path), EngineConfig::default());
}

#[test]
fn load_from_directory_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    assert_eq!(EngineConfig::load_from(dir.path()), EngineConfig::default());
}
