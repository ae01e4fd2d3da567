use geocluster::prelude::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_json_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("clusters.json");

    let config = ClusterConfig::new(2, 15)
        .with_radius(80.0)
        .with_extent(512.0)
        .with_mu(0.25)
        .with_index(IndexKind::Grid)
        .with_strategy(ClusteringStrategy::Ordered);
    fs::write(&path, config.to_json().unwrap()).unwrap();

    let loaded = ClusterConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_toml_file_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("clusters.toml");

    let config = ClusterConfig::new(0, 10)
        .with_index(IndexKind::RTree)
        .with_strategy(ClusteringStrategy::Eager);
    fs::write(&path, config.to_toml().unwrap()).unwrap();

    let loaded = ClusterConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_legacy_names() {
    let json = r#"{ "max_zoom": 9, "index": "GridIndex", "strategy": "SBiSuperCluster" }"#;
    let config = ClusterConfig::from_json(json).unwrap();
    assert_eq!(config.index, IndexKind::Grid);
    assert_eq!(config.strategy, ClusteringStrategy::Ordered);
    assert_eq!(config.min_zoom, 0);
    assert_eq!(config.radius, 60.0);

    let toml = r#"
        min_zoom = 1
        max_zoom = 11
        index = "RTree"
        strategy = "LBiSuperCluster"
    "#;
    let config = ClusterConfig::from_toml(toml).unwrap();
    assert_eq!(config.index, IndexKind::RTree);
    assert_eq!(config.strategy, ClusteringStrategy::LevelBatched);
}

#[test]
fn test_unknown_index_falls_back_to_kd_tree() {
    let config = ClusterConfig::from_json(r#"{ "index": "QuadTree" }"#).unwrap();
    assert_eq!(config.index, IndexKind::KdTree);
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(ClusterConfig::from_json(r#"{ "min_zoom": 8, "max_zoom": 4 }"#).is_err());
    assert!(ClusterConfig::from_json(r#"{ "max_zoom": 31 }"#).is_err());
    assert!(ClusterConfig::from_json(r#"{ "radius": -1.0 }"#).is_err());
    assert!(ClusterConfig::from_toml("extent = 0.0").is_err());
    assert!(ClusterConfig::from_json(r#"{ "strategy": "Quantum" }"#).is_err());
}

#[test]
fn test_unsupported_extension() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("clusters.yaml");
    fs::write(&path, "max_zoom: 3").unwrap();

    let err = ClusterConfig::from_file(&path).unwrap_err();
    assert!(matches!(err, ClusterError::InvalidConfig(_)));
}

#[test]
fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = ClusterConfig::from_file(temp_dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ClusterError::Io(_)));
}

#[test]
fn test_builder_reads_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("clusters.json");
    fs::write(&path, r#"{ "min_zoom": 3, "max_zoom": 7, "strategy": "batch" }"#).unwrap();

    let clusterer = ClustererBuilder::new()
        .config_file(&path)
        .unwrap()
        .radius(30.0)
        .build()
        .unwrap();
    assert_eq!(clusterer.min_zoom(), 3);
    assert_eq!(clusterer.max_zoom(), 7);
    assert_eq!(clusterer.strategy(), ClusteringStrategy::Batch);
    assert_eq!(clusterer.config().radius, 30.0);
}
