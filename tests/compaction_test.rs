//! Integration tests driving compaction from a configuration file through the public API.

mod common;

use common::{create_test_project, init_logging};
use compact_core::{
    compact::{Compact, Mode, STATEMENT_SEPARATOR},
    config::CompactConfig,
    group::Group,
    middleware::CompactMiddleware,
    CompactError,
};
use std::sync::Arc;
use tempfile::TempDir;
use test_log::test;

fn load(temp_dir: &TempDir) -> Compact {
    let config_path = create_test_project(temp_dir);
    Compact::new(CompactConfig::from_file(config_path).unwrap()).unwrap()
}

#[test]
fn test_config_file_paths_are_relative_to_the_file() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let config = CompactConfig::from_file(create_test_project(&temp_dir)).unwrap();

    assert_eq!(config.source, temp_dir.path().join("assets"));
    assert_eq!(config.destination, temp_dir.path().join("public/js"));
    assert_eq!(config.web_path, "/js");
    assert_eq!(
        config.groups,
        vec![Group::new(["global", "profile"]), Group::new(["blog"])]
    );
    assert!(!config.debug);
}

#[test]
fn test_missing_config_file() {
    let err = CompactConfig::from_file("does/not/exist.toml").unwrap_err();
    assert!(matches!(err, CompactError::Config(_)));
}

#[test]
fn test_declared_namespaces_are_registered() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let compact = load(&temp_dir);
    let registry = compact.registry();

    assert_eq!(registry.len(), 5);
    assert!(temp_dir.path().join("public/js").is_dir());

    let global = registry.get("global").unwrap();
    let names = global
        .files()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["jquery.js", "a.js"]);

    let alternative = registry.get("alternative").unwrap();
    assert!(alternative.files()[0].starts_with(
        temp_dir.path().join("assets-alt").canonicalize().unwrap()
    ));
    assert!(alternative.files()[1].starts_with(
        temp_dir.path().join("assets").canonicalize().unwrap()
    ));
}

#[test(tokio::test)]
async fn test_configured_groups_through_middleware() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let config_path = create_test_project(&temp_dir);
    let config = CompactConfig::from_file(&config_path).unwrap();
    let groups = config.groups.clone();
    let compact = Arc::new(Compact::new(config).unwrap());

    let middleware = CompactMiddleware::new(compact.clone(), groups).unwrap();
    let assets = middleware.run().await.unwrap();
    assert_eq!(
        assets.js(),
        &["/js/global-profile.js".to_string(), "/js/blog.js".to_string()]
    );
    assert_eq!(
        assets.js_html(),
        "<script src=\"/js/global-profile.js\"></script><script src=\"/js/blog.js\"></script>"
    );

    let written =
        std::fs::read_to_string(temp_dir.path().join("public/js/global-profile.js")).unwrap();
    assert_eq!(
        written,
        ["var $ = {};", "var a = 1", "function c() { return 3; }"].join(STATEMENT_SEPARATOR)
    );
    assert!(compact.is_cached(&Group::new(["global", "profile"])));
    assert!(!compact.is_cached(&Group::new(["profile", "global"])));
}

#[test(tokio::test)]
async fn test_debug_override_returns_one_reference_per_file() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let compact = load(&temp_dir);

    let refs = compact
        .compact(&Group::new(["global", "profile"]), Mode::Debug)
        .await
        .unwrap();
    assert_eq!(refs.len(), 3);
    assert!(refs[0].starts_with("/js/") && refs[0].ends_with("-jquery.js"));
    assert!(refs[1].ends_with("-a.js"));
    assert!(refs[2].ends_with("-c.js"));
    assert!(!compact.is_cached(&Group::new(["global", "profile"])));

    for reference in &refs {
        let name = reference.trim_start_matches("/js/");
        assert!(temp_dir.path().join("public/js").join(name).is_file());
    }
}

#[test(tokio::test)]
async fn test_unknown_namespace_in_group() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    let compact = load(&temp_dir);

    let err = compact
        .compact_group(&Group::new(["global", "nope"]))
        .await
        .unwrap_err();
    assert_eq!(err, CompactError::UnknownNamespace("nope".to_string()));
    assert_eq!(err.to_string(), "Unknown namespace 'nope'");
    assert_eq!(
        std::fs::read_dir(temp_dir.path().join("public/js"))
            .unwrap()
            .count(),
        0
    );
}

#[test]
fn test_config_with_missing_file_fails_construction() {
    init_logging();
    let temp_dir = TempDir::new().unwrap();
    std::fs::create_dir_all(temp_dir.path().join("assets")).unwrap();
    let path = temp_dir.path().join("compact.toml");
    std::fs::write(
        &path,
        "source = \"assets\"\ndestination = \"out\"\n\n[namespaces]\nglobal = [\"xyz.js\"]\n",
    )
    .unwrap();

    let err = Compact::new(CompactConfig::from_file(&path).unwrap()).unwrap_err();
    assert_eq!(err, CompactError::NotFound("xyz.js".to_string()));
}
