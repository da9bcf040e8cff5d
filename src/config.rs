//! Construction options and declarative namespace configuration.
//!
//! A configuration file is TOML:
//!
//! ```toml
//! source = "assets"
//! destination = "public/js"
//! web_path = "/js"
//! debug = false
//! groups = [["global", "profile"], ["blog"]]
//!
//! [transform]
//! mangle = true
//!
//! [namespaces]
//! prepend = ["a.js"]
//! append = ["b.js"]
//! test = ["prepend", "c.js", "append"]
//! alternative = { source = "assets-alt", files = ["a.js"] }
//! ```
//!
//! An entry in a namespace's list that names another namespace (declared in the same table or
//! already registered) inlines that namespace's files at that position. Every other entry is a
//! file reference resolved through the chain of the namespace being declared.

use crate::{
    error::CompactError,
    group::Group,
    namespace::Registry,
    transform::TransformOptions,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fs::read_to_string,
    path::{Path, PathBuf},
};

pub const DEFAULT_EXTENSION: &str = "js";

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompactConfig {
    /// Global source root. Must exist.
    pub source: PathBuf,
    /// Output directory. Created when missing.
    pub destination: PathBuf,
    /// Public prefix prepended to every returned reference.
    #[serde(default)]
    pub web_path: String,
    /// Copy files individually instead of concatenating and transforming them.
    #[serde(default)]
    pub debug: bool,
    /// Extension of production artifacts.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Passed to the transform unmodified.
    #[serde(default)]
    pub transform: TransformOptions,
    #[serde(default)]
    pub namespaces: NamespaceConfig,
    /// Groups compacted by the command line tool and the service layer.
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl CompactConfig {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        CompactConfig {
            source: source.into(),
            destination: destination.into(),
            web_path: String::new(),
            debug: false,
            extension: default_extension(),
            transform: TransformOptions::new(),
            namespaces: NamespaceConfig::new(),
            groups: Vec::new(),
        }
    }

    pub fn with_web_path(mut self, web_path: impl Into<String>) -> Self {
        self.web_path = web_path.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_transform_options(mut self, options: TransformOptions) -> Self {
        self.transform = options;
        self
    }

    /// Read a configuration file. Relative directories are taken relative to the file's
    /// directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CompactError> {
        let path = path.as_ref();
        tracing::debug!("Reading configuration from {:?}", path);
        let content = read_to_string(path).map_err(|e| {
            CompactError::Config(format!("could not read {}: {e}", path.display()))
        })?;
        let mut config: CompactConfig = toml::from_str(&content)?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        Ok(config)
    }

    fn rebase(&mut self, base: &Path) {
        self.source = base.join(&self.source);
        self.destination = base.join(&self.destination);
        for spec in self.namespaces.values_mut() {
            if let NamespaceSpec::Sourced { source, .. } = spec {
                *source = base.join(&*source);
            }
        }
    }
}

/// One namespace declaration: a bare list of entries, or a list with an override directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NamespaceSpec {
    Entries(Vec<String>),
    Sourced {
        source: PathBuf,
        #[serde(default)]
        files: Vec<String>,
    },
}

impl NamespaceSpec {
    pub fn entries(&self) -> &[String] {
        match self {
            NamespaceSpec::Entries(entries) => entries,
            NamespaceSpec::Sourced { files, .. } => files,
        }
    }

    pub fn source(&self) -> Option<&Path> {
        match self {
            NamespaceSpec::Entries(_) => None,
            NamespaceSpec::Sourced { source, .. } => Some(source),
        }
    }
}

pub type NamespaceConfig = BTreeMap<String, NamespaceSpec>;

/// Parse a TOML table of namespace declarations.
pub fn parse_namespaces(text: &str) -> Result<NamespaceConfig, CompactError> {
    Ok(toml::from_str(text)?)
}

/// Register every declared namespace in `registry`.
///
/// Namespaces referenced by another declaration are registered first, so forward references
/// work regardless of table order. The table is applied as a whole: on any error (a cycle, an
/// unresolvable file, a duplicate name) `registry` is left exactly as it was.
pub fn apply_namespaces(
    registry: &mut Registry,
    config: &NamespaceConfig,
) -> Result<(), CompactError> {
    for name in config.keys() {
        if registry.contains(name) {
            return Err(CompactError::AlreadyExists(name.clone()));
        }
    }
    let order = registration_order(config)?;

    let mut staged = registry.clone();
    register_in_order(&mut staged, config, &order)?;
    *registry = staged;
    Ok(())
}

fn register_in_order(
    registry: &mut Registry,
    config: &NamespaceConfig,
    order: &[&str],
) -> Result<(), CompactError> {
    for &name in order {
        let spec = &config[name];
        let mut inlined = HashMap::<&str, Vec<PathBuf>>::new();
        for entry in spec.entries() {
            if registry.contains(entry) && !inlined.contains_key(entry.as_str()) {
                inlined.insert(entry.as_str(), registry.get(entry)?.files().to_vec());
            }
        }

        let mut handle = match spec.source() {
            Some(dir) => registry.register_with_source(name, dir)?,
            None => registry.register(name)?,
        };
        for entry in spec.entries() {
            handle = match inlined.get(entry.as_str()) {
                Some(paths) => handle.extend_resolved(paths.iter().cloned()),
                None => handle.add_file(entry)?,
            };
        }
        tracing::debug!(
            "[Config] namespace '{}' holds {} file(s)",
            name,
            handle.files().len()
        );
    }
    Ok(())
}

fn registration_order(config: &NamespaceConfig) -> Result<Vec<&str>, CompactError> {
    fn visit<'a>(
        name: &'a str,
        config: &'a NamespaceConfig,
        stack: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
        order: &mut Vec<&'a str>,
    ) -> Result<(), CompactError> {
        if done.contains(name) {
            return Ok(());
        }
        if let Some(pos) = stack.iter().position(|n| *n == name) {
            let mut cycle = stack[pos..].to_vec();
            cycle.push(name);
            return Err(CompactError::Config(format!(
                "namespace inlining cycle: {}",
                cycle.join(" -> ")
            )));
        }
        stack.push(name);
        if let Some(spec) = config.get(name) {
            for entry in spec.entries() {
                if let Some((dep, _)) = config.get_key_value(entry.as_str()) {
                    visit(dep, config, stack, done, order)?;
                }
            }
        }
        stack.pop();
        done.insert(name);
        order.push(name);
        Ok(())
    }

    let mut stack = Vec::new();
    let mut done = HashSet::new();
    let mut order = Vec::with_capacity(config.len());
    for name in config.keys() {
        visit(name, config, &mut stack, &mut done, &mut order)?;
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use test_log::test;

    fn source_with(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), format!("// {file}")).unwrap();
        }
        dir
    }

    fn base_names(registry: &Registry, name: &str) -> Vec<String> {
        registry
            .get(name)
            .unwrap()
            .files()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_inline_namespaces_in_declared_position() {
        let src = source_with(&["a.js", "b.js", "c.js"]);
        let config = parse_namespaces(
            r#"
            test = ["prepend", "c.js", "append"]
            prepend = ["a.js"]
            append = ["b.js"]
            "#,
        )
        .unwrap();

        let mut registry = Registry::new(src.path());
        apply_namespaces(&mut registry, &config).unwrap();

        assert_eq!(base_names(&registry, "test"), vec!["a.js", "c.js", "b.js"]);
        assert_eq!(base_names(&registry, "prepend"), vec!["a.js"]);
        // Dependencies are registered before the namespaces inlining them.
        let listed = registry.list();
        let pos = |n: &str| listed.iter().position(|l| *l == n).unwrap();
        assert!(pos("prepend") < pos("test"));
        assert!(pos("append") < pos("test"));
    }

    #[test]
    fn test_nested_forward_references() {
        let src = source_with(&["a.js", "b.js", "c.js"]);
        let config = parse_namespaces(
            r#"
            all = ["middle", "c.js"]
            middle = ["base", "b.js"]
            base = ["a.js"]
            "#,
        )
        .unwrap();
        let mut registry = Registry::new(src.path());
        apply_namespaces(&mut registry, &config).unwrap();
        assert_eq!(base_names(&registry, "all"), vec!["a.js", "b.js", "c.js"]);
    }

    #[test]
    fn test_cycle_is_rejected_before_registration() {
        let src = source_with(&["a.js"]);
        let config = parse_namespaces(
            r#"
            one = ["two", "a.js"]
            two = ["one"]
            "#,
        )
        .unwrap();
        let mut registry = Registry::new(src.path());
        let err = apply_namespaces(&mut registry, &config).unwrap_err();
        assert!(
            matches!(&err, CompactError::Config(msg) if msg.contains("one -> two -> one")),
            "unexpected error: {err}"
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn test_sourced_namespace_uses_override_dir() {
        let src = source_with(&["a.js"]);
        let alt = source_with(&["a.js", "d.js"]);
        let mut config = NamespaceConfig::new();
        config.insert(
            "alternative".to_string(),
            NamespaceSpec::Sourced {
                source: alt.path().to_path_buf(),
                files: vec!["a.js".to_string(), "d.js".to_string()],
            },
        );
        let mut registry = Registry::new(src.path());
        apply_namespaces(&mut registry, &config).unwrap();

        let files = registry.get("alternative").unwrap().files().to_vec();
        let alt_root = alt.path().canonicalize().unwrap();
        assert!(files.iter().all(|f| f.starts_with(&alt_root)));
    }

    #[test]
    fn test_missing_file_fails_configuration() {
        let src = source_with(&["a.js"]);
        let config = parse_namespaces(r#"global = ["a.js", "nope.js"]"#).unwrap();
        let mut registry = Registry::new(src.path());
        assert_eq!(
            apply_namespaces(&mut registry, &config).unwrap_err(),
            CompactError::NotFound("nope.js".to_string())
        );
    }

    #[test]
    fn test_failed_configuration_registers_nothing() {
        let src = source_with(&["a.js", "b.js"]);
        let mut registry = Registry::new(src.path());
        registry.register("existing").unwrap().add_file("a.js").unwrap();

        let broken = parse_namespaces(
            r#"
            base = ["a.js"]
            page = ["base", "nope.js"]
            "#,
        )
        .unwrap();
        assert_eq!(
            apply_namespaces(&mut registry, &broken).unwrap_err(),
            CompactError::NotFound("nope.js".to_string())
        );
        assert_eq!(registry.list(), vec!["existing"]);

        let fixed = parse_namespaces(
            r#"
            base = ["a.js"]
            page = ["base", "b.js"]
            "#,
        )
        .unwrap();
        apply_namespaces(&mut registry, &fixed).unwrap();
        assert_eq!(registry.list(), vec!["existing", "base", "page"]);
        assert_eq!(base_names(&registry, "page"), vec!["a.js", "b.js"]);
    }

    #[test]
    fn test_non_table_configuration_is_rejected() {
        assert!(matches!(
            parse_namespaces(r#"global = "a.js""#),
            Err(CompactError::Serialization(_))
        ));
        assert!(parse_namespaces("not toml at all [").is_err());
    }

    #[test]
    fn test_config_file_paths_are_relative_to_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("compact.toml");
        std::fs::write(
            &config_path,
            r#"
source = "assets"
destination = "public/js"
web_path = "/js"
groups = [["global", "profile"], ["blog"]]

[transform]
mangle = false

[namespaces]
global = ["a.js"]
alternative = { source = "assets-alt", files = ["a.js"] }
"#,
        )
        .unwrap();

        let config = CompactConfig::from_file(&config_path).unwrap();
        assert_eq!(config.source, dir.path().join("assets"));
        assert_eq!(config.destination, dir.path().join("public/js"));
        assert_eq!(config.web_path, "/js");
        assert!(!config.debug);
        assert_eq!(config.extension, "js");
        assert_eq!(config.groups.len(), 2);
        assert_eq!(config.groups[0].key(), "global-profile");
        assert_eq!(
            config.namespaces["alternative"].source(),
            Some(dir.path().join("assets-alt").as_path())
        );
        assert_eq!(
            config.transform.get("mangle").and_then(toml::Value::as_bool),
            Some(false)
        );
    }
}
