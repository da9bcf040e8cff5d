//! Named, ordered collections of resolved source files.
//!
//! A [`Registry`] owns every [`Namespace`]. Names are registered exactly once and namespaces only
//! grow through [`NamespaceMut::add_file`]; there is no way to replace a registered namespace.

use crate::{
    error::CompactError,
    group::{is_key_ambiguous, KEY_SEPARATOR},
    resolve::ResolutionChain,
};
use std::{
    collections::{HashMap, HashSet},
    ops::Deref,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    name: String,
    chain: ResolutionChain,
    files: Vec<PathBuf>,
}

impl Namespace {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved absolute paths, in concatenation order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn chain(&self) -> &ResolutionChain {
        &self.chain
    }
}

/// Chainable write handle to a registered namespace.
///
/// ```rust
/// # use compact_core::namespace::Registry;
/// # fn example(registry: &mut Registry) -> Result<(), compact_core::CompactError> {
/// registry.register("global")?.add_file("a.js")?.add_file("b.js")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct NamespaceMut<'a> {
    namespace: &'a mut Namespace,
}

impl<'a> NamespaceMut<'a> {
    /// Resolve `reference` through this namespace's chain and append it.
    ///
    /// Fails immediately with [`CompactError::NotFound`] when no candidate exists. Adding the same
    /// file twice is permitted; duplicates collapse when a group is compacted.
    pub fn add_file(self, reference: &str) -> Result<Self, CompactError> {
        let path = self.namespace.chain.resolve(reference)?;
        self.namespace.files.push(path);
        Ok(self)
    }

    /// Append paths that were already resolved elsewhere (e.g. inlined from another namespace).
    pub(crate) fn extend_resolved<I>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.namespace.files.extend(paths);
        self
    }
}

impl Deref for NamespaceMut<'_> {
    type Target = Namespace;

    fn deref(&self) -> &Namespace {
        self.namespace
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    source_root: PathBuf,
    namespaces: Vec<Namespace>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Registry {
            source_root: source_root.into(),
            namespaces: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Register `name`, resolving its files against the global source root.
    pub fn register(&mut self, name: &str) -> Result<NamespaceMut<'_>, CompactError> {
        self.insert(name, None)
    }

    /// Register `name` with an override directory searched before the global source root.
    pub fn register_with_source(
        &mut self,
        name: &str,
        override_dir: impl AsRef<Path>,
    ) -> Result<NamespaceMut<'_>, CompactError> {
        self.insert(name, Some(override_dir.as_ref()))
    }

    fn insert(
        &mut self,
        name: &str,
        override_dir: Option<&Path>,
    ) -> Result<NamespaceMut<'_>, CompactError> {
        validate_name(name)?;
        if is_key_ambiguous(name) {
            tracing::warn!(
                "Namespace '{}' contains the group key separator '{}'; a group of it shares its \
                 output with the group of its parts",
                name,
                KEY_SEPARATOR
            );
        }
        if self.index.contains_key(name) {
            return Err(CompactError::AlreadyExists(name.to_string()));
        }
        let namespace = Namespace {
            name: name.to_string(),
            chain: ResolutionChain::new(&self.source_root, override_dir),
            files: Vec::new(),
        };
        tracing::debug!("Registered namespace '{}'", name);
        let idx = self.namespaces.len();
        self.index.insert(name.to_string(), idx);
        self.namespaces.push(namespace);
        Ok(NamespaceMut {
            namespace: &mut self.namespaces[idx],
        })
    }

    pub fn get(&self, name: &str) -> Result<&Namespace, CompactError> {
        self.index
            .get(name)
            .map(|idx| &self.namespaces[*idx])
            .ok_or_else(|| CompactError::UnknownNamespace(name.to_string()))
    }

    /// Write handle for a namespace that is already registered.
    pub fn get_mut(&mut self, name: &str) -> Result<NamespaceMut<'_>, CompactError> {
        match self.index.get(name) {
            Some(idx) => Ok(NamespaceMut {
                namespace: &mut self.namespaces[*idx],
            }),
            None => Err(CompactError::UnknownNamespace(name.to_string())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn list(&self) -> Vec<&str> {
        self.namespaces.iter().map(Namespace::name).collect()
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Check that every name is registered, reporting the first one that is not.
    pub fn validate<S: AsRef<str>>(&self, names: &[S]) -> Result<(), CompactError> {
        for name in names {
            self.get(name.as_ref())?;
        }
        Ok(())
    }

    /// The files of `names` concatenated in order, keeping only the first occurrence of each path.
    pub fn collect_files<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<PathBuf>, CompactError> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();
        for name in names {
            for path in self.get(name.as_ref())?.files() {
                if seen.insert(path.clone()) {
                    files.push(path.clone());
                }
            }
        }
        Ok(files)
    }
}

/// Names become output filenames, so they must be non-empty single path components.
fn validate_name(name: &str) -> Result<(), CompactError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || name.contains(['/', '\\'])
        || name != trimmed
    {
        return Err(CompactError::InvalidNamespace);
    }
    Ok(())
}
