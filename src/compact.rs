//! Turning groups of namespaces into output artifacts.
//!
//! [`Compact`] owns the namespace [`Registry`] and the production [`GroupCache`]. It is built once
//! at startup, populated through `&mut self`, then shared (usually behind an `Arc`) and driven
//! through `&self` for every compaction.
//!
//! ## Modes
//!
//! - **Production**: the group's files are read concurrently, joined in group-then-insertion
//!   order with a statement separator, run through the [`Transform`], and written to
//!   `<ns1>-<ns2>-...<nsN>.<ext>`. The resulting reference is cached for the process lifetime
//!   under the group's identity key, so the transform runs at most once per distinct group.
//! - **Debug**: every file of the group is copied verbatim to `<hash>-<basename>` and one
//!   reference per file is returned. Nothing is cached; every call sees current sources.

use crate::{
    cache::GroupCache,
    config::{apply_namespaces, parse_namespaces, CompactConfig, NamespaceConfig},
    error::CompactError,
    group::{debug_filename, web_reference, Group},
    namespace::{NamespaceMut, Registry},
    transform::{Identity, Transform, TransformOptions},
};
use futures::future::try_join_all;
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

/// Placed between concatenated files so sources without a trailing terminator do not run
/// together.
pub const STATEMENT_SEPARATOR: &str = ";\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Production,
    Debug,
}

/// Work performed by a [`Compact`] since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompactStats {
    /// Production artifacts written (one per transform run that succeeded).
    pub bundles_written: usize,
    /// Source files copied in debug mode.
    pub files_copied: usize,
}

pub struct Compact {
    destination: PathBuf,
    web_path: String,
    extension: String,
    mode: Mode,
    options: TransformOptions,
    transform: Arc<dyn Transform>,
    registry: Registry,
    cache: GroupCache,
    bundles_written: AtomicUsize,
    files_copied: AtomicUsize,
}

impl std::fmt::Debug for Compact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compact")
            .field("source", &self.registry.source_root())
            .field("destination", &self.destination)
            .field("web_path", &self.web_path)
            .field("mode", &self.mode)
            .field("namespaces", &self.registry.list())
            .finish()
    }
}

impl Compact {
    /// Validate the source root, create the destination when missing, and register any
    /// namespaces declared in `config`.
    pub fn new(config: CompactConfig) -> Result<Self, CompactError> {
        if !config.source.is_dir() {
            return Err(CompactError::InvalidSource(
                config.source.display().to_string(),
            ));
        }
        let source = config
            .source
            .canonicalize()
            .map_err(|_| CompactError::InvalidSource(config.source.display().to_string()))?;

        if !config.destination.is_dir() {
            tracing::info!("Creating destination directory {:?}", config.destination);
            std::fs::create_dir_all(&config.destination).map_err(|e| {
                CompactError::InvalidDestination(format!(
                    "{}: {e}",
                    config.destination.display()
                ))
            })?;
        }

        let mut compact = Compact {
            destination: config.destination,
            web_path: config.web_path,
            extension: config.extension,
            mode: if config.debug {
                Mode::Debug
            } else {
                Mode::Production
            },
            options: config.transform,
            transform: Arc::new(Identity),
            registry: Registry::new(source),
            cache: GroupCache::new(),
            bundles_written: AtomicUsize::new(0),
            files_copied: AtomicUsize::new(0),
        };
        compact.configure(&config.namespaces)?;
        Ok(compact)
    }

    /// Replace the transform applied to production bundles.
    pub fn with_transform<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transform = Arc::new(transform);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_debug(&self) -> bool {
        self.mode == Mode::Debug
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn web_path(&self) -> &str {
        &self.web_path
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn add_namespace(&mut self, name: &str) -> Result<NamespaceMut<'_>, CompactError> {
        self.registry.register(name)
    }

    /// Register `name` with a directory searched before the global source root.
    pub fn add_namespace_with_source(
        &mut self,
        name: &str,
        source: impl AsRef<Path>,
    ) -> Result<NamespaceMut<'_>, CompactError> {
        self.registry.register_with_source(name, source)
    }

    /// Chainable handle to a namespace registered earlier.
    pub fn namespace_mut(&mut self, name: &str) -> Result<NamespaceMut<'_>, CompactError> {
        self.registry.get_mut(name)
    }

    pub fn configure(&mut self, namespaces: &NamespaceConfig) -> Result<(), CompactError> {
        apply_namespaces(&mut self.registry, namespaces)
    }

    /// Register namespaces from a TOML table of declarations.
    pub fn configure_str(&mut self, text: &str) -> Result<(), CompactError> {
        let namespaces = parse_namespaces(text)?;
        self.configure(&namespaces)
    }

    /// True once a production artifact for `group` has been written and cached.
    pub fn is_cached(&self, group: &Group) -> bool {
        self.cache.contains(&group.key())
    }

    pub fn stats(&self) -> CompactStats {
        CompactStats {
            bundles_written: self.bundles_written.load(Ordering::Relaxed),
            files_copied: self.files_copied.load(Ordering::Relaxed),
        }
    }

    /// Compact `group` in the configured mode.
    pub async fn compact_group(&self, group: &Group) -> Result<Vec<String>, CompactError> {
        self.compact(group, self.mode).await
    }

    /// Compact `group` into its output references.
    ///
    /// Every namespace is checked before any I/O; an unknown name fails the whole group and
    /// nothing is written or cached.
    pub async fn compact(&self, group: &Group, mode: Mode) -> Result<Vec<String>, CompactError> {
        self.registry.validate(group.names())?;
        if group.is_empty() {
            return Ok(Vec::new());
        }
        let result = match mode {
            Mode::Production => {
                self.cache
                    .get_or_try_init(&group.key(), || self.write_bundle(group))
                    .await
            }
            Mode::Debug => match self.registry.collect_files(group.names()) {
                Ok(files) => self.copy_files(&files).await,
                Err(e) => Err(e),
            },
        };
        if let Err(e) = &result {
            tracing::warn!("[Compact] group {} failed: {}", group, e);
        }
        result
    }

    /// Compact several groups for one caller, in the configured mode.
    ///
    /// Every namespace of every group is checked before any I/O. References come back in group
    /// order, each listed once at its first position. In debug mode a namespace or file shared by
    /// several groups is copied once for the whole call.
    pub async fn compact_groups(&self, groups: &[&Group]) -> Result<Vec<String>, CompactError> {
        for group in groups {
            self.registry.validate(group.names())?;
        }
        let references = match self.mode {
            Mode::Production => try_join_all(groups.iter().map(|group| self.compact_group(group)))
                .await?
                .into_iter()
                .flatten()
                .collect::<Vec<String>>(),
            Mode::Debug => {
                let names = groups
                    .iter()
                    .flat_map(|group| group.names())
                    .collect::<Vec<&String>>();
                let files = self.registry.collect_files(&names)?;
                self.copy_files(&files).await.inspect_err(|e| {
                    tracing::warn!("[Compact] debug copy of {} group(s) failed: {}", groups.len(), e)
                })?
            }
        };

        let mut seen = HashSet::new();
        Ok(references
            .into_iter()
            .filter(|reference| seen.insert(reference.clone()))
            .collect())
    }

    async fn write_bundle(&self, group: &Group) -> Result<Vec<String>, CompactError> {
        let files = self.registry.collect_files(group.names())?;
        let contents = try_join_all(files.iter().map(|path| read_source(path))).await?;
        let joined = contents.join(STATEMENT_SEPARATOR);

        let transform = self.transform.clone();
        let options = self.options.clone();
        let output =
            tokio::task::spawn_blocking(move || transform.transform(&joined, &options)).await??;

        let filename = group.production_filename(&self.extension);
        write_atomic(&self.destination, &filename, output).await?;
        self.bundles_written.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            "[Compact] wrote {} from {} file(s) for group {}",
            filename,
            files.len(),
            group
        );
        Ok(vec![web_reference(&self.web_path, &filename)])
    }

    async fn copy_files(&self, files: &[PathBuf]) -> Result<Vec<String>, CompactError> {
        let copies = files.iter().map(|path| async move {
            let filename = debug_filename(path);
            copy_atomic(path, &self.destination, &filename).await?;
            self.files_copied.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("[Compact] copied {:?} to {}", path, filename);
            Ok::<String, CompactError>(web_reference(&self.web_path, &filename))
        });
        try_join_all(copies).await
    }
}

async fn read_source(path: &Path) -> Result<String, CompactError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CompactError::Io(format!("read {}: {e}", path.display())))
}

static STAGING_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Unique sibling of `filename` in `dir`, so concurrent writers never share a staging file.
fn staging_path(dir: &Path, filename: &str) -> PathBuf {
    let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
    dir.join(format!(".{filename}.{}-{seq}.partial", std::process::id()))
}

/// Write to a temporary sibling and rename it into place, so a reader never sees a partial
/// artifact.
async fn write_atomic(dir: &Path, filename: &str, contents: String) -> Result<(), CompactError> {
    let staging = staging_path(dir, filename);
    tokio::fs::write(&staging, contents)
        .await
        .map_err(|e| CompactError::Io(format!("write {}: {e}", staging.display())))?;
    rename_into_place(&staging, &dir.join(filename)).await
}

/// Copy counterpart of [`write_atomic`].
async fn copy_atomic(source: &Path, dir: &Path, filename: &str) -> Result<(), CompactError> {
    let staging = staging_path(dir, filename);
    if let Err(e) = tokio::fs::copy(source, &staging).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(CompactError::Io(format!("copy {}: {e}", source.display())));
    }
    rename_into_place(&staging, &dir.join(filename)).await
}

async fn rename_into_place(staging: &Path, target: &Path) -> Result<(), CompactError> {
    if let Err(e) = tokio::fs::rename(staging, target).await {
        let _ = tokio::fs::remove_file(staging).await;
        return Err(CompactError::Io(format!(
            "rename {} into place: {e}",
            target.display()
        )));
    }
    Ok(())
}
