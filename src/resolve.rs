//! Lookup of logical file references across an ordered list of base directories.

use crate::error::CompactError;
use std::path::{Path, PathBuf};

/// Ordered candidate base directories for one namespace.
///
/// Priority is fixed: the namespace's own override directory (when supplied), then the global
/// source root, then the reference taken literally as a path. The first candidate that names an
/// existing file wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionChain {
    bases: Vec<PathBuf>,
}

impl ResolutionChain {
    pub fn new(source_root: &Path, override_dir: Option<&Path>) -> Self {
        let mut bases = Vec::with_capacity(2);
        if let Some(dir) = override_dir {
            bases.push(dir.to_path_buf());
        }
        bases.push(source_root.to_path_buf());
        ResolutionChain { bases }
    }

    /// The override directory this chain was built with, if any.
    pub fn override_dir(&self) -> Option<&Path> {
        if self.bases.len() > 1 {
            self.bases.first().map(PathBuf::as_path)
        } else {
            None
        }
    }

    /// Every path `reference` could name, in priority order.
    ///
    /// References are joined beneath each base even when written with a leading separator, so
    /// `/a.js` and `a.js` address the same source file. The final candidate is the raw reference.
    pub fn candidates(&self, reference: &str) -> Vec<PathBuf> {
        let relative = reference.trim_start_matches(['/', '\\']);
        let mut candidates = self
            .bases
            .iter()
            .map(|base| base.join(relative))
            .collect::<Vec<PathBuf>>();
        candidates.push(PathBuf::from(reference));
        candidates
    }

    /// Resolve `reference` to the absolute path of the first existing candidate.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf, CompactError> {
        if reference.is_empty() {
            return Err(CompactError::NotFound(reference.to_string()));
        }
        let found = self
            .candidates(reference)
            .into_iter()
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| CompactError::NotFound(reference.to_string()))?;
        let absolute = found.canonicalize()?;
        tracing::debug!("Resolved '{}' to {:?}", reference, absolute);
        Ok(absolute)
    }
}
