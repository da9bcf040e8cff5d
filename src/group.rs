//! Groups of namespaces and the names of the artifacts compacted from them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::{
    fmt::{Display, Formatter},
    path::Path,
    str::FromStr,
};

use crate::error::CompactError;

/// Joins namespace names into a group's identity key and production filename.
pub const KEY_SEPARATOR: &str = "-";

/// Number of hex characters of the path digest used in debug filenames.
pub const SHORT_HASH_LEN: usize = 8;

/// An ordered list of namespace names requested together as one bundle.
///
/// Order is significant: it is the concatenation order and it determines the identity key, so
/// `[a, b]` and `[b, a]` are distinct groups with distinct artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Group(Vec<String>);

impl Group {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Group(names.into_iter().map(Into::into).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Identity key: the names joined in declared order.
    ///
    /// A name containing the separator can collide with a longer group (`["a-b"]` and
    /// `["a", "b"]` both map to `a-b`) and then shares its artifact.
    pub fn key(&self) -> String {
        self.0.join(KEY_SEPARATOR)
    }

    /// `<ns1>-<ns2>-...-<nsN>.<ext>`
    pub fn production_filename(&self, extension: &str) -> String {
        format!("{}.{}", self.key(), extension)
    }
}

impl<S: Into<String>> FromIterator<S> for Group {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Group::new(iter)
    }
}

impl From<Vec<String>> for Group {
    fn from(names: Vec<String>) -> Self {
        Group(names)
    }
}

impl From<&[&str]> for Group {
    fn from(names: &[&str]) -> Self {
        Group::new(names.iter().copied())
    }
}

impl Display for Group {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

/// Parses the comma separated form used on the command line: `global,profile`.
impl FromStr for Group {
    type Err = CompactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let names = s
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect::<Group>();
        if names.is_empty() && !s.trim().is_empty() {
            return Err(CompactError::InvalidNamespace);
        }
        Ok(names)
    }
}

/// True when `name` contains [`KEY_SEPARATOR`], so a group holding it can share its key (and
/// artifact) with a group of several namespaces.
pub fn is_key_ambiguous(name: &str) -> bool {
    name.contains(KEY_SEPARATOR)
}

/// Fixed-length hex digest of a file's absolute path.
pub fn short_hash(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(SHORT_HASH_LEN);
    encoded
}

/// `<shortHash(absolutePath)>-<baseName>`
///
/// Files sharing a base name but living in different directories get different names.
pub fn debug_filename(path: &Path) -> String {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("{}-{}", short_hash(path), base)
}

/// Prefix `filename` with the public path, collapsing repeated separators.
///
/// A scheme separator (`https://`) in the prefix is left intact.
pub fn web_reference(web_path: &str, filename: &str) -> String {
    let joined = format!("{web_path}/{filename}").replace('\\', "/");
    let (scheme, rest) = match joined.find("://") {
        Some(idx) => joined.split_at(idx + 3),
        None => ("", joined.as_str()),
    };
    let mut collapsed = String::with_capacity(joined.len());
    collapsed.push_str(scheme);
    let mut last_was_sep = scheme.ends_with('/');
    for c in rest.chars() {
        if c == '/' {
            if last_was_sep {
                continue;
            }
            last_was_sep = true;
        } else {
            last_was_sep = false;
        }
        collapsed.push(c);
    }
    collapsed
}
