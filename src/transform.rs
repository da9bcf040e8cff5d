//! The content transform applied to a production bundle (minification, compression, ...).
//!
//! The compaction cache treats the transform as opaque: it hands over the concatenated text and
//! the configured [`TransformOptions`] untouched, and propagates whatever error comes back.

use crate::error::CompactError;

/// Opaque option bag passed through to the transform. Recognized keys are up to the transform
/// (for example `mangle = false`).
pub type TransformOptions = toml::Table;

pub trait Transform: Send + Sync {
    fn transform(&self, source: &str, options: &TransformOptions) -> Result<String, CompactError>;
}

impl<F> Transform for F
where
    F: Fn(&str, &TransformOptions) -> Result<String, CompactError> + Send + Sync,
{
    fn transform(&self, source: &str, options: &TransformOptions) -> Result<String, CompactError> {
        self(source, options)
    }
}

/// Returns the source unchanged. The default when no transform is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl Transform for Identity {
    fn transform(&self, source: &str, _options: &TransformOptions) -> Result<String, CompactError> {
        Ok(source.to_string())
    }
}

/// Reads a boolean option, falling back to `default` when the key is absent or not a boolean.
pub fn bool_option(options: &TransformOptions, key: &str, default: bool) -> bool {
    options
        .get(key)
        .and_then(toml::Value::as_bool)
        .unwrap_or(default)
}
