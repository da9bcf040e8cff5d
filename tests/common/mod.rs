//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times. Subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Create a project directory with `assets/`, `assets-alt/` and a `compact.toml` using
/// relative paths.
///
/// Returns the path to the configuration file. The destination `public/js` does not exist yet.
#[allow(dead_code)]
pub fn create_test_project(temp_dir: &TempDir) -> PathBuf {
    let root = temp_dir.path();
    write(root, "assets/a.js", "var a = 1");
    write(root, "assets/b.js", "var b = 2;");
    write(root, "assets/c.js", "function c() { return 3; }");
    write(root, "assets/vendor/jquery.js", "var $ = {};");
    write(root, "assets-alt/a.js", "var a = 'alternative'");

    let config = r#"
source = "assets"
destination = "public/js"
web_path = "/js"
groups = [["global", "profile"], ["blog"]]

[namespaces]
vendor = ["vendor/jquery.js"]
global = ["vendor", "a.js"]
profile = ["c.js"]
blog = ["b.js", "c.js"]
alternative = { source = "assets-alt", files = ["a.js", "b.js"] }
"#;
    let path = root.join("compact.toml");
    std::fs::write(&path, config).unwrap();
    path
}
