//! Shared test utilities: a source tree, an override tree and a destination directory

use crate::{compact::Compact, config::CompactConfig, group::Group};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const A_JS: &str = "var a = 1";
pub const B_JS: &str = "var b = 2;";
pub const C_JS: &str = "function c() { return 3; }";
pub const ALT_A_JS: &str = "var a = 'alternative'";
pub const ALT_D_JS: &str = "var d = 4";
pub const ALT_X_A_JS: &str = "var xa = 5";

/// Initialize logging for tests
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

/// Temporary `assets/`, `assets-alt/` and `tmp/` trees mirroring a typical project layout.
///
/// `assets/` holds a.js, b.js, c.js and large.js; `assets-alt/` holds its own a.js, d.js and
/// x/a.js. The destination starts empty.
pub struct Fixture {
    src: TempDir,
    alt: TempDir,
    dest: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        init_logging();
        let src = TempDir::new().unwrap();
        let alt = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();

        write(src.path(), "a.js", A_JS);
        write(src.path(), "b.js", B_JS);
        write(src.path(), "c.js", C_JS);
        let large = (0..500)
            .map(|i| format!("var v{i} = {i};"))
            .collect::<Vec<_>>()
            .join("\n");
        write(src.path(), "large.js", &large);

        write(alt.path(), "a.js", ALT_A_JS);
        write(alt.path(), "d.js", ALT_D_JS);
        write(alt.path(), "x/a.js", ALT_X_A_JS);

        Fixture { src, alt, dest }
    }

    pub fn src_path(&self) -> &Path {
        self.src.path()
    }

    pub fn alt_path(&self) -> &Path {
        self.alt.path()
    }

    pub fn dest_path(&self) -> &Path {
        self.dest.path()
    }

    pub fn config(&self, debug: bool) -> CompactConfig {
        CompactConfig::new(self.src_path(), self.dest_path()).with_debug(debug)
    }

    pub fn compact(&self, debug: bool) -> Compact {
        Compact::new(self.config(debug)).unwrap()
    }

    /// File names currently in the destination, sorted.
    pub fn dest_entries(&self) -> Vec<String> {
        let mut entries = std::fs::read_dir(self.dest_path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect::<Vec<_>>();
        entries.sort();
        entries
    }

    /// Absolute destination path of a returned reference, assuming an empty web path.
    pub fn dest_file(&self, reference: &str) -> PathBuf {
        self.dest_path().join(reference.trim_start_matches('/'))
    }
}

pub fn group(names: &[&str]) -> Group {
    Group::from(names)
}
