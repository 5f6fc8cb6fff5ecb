//! JSON fixture loader.
//!
//! Golden files live under `fixtures/` at the workspace root (for example
//! backup snapshots written by earlier releases).

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;

pub struct Fixture;

impl Fixture {
    /// Workspace root: the nearest ancestor of this crate holding the
    /// top-level `Cargo.toml` with a `[workspace]` table.
    pub fn workspace_root() -> PathBuf {
        let crate_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        crate_dir
            .ancestors()
            .find(|dir| {
                std::fs::read_to_string(dir.join("Cargo.toml"))
                    .map(|manifest| manifest.contains("[workspace]"))
                    .unwrap_or(false)
            })
            .unwrap_or(crate_dir)
            .to_path_buf()
    }

    /// Load and parse a fixture JSON file at `workspace_root/relative_path`.
    ///
    /// Panics if the file is missing or invalid JSON.
    pub fn load(relative_path: &str) -> Value {
        Self::load_as(relative_path)
    }

    /// Load a fixture and deserialize it into `T`.
    ///
    /// Panics if the file is missing or does not match `T`.
    pub fn load_as<T: DeserializeOwned>(relative_path: &str) -> T {
        let full_path = Self::workspace_root().join(relative_path);
        let contents = std::fs::read_to_string(&full_path)
            .unwrap_or_else(|e| panic!("fixture not found at {}: {e}", full_path.display()));
        serde_json::from_str(&contents)
            .unwrap_or_else(|e| panic!("invalid fixture {relative_path}: {e}"))
    }
}
