use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use rowdock_core::Geometry;

/// Window layout for one data source: open table windows and where they sit.
///
/// Written on window open/close and gesture end, read once when the
/// workspace is reconstructed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSnapshot {
    pub version: u32,
    pub windows: BTreeMap<String, Geometry>,
}

impl LayoutSnapshot {
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Highest stacking index present, or 0 for an empty snapshot.
    pub fn max_z_index(&self) -> u64 {
        self.windows.values().map(|g| g.z_index).max().unwrap_or(0)
    }
}

/// Layout persistence, one JSON file per data source.
///
/// Data sources are identified by an opaque key (e.g. "user@host/db_name");
/// the key is hashed into the filename so any key shape is safe.
#[derive(Debug, Clone)]
pub struct LayoutStore {
    root: PathBuf,
}

impl LayoutStore {
    /// Store under the user config dir (`<config>/rowdock/layouts`).
    pub fn new() -> Self {
        let root = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rowdock")
            .join("layouts");
        Self { root }
    }

    /// Store rooted at an explicit directory (tests, portable installs).
    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    fn hash_key(source_key: &str) -> String {
        let mut hasher = DefaultHasher::new();
        source_key.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    fn file_for(&self, source_key: &str) -> PathBuf {
        self.root.join(format!("{}.json", Self::hash_key(source_key)))
    }

    /// Load the snapshot for a data source, if one was ever saved.
    pub fn load(&self, source_key: &str) -> Option<LayoutSnapshot> {
        let path = self.file_for(source_key);
        fs::read_to_string(&path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
    }

    /// Save the snapshot for a data source, creating the directory on first
    /// write.
    pub fn save(&self, source_key: &str, snapshot: &LayoutSnapshot) -> Result<(), String> {
        fs::create_dir_all(&self.root).map_err(|e| e.to_string())?;
        let json = serde_json::to_string_pretty(snapshot).map_err(|e| e.to_string())?;
        fs::write(self.file_for(source_key), json).map_err(|e| e.to_string())
    }

    /// Drop the persisted layout for a data source (session end).
    pub fn remove(&self, source_key: &str) -> Result<(), String> {
        let path = self.file_for(source_key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

impl Default for LayoutStore {
    fn default() -> Self {
        Self::new()
    }
}
