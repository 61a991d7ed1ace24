use std::fs;
use std::path::Path;

use crate::store::MemoryStore;

/// Read a store snapshot from `boards.json` in the given directory.
/// Returns `None` when the file is missing or malformed.
pub fn read_snapshot(dir: &Path) -> Option<MemoryStore> {
    let path = dir.join("boards.json");
    let content = fs::read_to_string(&path).ok()?;
    serde_json::from_str(&content).ok()
}

/// Write the whole store as one opaque JSON document.
pub fn write_snapshot(dir: &Path, store: &MemoryStore) -> Result<(), std::io::Error> {
    let path = dir.join("boards.json");
    let content = serde_json::to_string_pretty(store)?;
    fs::write(&path, content)
}
