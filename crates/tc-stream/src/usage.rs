//! Last-access tracking for adaptive asset directories.
//!
//! The mtime of `use.txt` is the last time anything in the directory was
//! served or generation started. The reaper reads it back.

use std::path::Path;
use std::time::SystemTime;

use tc_core::{AssetId, Result};

use crate::layout::{StorageLayout, USAGE_MARKER};

/// Create the asset directory if needed and bump the usage marker to now.
pub fn touch(layout: &StorageLayout, id: AssetId) -> Result<()> {
    let dir = layout.asset_dir(id);
    std::fs::create_dir_all(&dir)?;
    touch_file(&dir.join(USAGE_MARKER))
}

/// Create `path` if missing and set its mtime to now.
pub(crate) fn touch_file(path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    file.set_modified(SystemTime::now())?;
    Ok(())
}

/// Last recorded access for an asset directory, if it has a marker.
pub fn last_used(asset_dir: &Path) -> Option<SystemTime> {
    std::fs::metadata(asset_dir.join(USAGE_MARKER))
        .and_then(|m| m.modified())
        .ok()
}
