//! Rust structs mapping to database tables.

use std::path::PathBuf;

use tc_core::{AssetId, MediaAsset, RenditionSignatures};

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// One row of the `assets` table.
#[derive(Debug, Clone)]
pub struct AssetRow {
    pub id: i64,
    pub source_path: String,
    pub file_signature: String,
    pub sig_low: Option<String>,
    pub sig_medium: Option<String>,
    pub sig_high: Option<String>,
    pub created_at: String,
}

impl AssetRow {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            source_path: row.get(1)?,
            file_signature: row.get(2)?,
            sig_low: row.get(3)?,
            sig_medium: row.get(4)?,
            sig_high: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    /// Convert to the engine's view of the asset.
    pub fn into_media_asset(self) -> tc_core::Result<MediaAsset> {
        Ok(MediaAsset {
            id: AssetId::new(self.id)?,
            source_path: PathBuf::from(self.source_path),
            file_signature: self.file_signature,
            rendition_signatures: RenditionSignatures {
                low: self.sig_low,
                medium: self.sig_medium,
                high: self.sig_high,
            },
        })
    }
}
