//! The narrow catalog contract the streaming engine consumes.
//!
//! The engine only ever looks assets up and writes back the signature a
//! whole-file transcode was produced from. Everything else about the catalog
//! (CRUD, search, metadata) lives elsewhere.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::ids::AssetId;
use crate::media::{MediaAsset, TranscodeQuality};
use crate::{Error, Result};

/// Asset lookup and signature write-back.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch an asset. Missing assets are [`Error::NotFound`].
    async fn get_asset(&self, id: AssetId) -> Result<MediaAsset>;

    /// Record that the transcode for `quality` was generated from `signature`.
    async fn update_rendition_signature(
        &self,
        id: AssetId,
        quality: TranscodeQuality,
        signature: &str,
    ) -> Result<()>;
}

/// In-memory catalog used by tests and embedders without a database.
#[derive(Default)]
pub struct MemoryCatalog {
    assets: RwLock<HashMap<AssetId, MediaAsset>>,
    writes: RwLock<Vec<(AssetId, TranscodeQuality, String)>>,
    fail_writes: RwLock<bool>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an asset.
    pub fn insert(&self, asset: MediaAsset) {
        self.assets.write().insert(asset.id, asset);
    }

    /// Every signature write-back seen so far, in order.
    pub fn writes(&self) -> Vec<(AssetId, TranscodeQuality, String)> {
        self.writes.read().clone()
    }

    /// Make subsequent write-backs fail with a database error.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.write() = fail;
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn get_asset(&self, id: AssetId) -> Result<MediaAsset> {
        self.assets
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found("asset", id))
    }

    async fn update_rendition_signature(
        &self,
        id: AssetId,
        quality: TranscodeQuality,
        signature: &str,
    ) -> Result<()> {
        if *self.fail_writes.read() {
            return Err(Error::database("write-back disabled"));
        }
        let mut assets = self.assets.write();
        let asset = assets
            .get_mut(&id)
            .ok_or_else(|| Error::not_found("asset", id))?;
        asset.rendition_signatures.set(quality, signature);
        self.writes
            .write()
            .push((id, quality, signature.to_string()));
        Ok(())
    }
}
