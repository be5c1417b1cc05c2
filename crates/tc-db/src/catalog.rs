//! [`Catalog`] implementation over the SQLite pool.
//!
//! rusqlite is blocking, so every call hops onto the blocking thread pool.

use async_trait::async_trait;
use tc_core::{AssetId, Catalog, Error, MediaAsset, Result, TranscodeQuality};

use crate::pool::{get_conn, DbPool};
use crate::queries::assets;

#[derive(Clone)]
pub struct SqliteCatalog {
    pool: DbPool,
}

impl SqliteCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Catalog for SqliteCatalog {
    async fn get_asset(&self, id: AssetId) -> Result<MediaAsset> {
        let pool = self.pool.clone();
        let row = tokio::task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            assets::get_asset(&conn, id)
        })
        .await
        .map_err(|e| Error::Internal(format!("spawn_blocking join error: {e}")))??;

        row.ok_or_else(|| Error::not_found("asset", id))?
            .into_media_asset()
    }

    async fn update_rendition_signature(
        &self,
        id: AssetId,
        quality: TranscodeQuality,
        signature: &str,
    ) -> Result<()> {
        let pool = self.pool.clone();
        let signature = signature.to_string();
        let updated = tokio::task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            assets::update_rendition_signature(&conn, id, quality, &signature)
        })
        .await
        .map_err(|e| Error::Internal(format!("spawn_blocking join error: {e}")))??;

        if updated {
            Ok(())
        } else {
            Err(Error::not_found("asset", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[tokio::test]
    async fn round_trip_through_catalog() {
        let pool = init_memory_pool().unwrap();
        let id = AssetId::new(42).unwrap();
        {
            let conn = pool.get().unwrap();
            assets::upsert_asset(&conn, id, "/music/x.flac", "sig").unwrap();
        }
        let catalog = SqliteCatalog::new(pool);

        let asset = catalog.get_asset(id).await.unwrap();
        assert_eq!(asset.source_path, std::path::PathBuf::from("/music/x.flac"));
        assert!(!asset.transcode_signature_current(TranscodeQuality::High));

        catalog
            .update_rendition_signature(id, TranscodeQuality::High, "sig")
            .await
            .unwrap();
        let asset = catalog.get_asset(id).await.unwrap();
        assert!(asset.transcode_signature_current(TranscodeQuality::High));
    }

    #[tokio::test]
    async fn missing_asset_is_not_found() {
        let catalog = SqliteCatalog::new(init_memory_pool().unwrap());
        let id = AssetId::new(1).unwrap();
        assert!(matches!(
            catalog.get_asset(id).await,
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(
            catalog
                .update_rendition_signature(id, TranscodeQuality::Low, "x")
                .await,
            Err(Error::NotFound { .. })
        ));
    }
}
