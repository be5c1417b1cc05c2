//! Whole-file transcode cache.
//!
//! A transcode is current when the catalog's stored signature for its quality
//! matches the source's signature and the output file exists. Stale or
//! missing outputs are regenerated under the generation registry and the new
//! signature is written back.

use std::path::{Path, PathBuf};

use tc_av::TranscodeJob;
use tc_core::{AssetId, GenerationKey, MediaAsset, Result, TranscodeQuality};
use tokio::task::JoinHandle;

use crate::engine::StreamEngine;

fn is_current(asset: &MediaAsset, quality: TranscodeQuality, output: &Path) -> bool {
    asset.transcode_signature_current(quality) && output.exists()
}

fn partial_path(output: &Path) -> PathBuf {
    let mut name = output.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

impl StreamEngine {
    /// Return the path of an up-to-date transcode, generating it if needed.
    ///
    /// Runs inside the caller's future; dropping it kills the encoder.
    pub async fn ensure_transcoded(
        &self,
        asset_id: AssetId,
        quality: TranscodeQuality,
    ) -> Result<PathBuf> {
        let asset = self.catalog.get_asset(asset_id).await?;
        let output = self.layout.transcode_output(asset_id, quality);
        if is_current(&asset, quality, &output) {
            tracing::debug!(asset_id = %asset_id, quality = %quality, "Transcode is current");
            return Ok(output);
        }

        let key = GenerationKey::transcode(asset_id, quality);
        self.registry
            .run_exclusive(key, move |_| self.generate_transcode(asset_id, quality))
            .await?;
        Ok(output)
    }

    async fn generate_transcode(&self, asset_id: AssetId, quality: TranscodeQuality) -> Result<()> {
        // Re-read: a previous leader may have finished while we queued.
        let asset = self.catalog.get_asset(asset_id).await?;
        let output = self.layout.transcode_output(asset_id, quality);
        if is_current(&asset, quality, &output) {
            return Ok(());
        }

        tokio::fs::create_dir_all(self.layout.transcode_dir(asset_id)).await?;
        let partial = partial_path(&output);
        let job = TranscodeJob {
            source: asset.source_path.clone(),
            output: partial.clone(),
            quality,
        };

        let cancel = self.shutdown.child_token();
        if let Err(e) = self.encoder.transcode(&job, &cancel).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
        tokio::fs::rename(&partial, &output).await?;

        if let Err(e) = self
            .catalog
            .update_rendition_signature(asset_id, quality, &asset.file_signature)
            .await
        {
            tracing::warn!(
                asset_id = %asset_id,
                quality = %quality,
                error = %e,
                "Failed to record transcode signature"
            );
        }
        Ok(())
    }

    /// Generate a transcode in the background.
    ///
    /// Soft failures are expected here (shutdown, killed encoder) and only
    /// logged at debug.
    pub fn prefetch_transcode(&self, asset_id: AssetId, quality: TranscodeQuality) -> JoinHandle<()> {
        let engine = self.clone();
        tokio::spawn(async move {
            match engine.ensure_transcoded(asset_id, quality).await {
                Ok(path) => {
                    tracing::debug!(asset_id = %asset_id, quality = %quality, path = %path.display(), "Prefetched transcode");
                }
                Err(e) if e.is_soft() => {
                    tracing::debug!(asset_id = %asset_id, quality = %quality, error = %e, "Prefetch stopped early");
                }
                Err(e) => {
                    tracing::error!(asset_id = %asset_id, quality = %quality, error = %e, "Prefetch failed");
                }
            }
        })
    }
}
