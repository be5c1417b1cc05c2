//! On-the-fly transcodes piped straight to the client.
//!
//! Nothing is cached and no registry slot is taken: every request runs its
//! own encoder, which dies with the response.

use tc_av::{AudioReader, LiveJob};
use tc_core::{AssetId, Error, LiveQuality, Result};

use crate::engine::StreamEngine;

/// Encoder output for one live request.
pub struct LiveStream {
    pub content_type: &'static str,
    pub reader: AudioReader,
}

impl std::fmt::Debug for LiveStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveStream")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl StreamEngine {
    /// Start transcoding `asset_id` at `quality`, `offset_ms` into the track.
    ///
    /// The encoder is killed when the returned reader is dropped or the
    /// engine shuts down.
    pub async fn open_live(
        &self,
        asset_id: AssetId,
        quality: LiveQuality,
        offset_ms: u64,
    ) -> Result<LiveStream> {
        let asset = self.catalog.get_asset(asset_id).await?;
        if !tokio::fs::try_exists(&asset.source_path).await? {
            return Err(Error::not_found("source file", asset.source_path.display()));
        }

        let job = LiveJob {
            source: asset.source_path,
            quality,
            offset_ms,
        };
        let reader = self
            .encoder
            .stream(&job, &self.shutdown.child_token())
            .await?;

        tracing::debug!(asset_id = %asset_id, quality = %quality, offset_ms, "Live transcode started");
        Ok(LiveStream {
            content_type: quality.content_type(),
            reader,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::{harness, FakeEncoder};
    use std::sync::atomic::Ordering;
    use tc_core::Catalog;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn live_stream_reads_encoder_output() {
        let h = harness(FakeEncoder::new(1));
        let asset = h.catalog.get_asset(h.id).await.unwrap();
        std::fs::write(&asset.source_path, b"fLaC").unwrap();

        let mut live = h.engine.open_live(h.id, LiveQuality::Max, 42_000).await.unwrap();
        assert_eq!(live.content_type, "audio/flac");

        let mut body = String::new();
        live.reader.read_to_string(&mut body).await.unwrap();
        assert_eq!(body, "live max from 42000ms");
        assert_eq!(h.encoder.live_runs.load(Ordering::SeqCst), 1);
        assert!(h.engine.registry().is_empty());
    }

    #[tokio::test]
    async fn every_live_request_runs_its_own_encoder() {
        let h = harness(FakeEncoder::new(1));
        let asset = h.catalog.get_asset(h.id).await.unwrap();
        std::fs::write(&asset.source_path, b"fLaC").unwrap();

        for _ in 0..3 {
            h.engine.open_live(h.id, LiveQuality::Low, 0).await.unwrap();
        }
        assert_eq!(h.encoder.live_runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn missing_source_is_not_found() {
        let h = harness(FakeEncoder::new(1));
        let err = h.engine.open_live(h.id, LiveQuality::Low, 0).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(h.encoder.live_runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_asset_is_not_found() {
        let h = harness(FakeEncoder::new(1));
        let err = h
            .engine
            .open_live(AssetId::new(99).unwrap(), LiveQuality::High, 0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }
}
