//! The streaming engine: generation coordination and the serving protocol.
//!
//! A request for an adaptive artifact triggers generation of the rendition
//! that contains it, then waits until the artifact is safe to read. The wait
//! wakes on encoder progress and on the generation's terminal state, with a
//! coarse fallback re-check for writers outside this process.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tc_av::{AudioProber, Encoder, ProgressFn, ProgressTick, VariantJob};
use tc_core::config::StreamingConfig;
use tc_core::{
    AdaptiveTarget, AssetId, Catalog, Error, GenerationKey, MediaAsset, Rendition, Result,
    StreamQuality, Variant,
};
use tc_hls::{build_manifest, build_master_manifest};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::layout::{Artifact, StorageLayout};
use crate::readiness::is_ready;
use crate::registry::{terminal_outcome, GenerationHandle, GenerationRegistry, Outcome, Slot};
use crate::usage;

/// Defaults used when the probe cannot describe the source.
const FALLBACK_CHANNELS: u32 = 2;
const FALLBACK_BITRATE: u64 = 0;

/// Tunables for generation and the readiness wait.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub segment_length_ms: u64,
    /// Upper bound on a readiness wait; `None` waits forever.
    pub ready_timeout: Option<Duration>,
    pub fallback_poll: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&StreamingConfig::default())
    }
}

impl EngineSettings {
    pub fn from_config(config: &StreamingConfig) -> Self {
        Self {
            segment_length_ms: config.segment_length_ms,
            ready_timeout: config.ready_timeout(),
            fallback_poll: config.fallback_poll(),
        }
    }
}

/// Bytes of a served artifact.
#[derive(Debug, Clone)]
pub struct ServedArtifact {
    pub path: PathBuf,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// Coordinates encoders, the on-disk layout and the catalog.
///
/// Cheap to clone; detached generations hold their own clone.
#[derive(Clone)]
pub struct StreamEngine {
    pub(crate) layout: Arc<StorageLayout>,
    pub(crate) catalog: Arc<dyn Catalog>,
    pub(crate) encoder: Arc<dyn Encoder>,
    pub(crate) prober: Arc<dyn AudioProber>,
    pub(crate) registry: GenerationRegistry,
    pub(crate) settings: EngineSettings,
    pub(crate) shutdown: CancellationToken,
}

impl StreamEngine {
    pub fn new(
        layout: StorageLayout,
        catalog: Arc<dyn Catalog>,
        encoder: Arc<dyn Encoder>,
        prober: Arc<dyn AudioProber>,
    ) -> Self {
        Self {
            layout: Arc::new(layout),
            catalog,
            encoder,
            prober,
            registry: GenerationRegistry::new(),
            settings: EngineSettings::default(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Token whose cancellation kills every encoder this engine starts.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn registry(&self) -> &GenerationRegistry {
        &self.registry
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    // -----------------------------------------------------------------------
    // Coordination
    // -----------------------------------------------------------------------

    /// Make sure the output for `key` exists, running the encoder at most
    /// once across all concurrent callers.
    pub async fn ensure_generating(&self, key: GenerationKey) -> Result<()> {
        match key.rendition {
            Rendition::Transcode(quality) => self
                .ensure_transcoded(key.asset_id, quality)
                .await
                .map(|_| ()),
            Rendition::Adaptive(target) => {
                let asset = self.catalog.get_asset(key.asset_id).await?;
                match target {
                    AdaptiveTarget::Master => {
                        let asset = &asset;
                        self.registry
                            .run_exclusive(key, move |_| self.generate_all(asset))
                            .await
                    }
                    AdaptiveTarget::Variant(variant) => self.ensure_variant(&asset, variant).await,
                }
            }
        }
    }

    /// Generate one variant under its registry slot.
    pub async fn ensure_variant(&self, asset: &MediaAsset, variant: Variant) -> Result<()> {
        let key = GenerationKey::variant(asset.id, variant);
        self.registry
            .run_exclusive(key, move |handle| self.generate_variant(asset, variant, handle))
            .await
    }

    /// Write the master manifest, then generate all four variants
    /// concurrently. Finished siblings stay valid when one fails.
    async fn generate_all(&self, asset: &MediaAsset) -> Result<()> {
        self.write_master_if_absent(asset).await?;

        let results = join_all(
            Variant::ALL
                .into_iter()
                .map(|variant| self.ensure_variant(asset, variant)),
        )
        .await;

        results.into_iter().collect::<Result<Vec<_>>>().map(|_| ())
    }

    async fn generate_variant(
        &self,
        asset: &MediaAsset,
        variant: Variant,
        handle: GenerationHandle,
    ) -> Result<()> {
        let id = asset.id;
        let marker = self.layout.completion_marker(id, variant);
        if marker.exists() {
            tracing::debug!(asset_id = %id, variant = %variant, "Variant already complete");
            return Ok(());
        }

        usage::touch(&self.layout, id)?;
        usage::touch_file(&self.layout.started_marker(id, variant))?;

        let manifest = self.layout.variant_manifest(id, variant);
        if !manifest.exists() {
            let info = self.prober.probe(&asset.source_path).await?;
            let text = build_manifest(
                info.duration_ms,
                self.settings.segment_length_ms,
                variant.stem(),
            )?;
            write_atomic(&manifest, text.as_bytes())?;
            tracing::debug!(
                asset_id = %id,
                variant = %variant,
                duration_ms = info.duration_ms,
                "Published variant manifest"
            );
        }

        let job = VariantJob {
            source: asset.source_path.clone(),
            output_dir: self.layout.asset_dir(id),
            variant,
            segment_length_ms: self.settings.segment_length_ms,
        };
        let progress: ProgressFn = Arc::new(move |_: ProgressTick| handle.tick());
        let cancel = self.shutdown.child_token();

        let result = self.encoder.encode_variant(&job, &cancel, Some(progress)).await;
        if result.is_err() && marker.exists() {
            if let Err(e) = std::fs::remove_file(&marker) {
                tracing::warn!(path = %marker.display(), error = %e, "Failed to remove stray completion marker");
            }
        }
        result
    }

    async fn write_master_if_absent(&self, asset: &MediaAsset) -> Result<()> {
        let path = self.layout.master_manifest(asset.id);
        if path.exists() {
            return Ok(());
        }
        std::fs::create_dir_all(self.layout.asset_dir(asset.id))?;

        let (channels, bit_rate) = match self.prober.probe(&asset.source_path).await {
            Ok(info) => (info.channels, info.bit_rate),
            Err(e) => {
                tracing::warn!(asset_id = %asset.id, error = %e, "Probe failed; using default bandwidth estimates");
                (FALLBACK_CHANNELS, FALLBACK_BITRATE)
            }
        };

        write_atomic(&path, build_master_manifest(channels, bit_rate).as_bytes())
    }

    // -----------------------------------------------------------------------
    // Detached generation
    // -----------------------------------------------------------------------

    /// Start generating `variant` in the background.
    ///
    /// Returns the handle of the running generation, or `None` when the
    /// variant is already complete.
    pub fn start_variant(&self, asset: &MediaAsset, variant: Variant) -> Option<GenerationHandle> {
        if self.layout.completion_marker(asset.id, variant).exists() {
            return None;
        }

        let key = GenerationKey::variant(asset.id, variant);
        match self.registry.acquire(key) {
            Slot::Follower(handle) => Some(handle),
            Slot::Leader(guard) => {
                let handle = guard.handle().clone();
                let engine = self.clone();
                let asset = asset.clone();
                tokio::spawn(async move {
                    let result = engine
                        .generate_variant(&asset, variant, guard.handle().clone())
                        .await;
                    log_detached(key, &result);
                    guard.finish(&result);
                });
                Some(handle)
            }
        }
    }

    /// Start generating every variant in the background.
    pub fn start_all_variants(&self, asset: &MediaAsset) {
        let all_done = Variant::ALL
            .into_iter()
            .all(|v| self.layout.completion_marker(asset.id, v).exists());
        if all_done {
            return;
        }

        let key = GenerationKey::master(asset.id);
        if let Slot::Leader(guard) = self.registry.acquire(key) {
            let engine = self.clone();
            let asset = asset.clone();
            tokio::spawn(async move {
                let result = engine.generate_all(&asset).await;
                log_detached(key, &result);
                guard.finish(&result);
            });
        }
    }

    /// Kick off generation for a play request and return the manifest name
    /// the player should load.
    pub async fn start_stream(&self, asset_id: AssetId, quality: StreamQuality) -> Result<String> {
        let asset = self.catalog.get_asset(asset_id).await?;
        let target = quality.target();
        match target {
            AdaptiveTarget::Master => {
                self.write_master_if_absent(&asset).await?;
                self.start_all_variants(&asset);
            }
            AdaptiveTarget::Variant(variant) => {
                self.start_variant(&asset, variant);
            }
        }
        Ok(target.manifest_name())
    }

    // -----------------------------------------------------------------------
    // Serving
    // -----------------------------------------------------------------------

    /// Serve `name` from the asset's adaptive directory, generating it first
    /// if needed.
    pub async fn serve(&self, asset_id: AssetId, name: &str) -> Result<ServedArtifact> {
        let artifact = Artifact::parse(name)?;
        let asset = self.catalog.get_asset(asset_id).await?;

        let handle = match artifact.variant() {
            None => {
                self.write_master_if_absent(&asset).await?;
                self.start_all_variants(&asset);
                None
            }
            Some(variant) => self.start_variant(&asset, variant),
        };

        self.wait_ready(&asset, artifact, handle).await?;

        let path = self.layout.artifact_path(asset_id, artifact);
        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::not_found("artifact", name));
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = usage::touch(&self.layout, asset_id) {
            tracing::warn!(asset_id = %asset_id, error = %e, "Failed to update usage marker");
        }

        Ok(ServedArtifact {
            path,
            content_type: artifact.content_type(),
            body,
        })
    }

    /// Block until `artifact` is ready, the generation fails, or the
    /// deadline passes.
    async fn wait_ready(
        &self,
        asset: &MediaAsset,
        artifact: Artifact,
        handle: Option<GenerationHandle>,
    ) -> Result<()> {
        let deadline = self.settings.ready_timeout.map(|d| Instant::now() + d);
        let mut handle = handle;
        let mut rx = handle.as_ref().map(GenerationHandle::subscribe);

        loop {
            if is_ready(&self.layout, asset.id, artifact) {
                return Ok(());
            }

            let outcome = rx
                .as_mut()
                .and_then(|rx| terminal_outcome(&rx.borrow_and_update()));
            match outcome {
                Some(Outcome::Failed(e)) => {
                    tracing::debug!(asset_id = %asset.id, error = %e, "Generation failed while waiting");
                    return Err(e);
                }
                Some(Outcome::Abandoned) => {
                    if self.shutdown.is_cancelled() {
                        return Err(Error::Cancelled);
                    }
                    handle = artifact
                        .variant()
                        .and_then(|variant| self.start_variant(asset, variant));
                    rx = handle.as_ref().map(GenerationHandle::subscribe);
                    continue;
                }
                Some(Outcome::Finished) => rx = None,
                None => {}
            }

            let changed = async {
                match rx.as_mut() {
                    Some(rx) => {
                        let _ = rx.changed().await;
                    }
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = changed => {}
                _ = tokio::time::sleep(self.settings.fallback_poll) => {}
                _ = sleep_until(deadline) => {
                    return Err(Error::Timeout(format!(
                        "{} for asset {} not ready after {:?}",
                        self.layout.artifact_path(asset.id, artifact).display(),
                        asset.id,
                        self.settings.ready_timeout.unwrap_or_default(),
                    )));
                }
                _ = self.shutdown.cancelled() => return Err(Error::Cancelled),
            }
        }
    }
}

fn log_detached(key: GenerationKey, result: &Result<()>) {
    match result {
        Ok(()) => tracing::debug!(key = %key, "Generation finished"),
        Err(e) if e.is_soft() => tracing::info!(key = %key, error = %e, "Generation stopped early"),
        Err(e) => tracing::error!(key = %key, error = %e, "Generation failed"),
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Write `bytes` to a uniquely named sibling temp file and rename it over
/// `path`. Concurrent writers never share a temp file; the last rename wins.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Internal(format!("{} has no parent directory", path.display())))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(".tunecast-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| Error::from(e.error))?;
    Ok(())
}
