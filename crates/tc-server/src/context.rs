//! Application context shared by all route handlers via Axum state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tc_av::{FfmpegEncoder, FfprobeProber, ToolRegistry};
use tc_core::config::Config;
use tc_core::Catalog;
use tc_stream::{EngineSettings, StorageLayout, StreamEngine};
use tokio_util::sync::CancellationToken;

/// Cheaply cloneable; everything inside is behind an `Arc`.
#[derive(Clone)]
pub struct AppContext {
    /// Immutable configuration snapshot.
    pub config: Arc<Config>,
    pub engine: StreamEngine,
    /// External tool registry.
    pub tools: Arc<ToolRegistry>,
    pub started_at: DateTime<Utc>,
}

impl AppContext {
    pub fn new(config: Arc<Config>, engine: StreamEngine, tools: Arc<ToolRegistry>) -> Self {
        Self {
            config,
            engine,
            tools,
            started_at: Utc::now(),
        }
    }

    /// Wire the ffmpeg-backed engine over `catalog`.
    ///
    /// Encoders started by the engine are killed when `shutdown` fires.
    pub fn with_ffmpeg(
        config: Config,
        catalog: Arc<dyn Catalog>,
        tools: Arc<ToolRegistry>,
        shutdown: CancellationToken,
    ) -> Self {
        let encoder = FfmpegEncoder::new(tools.path_or_name("ffmpeg"))
            .with_timeout(config.streaming.encoder_timeout())
            .with_max_threads(config.streaming.max_encoder_threads);
        let prober = FfprobeProber::new(tools.path_or_name("ffprobe"));

        let layout = StorageLayout::new(&config.storage.hls_dir, &config.storage.transcode_dir);
        let engine = StreamEngine::new(layout, catalog, Arc::new(encoder), Arc::new(prober))
            .with_settings(EngineSettings::from_config(&config.streaming))
            .with_shutdown(shutdown);

        Self::new(Arc::new(config), engine, tools)
    }
}
