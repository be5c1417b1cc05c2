//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which wires a full [`AppContext`] over an
//! in-memory SQLite catalog, a scripted encoder that writes plausible output
//! instead of running ffmpeg, and a temporary storage root. [`with_server`]
//! starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::Semaphore;
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use tc_av::{
    AudioInfo, AudioProber, AudioReader, Encoder, LiveJob, ProgressFn, ProgressTick, ToolRegistry,
    TranscodeJob, VariantJob,
};
use tc_core::config::Config;
use tc_core::{AssetId, Error, Result};
use tc_db::{init_memory_pool, DbPool, SqliteCatalog};
use tc_server::context::AppContext;
use tc_server::router::build_router;
use tc_stream::{EngineSettings, StorageLayout, StreamEngine};

/// Encoder double: writes segments and markers the way ffmpeg would.
#[derive(Default)]
pub struct ScriptedEncoder {
    pub segments: i64,
    /// When set, the encoder pauses after segment 0 until a permit arrives.
    pub gate: Option<Arc<Semaphore>>,
    /// When set, every run exits with this code.
    pub fail_code: Option<i32>,
    pub variant_runs: AtomicUsize,
    pub transcode_runs: AtomicUsize,
    pub live_runs: AtomicUsize,
    /// Live readers not yet dropped.
    pub live_open: Arc<AtomicUsize>,
    /// Live output never ends; a chunk is produced every few milliseconds.
    pub endless_live: bool,
    pub jobs: Mutex<Vec<String>>,
}

/// Live reader that counts itself in `open` until dropped.
struct TrackedReader {
    inner: AudioReader,
    open: Arc<AtomicUsize>,
}

impl AsyncRead for TrackedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        self.inner.as_mut().poll_read(cx, buf)
    }
}

impl Drop for TrackedReader {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ScriptedEncoder {
    pub fn new(segments: i64) -> Self {
        Self {
            segments,
            ..Default::default()
        }
    }

    fn failure(&self) -> Option<Error> {
        self.fail_code.map(|code| Error::ProcessFailed {
            tool: "ffmpeg".into(),
            code,
            message: "Invalid data found when processing input".into(),
        })
    }
}

#[async_trait]
impl Encoder for ScriptedEncoder {
    async fn encode_variant(
        &self,
        job: &VariantJob,
        _cancel: &CancellationToken,
        progress: Option<ProgressFn>,
    ) -> Result<()> {
        self.variant_runs.fetch_add(1, Ordering::SeqCst);
        self.jobs.lock().push(format!("variant:{}", job.variant));
        if let Some(e) = self.failure() {
            return Err(e);
        }

        let stem = job.variant.stem();
        let dir = &job.output_dir;
        std::fs::write(dir.join(format!("{stem}_-1.m4s")), format!("{stem} init"))?;
        for n in 0..self.segments {
            std::fs::write(dir.join(format!("{stem}_{n}.m4s")), format!("{stem} segment {n}"))?;
            if let Some(progress) = &progress {
                progress(ProgressTick {
                    out_time_ms: (n as u64 + 1) * 3000,
                    done: false,
                });
            }
            if n == 0 {
                if let Some(gate) = &self.gate {
                    let _permit = gate.acquire().await;
                }
            }
        }
        std::fs::write(
            dir.join(format!("{stem}-encoder.m3u8")),
            "#EXTM3U\n#EXT-X-PLAYLIST-TYPE:VOD\n#EXT-X-ENDLIST\n",
        )?;
        Ok(())
    }

    async fn transcode(&self, job: &TranscodeJob, _cancel: &CancellationToken) -> Result<()> {
        self.transcode_runs.fetch_add(1, Ordering::SeqCst);
        self.jobs.lock().push(format!("transcode:{}", job.quality));
        if let Some(e) = self.failure() {
            return Err(e);
        }
        std::fs::write(&job.output, format!("OggS {} transcode payload", job.quality))?;
        Ok(())
    }

    async fn stream(&self, job: &LiveJob, _cancel: &CancellationToken) -> Result<AudioReader> {
        self.live_runs.fetch_add(1, Ordering::SeqCst);
        self.jobs.lock().push(format!("live:{}@{}", job.quality, job.offset_ms));

        let inner: AudioReader = if self.endless_live {
            let chunks = futures::stream::unfold((), |()| async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                Some((Ok::<_, std::io::Error>(&b"live chunk "[..]), ()))
            });
            Box::pin(StreamReader::new(chunks))
        } else {
            let body = format!("{} audio from {}ms", job.quality, job.offset_ms);
            Box::pin(std::io::Cursor::new(body.into_bytes()))
        };

        self.live_open.fetch_add(1, Ordering::SeqCst);
        Ok(Box::pin(TrackedReader {
            inner,
            open: self.live_open.clone(),
        }))
    }
}

/// Prober double describing a 10.5 s stereo source.
pub struct StaticProber;

#[async_trait]
impl AudioProber for StaticProber {
    async fn probe(&self, _path: &Path) -> Result<AudioInfo> {
        Ok(AudioInfo {
            channels: 2,
            bit_rate: 1_000_000,
            duration_ms: 10_500,
        })
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`].
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub encoder: Arc<ScriptedEncoder>,
    pub dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_encoder(ScriptedEncoder::new(4))
    }

    pub fn with_encoder(encoder: ScriptedEncoder) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut config = Config::default();
        config.storage.hls_dir = dir.path().join("hls");
        config.storage.transcode_dir = dir.path().join("transcode");
        config.streaming.ready_timeout_secs = 5;
        config.streaming.fallback_poll_ms = 20;

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let encoder = Arc::new(encoder);
        let layout = StorageLayout::new(&config.storage.hls_dir, &config.storage.transcode_dir);
        let engine = StreamEngine::new(
            layout,
            Arc::new(SqliteCatalog::new(db.clone())),
            encoder.clone(),
            Arc::new(StaticProber),
        )
        .with_settings(EngineSettings::from_config(&config.streaming));

        let ctx = AppContext::new(Arc::new(config), engine, Arc::new(ToolRegistry::default()));

        Self {
            ctx,
            db,
            encoder,
            dir,
        }
    }

    /// Start an Axum server on a random port.
    pub async fn with_server(encoder: ScriptedEncoder) -> (Self, SocketAddr) {
        let harness = Self::with_encoder(encoder);
        let app = build_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    pub fn app(&self) -> axum::Router {
        build_router(self.ctx.clone())
    }

    pub fn conn(&self) -> tc_db::pool::PooledConnection {
        tc_db::get_conn(&self.db).expect("failed to get connection")
    }

    /// Register a source file for `id` and return its asset id.
    pub fn register(&self, id: i64) -> AssetId {
        let id = AssetId::new(id).expect("valid asset id");
        let source = self.dir.path().join(format!("track-{id}.flac"));
        std::fs::write(&source, format!("fLaC source {id}")).expect("write source");
        let signature = tc_core::signature::file_signature(&source).expect("signature");
        tc_db::queries::assets::upsert_asset(
            &self.conn(),
            id,
            &source.to_string_lossy(),
            &signature,
        )
        .expect("upsert asset");
        id
    }

    pub fn layout(&self) -> &StorageLayout {
        self.ctx.engine.layout()
    }

    /// Poll until `path` exists or panic after a few seconds.
    pub async fn wait_for(&self, path: &Path) {
        for _ in 0..250 {
            if path.exists() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("{} never appeared", path.display());
    }
}
