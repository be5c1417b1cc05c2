//! The encoder seam: producing one rendition from a source file.

use std::path::PathBuf;
use std::pin::Pin;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tc_core::{LiveQuality, Result, TranscodeQuality, Variant};
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::args::{encoder_threads, hls_variant_args, live_args, transcode_args};
use crate::command::{check_exit, ProgressFn, ToolCommand};

/// Segment one adaptive variant into a directory.
#[derive(Debug, Clone)]
pub struct VariantJob {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    pub variant: Variant,
    pub segment_length_ms: u64,
}

/// Encode a whole file into a single output.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub source: PathBuf,
    pub output: PathBuf,
    pub quality: TranscodeQuality,
}

/// Transcode a source on the fly, starting at an offset.
#[derive(Debug, Clone)]
pub struct LiveJob {
    pub source: PathBuf,
    pub quality: LiveQuality,
    pub offset_ms: u64,
}

/// Encoded bytes produced while the encoder runs.
pub type AudioReader = Pin<Box<dyn AsyncRead + Send>>;

/// Runs the external encoder for one rendition.
///
/// Implementations must not return before the process has exited (or been
/// killed). Cancellation through `cancel` yields [`tc_core::Error::Cancelled`].
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Write `{stem}_{n}.m4s` segments and, on a clean exit only, the
    /// `{stem}-encoder.m3u8` completion playlist.
    async fn encode_variant(
        &self,
        job: &VariantJob,
        cancel: &CancellationToken,
        progress: Option<ProgressFn>,
    ) -> Result<()>;

    /// Encode `job.source` into `job.output`.
    ///
    /// Exit code 1 is tolerated; a signal is
    /// [`ProcessKilled`](tc_core::Error::ProcessKilled); anything above 1 is
    /// [`ProcessFailed`](tc_core::Error::ProcessFailed).
    async fn transcode(&self, job: &TranscodeJob, cancel: &CancellationToken) -> Result<()>;

    /// Start encoding `job` and return its output as it is produced.
    ///
    /// Dropping the reader stops the encoder. A killed or cancelled encoder
    /// simply ends the stream.
    async fn stream(&self, job: &LiveJob, cancel: &CancellationToken) -> Result<AudioReader>;
}

/// [`Encoder`] backed by the ffmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    ffmpeg_path: PathBuf,
    timeout: Option<Duration>,
    max_threads: u32,
}

impl FfmpegEncoder {
    pub fn new(ffmpeg_path: PathBuf) -> Self {
        Self {
            ffmpeg_path,
            timeout: Some(Duration::from_secs(3600)),
            max_threads: 16,
        }
    }

    /// Per-run timeout. `None` lets runs go on indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_threads(mut self, max_threads: u32) -> Self {
        self.max_threads = max_threads;
        self
    }

    fn command(&self, args: Vec<String>) -> ToolCommand {
        let mut cmd = ToolCommand::new(self.ffmpeg_path.clone());
        cmd.timeout(self.timeout).args(args);
        cmd
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn encode_variant(
        &self,
        job: &VariantJob,
        cancel: &CancellationToken,
        progress: Option<ProgressFn>,
    ) -> Result<()> {
        let args = hls_variant_args(
            &job.source,
            &job.output_dir,
            job.variant,
            job.segment_length_ms,
            encoder_threads(self.max_threads),
        );
        let cmd = self.command(args);

        tracing::info!(
            source = %job.source.display(),
            variant = %job.variant,
            "Segmenting variant"
        );
        let started = Instant::now();

        let outcome = cmd.run_supervised(cancel, progress).await?;
        check_exit(&cmd.tool_name(), &outcome, 0)?;

        tracing::info!(
            variant = %job.variant,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Variant segmented"
        );
        Ok(())
    }

    async fn transcode(&self, job: &TranscodeJob, cancel: &CancellationToken) -> Result<()> {
        let cmd = self.command(transcode_args(&job.source, &job.output, job.quality));

        tracing::info!(
            source = %job.source.display(),
            quality = %job.quality,
            "Start transcoding"
        );

        let outcome = cmd.run_supervised(cancel, None).await?;
        if let Err(e) = check_exit(&cmd.tool_name(), &outcome, 1) {
            if e.is_soft() {
                tracing::info!(quality = %job.quality, "Transcode stopped early: {e}");
            } else {
                tracing::error!(quality = %job.quality, "Transcode failed: {e}");
            }
            return Err(e);
        }

        tracing::info!(
            source = %job.source.display(),
            quality = %job.quality,
            "Finish transcoding"
        );
        Ok(())
    }

    async fn stream(&self, job: &LiveJob, cancel: &CancellationToken) -> Result<AudioReader> {
        let cmd = self.command(live_args(&job.source, job.offset_ms, job.quality));

        tracing::info!(
            source = %job.source.display(),
            quality = %job.quality,
            offset_ms = job.offset_ms,
            "Start live transcode"
        );
        Ok(Box::pin(cmd.spawn_output(cancel)?))
    }
}
