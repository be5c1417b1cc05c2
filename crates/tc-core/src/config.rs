//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries the
//! server, storage, streaming, reaper and tool sections. Every section
//! defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub streaming: StreamingConfig,
    pub reaper: ReaperConfig,
    pub tools: ToolsConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if self.storage.hls_dir == self.storage.transcode_dir {
            warnings.push(
                "storage.hls_dir and storage.transcode_dir are the same; the reaper will sweep transcodes".into(),
            );
        }

        if self.streaming.segment_length_ms == 0 {
            warnings.push("streaming.segment_length_ms is 0; manifests cannot be built".into());
        }

        if self.streaming.fallback_poll_ms == 0 {
            warnings.push("streaming.fallback_poll_ms is 0; waiters will spin".into());
        }

        if self.streaming.ready_timeout_secs == 0 {
            warnings.push("streaming.ready_timeout_secs is 0; readiness waits are unbounded".into());
        }

        if self.streaming.max_encoder_threads == 0 {
            warnings.push("streaming.max_encoder_threads is 0; ffmpeg will pick its own".into());
        }

        if self.reaper.enabled {
            if self.reaper.interval_secs == 0 {
                warnings.push("reaper.interval_secs is 0; the reaper will be disabled".into());
            }
            if self.reaper.ttl_secs < 60 {
                warnings.push(format!(
                    "reaper.ttl_secs is {}; directories may be removed while still in use",
                    self.reaper.ttl_secs
                ));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            db_path: PathBuf::from("data/tunecast.db"),
        }
    }
}

/// Where generated output lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of the per-asset adaptive directories.
    pub hls_dir: PathBuf,
    /// Root of the sharded whole-file transcodes.
    pub transcode_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            hls_dir: PathBuf::from("data/hls"),
            transcode_dir: PathBuf::from("data/transcode"),
        }
    }
}

/// Segmenting, waiting and encoder limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    pub segment_length_ms: u64,
    /// Upper bound on a readiness wait. `0` waits forever.
    pub ready_timeout_secs: u64,
    /// Re-check interval for output written outside this process.
    pub fallback_poll_ms: u64,
    pub encoder_timeout_secs: u64,
    pub max_encoder_threads: u32,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            segment_length_ms: 3000,
            ready_timeout_secs: 60,
            fallback_poll_ms: 250,
            encoder_timeout_secs: 3600,
            max_encoder_threads: 16,
        }
    }
}

impl StreamingConfig {
    pub fn ready_timeout(&self) -> Option<Duration> {
        (self.ready_timeout_secs > 0).then(|| Duration::from_secs(self.ready_timeout_secs))
    }

    pub fn fallback_poll(&self) -> Duration {
        Duration::from_millis(self.fallback_poll_ms.max(10))
    }

    pub fn encoder_timeout(&self) -> Option<Duration> {
        (self.encoder_timeout_secs > 0).then(|| Duration::from_secs(self.encoder_timeout_secs))
    }
}

/// Stale-directory sweeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaperConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub ttl_secs: u64,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 1800,
            ttl_secs: 7200,
        }
    }
}

impl ReaperConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}
