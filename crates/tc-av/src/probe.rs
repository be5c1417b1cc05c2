//! Source inspection via `ffprobe`.
//!
//! Only the properties the streaming engine needs are extracted: channel
//! count and bitrate for the master manifest, and duration for pre-published
//! variant manifests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tc_core::{Error, Result};

use crate::command::ToolCommand;

/// Audio properties of a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInfo {
    pub channels: u32,
    /// Container bitrate in bits per second; `0` when unknown.
    pub bit_rate: u64,
    pub duration_ms: u64,
}

/// Inspects source audio files.
#[async_trait]
pub trait AudioProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<AudioInfo>;
}

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    ffprobe_path: PathBuf,
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self {
            ffprobe_path,
            timeout: Duration::from_secs(30),
        }
    }
}

#[async_trait]
impl AudioProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<AudioInfo> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.timeout(Some(self.timeout));
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "a:0",
            "-show_entries",
            "stream=channels,duration:format=bit_rate,duration",
            "-of",
            "json=compact=1",
        ]);
        cmd.arg(path.to_string_lossy().as_ref());

        let output = cmd.execute().await.map_err(|e| match e {
            Error::Tool { message, .. } => {
                Error::Probe(format!("ffprobe failed on {}: {message}", path.display()))
            }
            other => other,
        })?;

        parse_ffprobe_json(&output.stdout)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    #[serde(default)]
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    channels: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    bit_rate: Option<String>,
    duration: Option<String>,
}

/// Map ffprobe JSON output into [`AudioInfo`].
pub fn parse_ffprobe_json(json: &str) -> Result<AudioInfo> {
    let ff: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| Error::Probe(format!("ffprobe JSON parse error: {e}")))?;

    let stream = ff
        .streams
        .first()
        .ok_or_else(|| Error::Probe("no audio stream found".into()))?;

    let channels = stream
        .channels
        .filter(|&c| c > 0)
        .ok_or_else(|| Error::Probe("audio stream has no channel count".into()))?;

    let bit_rate = ff
        .format
        .bit_rate
        .as_deref()
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(0);

    let duration_ms = ff
        .format
        .duration
        .as_deref()
        .or(stream.duration.as_deref())
        .and_then(parse_seconds_ms)
        .ok_or_else(|| Error::Probe("source duration unknown".into()))?;

    Ok(AudioInfo {
        channels,
        bit_rate,
        duration_ms,
    })
}

fn parse_seconds_ms(s: &str) -> Option<u64> {
    let secs: f64 = s.trim().parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| (secs * 1000.0).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_typical_flac() {
        let json = r#"{"programs":[],"streams":[{"channels":2,"duration":"215.506667"}],"format":{"duration":"215.506667","bit_rate":"1014232"}}"#;
        let info = parse_ffprobe_json(json).unwrap();
        assert_eq!(
            info,
            AudioInfo {
                channels: 2,
                bit_rate: 1_014_232,
                duration_ms: 215_507,
            }
        );
    }

    #[test]
    fn missing_bitrate_is_zero() {
        let json = r#"{"streams":[{"channels":6}],"format":{"duration":"10.5"}}"#;
        let info = parse_ffprobe_json(json).unwrap();
        assert_eq!(info.bit_rate, 0);
        assert_eq!(info.channels, 6);
        assert_eq!(info.duration_ms, 10_500);
    }

    #[test]
    fn falls_back_to_stream_duration() {
        let json = r#"{"streams":[{"channels":1,"duration":"3.0"}],"format":{"bit_rate":"N/A"}}"#;
        let info = parse_ffprobe_json(json).unwrap();
        assert_eq!(info.duration_ms, 3000);
        assert_eq!(info.bit_rate, 0);
    }

    #[test]
    fn no_audio_stream_is_probe_error() {
        let err = parse_ffprobe_json(r#"{"streams":[],"format":{}}"#).unwrap_err();
        assert!(matches!(err, Error::Probe(_)));
    }

    #[test]
    fn garbage_is_probe_error() {
        assert!(matches!(parse_ffprobe_json("not json"), Err(Error::Probe(_))));
    }

    #[tokio::test]
    async fn missing_binary_is_probe_error() {
        let prober = FfprobeProber::new(PathBuf::from("nonexistent_ffprobe_xyz"));
        let err = prober.probe(Path::new("/tmp/a.flac")).await.unwrap_err();
        assert!(matches!(err, Error::Probe(_)));
    }
}
