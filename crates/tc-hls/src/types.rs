//! Playlist models rendered by [`crate::generator`].

use serde::{Deserialize, Serialize};

/// One `#EXT-X-STREAM-INF` line of the master manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamInf {
    /// Estimated bits per second.
    pub bandwidth: u64,
    /// RFC 6381 codec, `mp4a.40.2` or `flac`.
    pub codecs: String,
    pub channels: u32,
    /// Variant manifest, relative to the master.
    pub uri: String,
}

/// `#EXTINF` entry; `duration` is in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub duration: f64,
    pub uri: String,
}

/// Master manifest: every audio variant of one asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterPlaylist {
    pub streams: Vec<StreamInf>,
}

/// Per-variant manifest, published before any segment exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaPlaylist {
    /// Longest segment, rounded up to whole seconds.
    pub target_duration: u64,
    pub media_sequence: u64,
    pub segments: Vec<Segment>,
    pub vod: bool,
    /// Emit `#EXT-X-ENDLIST`.
    pub ended: bool,
    /// `#EXT-X-MAP` target (`{stem}_-1.m4s`).
    pub init_segment_uri: Option<String>,
}
