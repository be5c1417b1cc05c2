//! tc-hls: segment boundaries and HLS playlist generation for audio renditions.
//!
//! # Modules
//!
//! - [`segments`] - Equal-length segment durations from a total runtime
//! - [`types`] - Playlist data types
//! - [`generator`] - M3U8 rendering for master and media playlists
//! - [`manifest`] - Pre-published manifests for adaptive audio variants

pub mod generator;
pub mod manifest;
pub mod segments;
pub mod types;

pub use generator::{generate_master_playlist, generate_media_playlist};
pub use manifest::{build_manifest, build_master_manifest, estimate_bandwidth};
pub use segments::compute_equal_length_segments;
pub use types::{MasterPlaylist, MediaPlaylist, Segment, StreamInf};
