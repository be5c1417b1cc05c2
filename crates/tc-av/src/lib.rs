//! # tc-av
//!
//! External tool management, probing, and encoding for tunecast.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find and cache paths to ffmpeg
//!   and ffprobe.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout,
//!   cancellation and ffmpeg progress parsing.
//! - **Probing** ([`AudioProber`], [`FfprobeProber`]) -- channel count,
//!   bitrate and duration of a source.
//! - **Encoding** ([`Encoder`], [`FfmpegEncoder`]) -- fMP4 HLS variants and
//!   whole-file opus transcodes, and transcodes piped to the client.

pub mod args;
pub mod command;
pub mod encoder;
pub mod probe;
pub mod tools;

// ---- Re-exports for convenience ----

pub use command::{check_exit, ChildOutput, ProgressFn, ProgressTick, RunOutcome, ToolCommand, ToolOutput};
pub use encoder::{AudioReader, Encoder, FfmpegEncoder, LiveJob, TranscodeJob, VariantJob};
pub use probe::{AudioInfo, AudioProber, FfprobeProber};
pub use tools::{ToolInfo, ToolRegistry};
