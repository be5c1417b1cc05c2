//! tc-stream: on-demand adaptive streaming and the whole-file transcode cache.
//!
//! [`StreamEngine`] turns a request for an artifact into at most one encoder
//! run per rendition, waits for the artifact to become safe to serve, and
//! records usage so [`reaper`] can reclaim directories nobody asks for.
//! [`live`] pipes uncached transcodes straight to the client.

pub mod engine;
pub mod layout;
pub mod live;
pub mod readiness;
pub mod reaper;
pub mod registry;
pub mod renditions;
pub mod usage;

pub use engine::{EngineSettings, ServedArtifact, StreamEngine};
pub use layout::{Artifact, StorageLayout};
pub use live::LiveStream;
pub use readiness::is_ready;
pub use reaper::{spawn_reaper, sweep, SweepReport};
pub use registry::{GenerationHandle, GenerationRegistry, GenerationState, Outcome, Slot};
