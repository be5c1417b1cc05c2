//! tc-core: shared types, IDs, errors, configuration, and the catalog contract.
//!
//! This crate is the foundational dependency for all other tc-* crates,
//! providing the asset identifier, a unified error type, the rendition
//! vocabulary (variants, transcode qualities, generation keys), application
//! configuration, and the narrow catalog interface the streaming engine
//! consumes.

pub mod catalog;
pub mod config;
pub mod error;
pub mod ids;
pub mod media;
pub mod signature;

// Re-export the most commonly used items at the crate root.
pub use catalog::{Catalog, MemoryCatalog};
pub use error::{Error, Result};
pub use ids::AssetId;
pub use media::*;
