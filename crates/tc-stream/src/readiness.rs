//! Is a requested artifact safe to serve?
//!
//! The encoder writes segments progressively and in increasing order, so a
//! segment is only known to be flushed once its successor exists or the
//! encoder has published its completion playlist. Every check is a direct
//! stat; the filesystem is the only source of truth.

use std::path::Path;

use tc_core::AssetId;

use crate::layout::{Artifact, StorageLayout};

/// Evaluate the readiness rules for `artifact`, most specific first.
pub fn is_ready(layout: &StorageLayout, id: AssetId, artifact: Artifact) -> bool {
    if let Some(variant) = artifact.variant() {
        if layout.completion_marker(id, variant).exists() {
            return true;
        }
    }

    match artifact {
        Artifact::Segment(variant, n) => {
            layout.segment(id, variant, n).exists() && layout.segment(id, variant, n + 1).exists()
        }
        Artifact::MasterManifest => layout.master_manifest(id).exists(),
        Artifact::VariantManifest(variant) => {
            manifest_is_complete(&layout.variant_manifest(id, variant))
        }
    }
}

/// A variant manifest is complete once it ends the playlist. Unreadable
/// manifests that exist are treated as ready.
fn manifest_is_complete(path: &Path) -> bool {
    match std::fs::read_to_string(path) {
        Ok(text) => text.contains("#EXT-X-ENDLIST"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Manifest unreadable; serving anyway");
            true
        }
    }
}
