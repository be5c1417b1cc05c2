//! On-disk layout of generated renditions and artifact name parsing.
//!
//! ```text
//! {hls_root}/{asset_id}/
//!     master.m3u8
//!     {stem}.m3u8            pre-published manifest
//!     {stem}-encoder.m3u8    completion marker
//!     {stem}_{n}.m4s         segment n; n = -1 is the init segment
//!     {stem}.started         generation-started marker
//!     use.txt                usage marker
//! {transcode_root}/{shard}/{low|medium|high}.ogg
//! ```

use std::path::{Path, PathBuf};

use tc_core::{AssetId, Error, Result, TranscodeQuality, Variant};

pub const MASTER_MANIFEST: &str = "master.m3u8";
pub const USAGE_MARKER: &str = "use.txt";

/// Roots of generated output.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    hls_root: PathBuf,
    transcode_root: PathBuf,
}

impl StorageLayout {
    pub fn new(hls_root: impl Into<PathBuf>, transcode_root: impl Into<PathBuf>) -> Self {
        Self {
            hls_root: hls_root.into(),
            transcode_root: transcode_root.into(),
        }
    }

    pub fn hls_root(&self) -> &Path {
        &self.hls_root
    }

    pub fn transcode_root(&self) -> &Path {
        &self.transcode_root
    }

    pub fn asset_dir(&self, id: AssetId) -> PathBuf {
        self.hls_root.join(id.to_string())
    }

    pub fn master_manifest(&self, id: AssetId) -> PathBuf {
        self.asset_dir(id).join(MASTER_MANIFEST)
    }

    pub fn variant_manifest(&self, id: AssetId, variant: Variant) -> PathBuf {
        self.asset_dir(id).join(format!("{}.m3u8", variant.stem()))
    }

    pub fn completion_marker(&self, id: AssetId, variant: Variant) -> PathBuf {
        self.asset_dir(id)
            .join(format!("{}-encoder.m3u8", variant.stem()))
    }

    pub fn started_marker(&self, id: AssetId, variant: Variant) -> PathBuf {
        self.asset_dir(id).join(format!("{}.started", variant.stem()))
    }

    pub fn segment(&self, id: AssetId, variant: Variant, n: i64) -> PathBuf {
        self.asset_dir(id)
            .join(format!("{}_{n}.m4s", variant.stem()))
    }

    pub fn usage_marker(&self, id: AssetId) -> PathBuf {
        self.asset_dir(id).join(USAGE_MARKER)
    }

    pub fn transcode_dir(&self, id: AssetId) -> PathBuf {
        self.transcode_root.join(id.shard_path())
    }

    pub fn transcode_output(&self, id: AssetId, quality: TranscodeQuality) -> PathBuf {
        self.transcode_dir(id).join(quality.file_name())
    }

    /// Absolute path of a servable artifact.
    pub fn artifact_path(&self, id: AssetId, artifact: Artifact) -> PathBuf {
        match artifact {
            Artifact::MasterManifest => self.master_manifest(id),
            Artifact::VariantManifest(v) => self.variant_manifest(id, v),
            Artifact::Segment(v, n) => self.segment(id, v, n),
        }
    }
}

/// A file a client may request from an asset directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    MasterManifest,
    VariantManifest(Variant),
    /// Segment `n` of a variant; `-1` is the init segment.
    Segment(Variant, i64),
}

impl Artifact {
    /// Parse a requested file name.
    ///
    /// Path separators and parent references are rejected as invalid.
    /// Markers and unknown names are not servable and map to `NotFound`.
    pub fn parse(name: &str) -> Result<Self> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(Error::Validation(format!("invalid artifact path: {name:?}")));
        }

        if name == MASTER_MANIFEST {
            return Ok(Self::MasterManifest);
        }

        if let Some(stem) = name.strip_suffix(".m3u8") {
            if let Some(v) = Variant::from_stem(stem) {
                return Ok(Self::VariantManifest(v));
            }
        }

        if let Some(base) = name.strip_suffix(".m4s") {
            if let Some((stem, n)) = base.rsplit_once('_') {
                if let (Some(v), Ok(n)) = (Variant::from_stem(stem), n.parse::<i64>()) {
                    if n >= -1 {
                        return Ok(Self::Segment(v, n));
                    }
                }
            }
        }

        Err(Error::not_found("artifact", name))
    }

    pub fn variant(&self) -> Option<Variant> {
        match self {
            Self::MasterManifest => None,
            Self::VariantManifest(v) | Self::Segment(v, _) => Some(*v),
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::MasterManifest | Self::VariantManifest(_) => "application/vnd.apple.mpegurl",
            Self::Segment(..) => "audio/mp4",
        }
    }
}
