//! Rendition vocabulary: adaptive variants, transcode qualities, generation
//! keys, and the read-only catalog view of an asset.
//!
//! All enums serialize in lowercase/kebab-case and implement `Display` and
//! `FromStr` manually so the same spelling is used in URLs, logs, and JSON.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::ids::AssetId;
use crate::Error;

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// One adaptive-streaming variant of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    #[serde(rename = "96k-aac")]
    Aac96,
    #[serde(rename = "320k-aac")]
    Aac320,
    #[serde(rename = "flac-44k")]
    Flac44k,
    #[serde(rename = "flac-original")]
    FlacOriginal,
}

impl Variant {
    /// Every variant, in the order they appear in the master manifest.
    pub const ALL: [Variant; 4] = [
        Variant::Aac96,
        Variant::Aac320,
        Variant::Flac44k,
        Variant::FlacOriginal,
    ];

    /// File-name stem used for this variant's manifest, segments and markers.
    pub fn stem(&self) -> &'static str {
        match self {
            Self::Aac96 => "96k",
            Self::Aac320 => "320k",
            Self::Flac44k => "flac_44k",
            Self::FlacOriginal => "flac_orig",
        }
    }

    /// Inverse of [`Variant::stem`].
    pub fn from_stem(stem: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.stem() == stem)
    }

    /// RFC 6381 codec string advertised in the master manifest.
    pub fn codecs(&self) -> &'static str {
        match self {
            Self::Aac96 | Self::Aac320 => "mp4a.40.2",
            Self::Flac44k | Self::FlacOriginal => "flac",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aac96 => write!(f, "96k-aac"),
            Self::Aac320 => write!(f, "320k-aac"),
            Self::Flac44k => write!(f, "flac-44k"),
            Self::FlacOriginal => write!(f, "flac-original"),
        }
    }
}

// ---------------------------------------------------------------------------
// TranscodeQuality
// ---------------------------------------------------------------------------

/// Quality of a whole-file (opus in ogg) transcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscodeQuality {
    Low,
    Medium,
    High,
}

impl TranscodeQuality {
    pub const ALL: [TranscodeQuality; 3] = [
        TranscodeQuality::Low,
        TranscodeQuality::Medium,
        TranscodeQuality::High,
    ];

    /// Output file name inside the asset's transcode shard.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Low => "low.ogg",
            Self::Medium => "medium.ogg",
            Self::High => "high.ogg",
        }
    }
}

impl fmt::Display for TranscodeQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl FromStr for TranscodeQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(Error::Validation(format!(
                "unknown transcode quality: {other:?}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// LiveQuality
// ---------------------------------------------------------------------------

/// Quality of an on-the-fly transcode piped straight to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveQuality {
    Low,
    Medium,
    /// FLAC resampled to 44.1 kHz.
    High,
    /// FLAC at the source sample rate.
    Max,
}

impl LiveQuality {
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Low | Self::Medium => "audio/ogg",
            Self::High | Self::Max => "audio/flac",
        }
    }
}

impl fmt::Display for LiveQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Max => write!(f, "max"),
        }
    }
}

impl FromStr for LiveQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "max" => Ok(Self::Max),
            other => Err(Error::Validation(format!("unknown live quality: {other:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// StreamQuality
// ---------------------------------------------------------------------------

/// Quality selector accepted by the play entry point.
///
/// `Adaptive` hands the player the master manifest; the others pin a single
/// variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamQuality {
    Adaptive,
    Lossless,
    High,
    Medium,
    Low,
}

impl StreamQuality {
    /// The adaptive target this quality maps to.
    pub fn target(&self) -> AdaptiveTarget {
        match self {
            Self::Adaptive => AdaptiveTarget::Master,
            Self::Lossless => AdaptiveTarget::Variant(Variant::FlacOriginal),
            Self::High => AdaptiveTarget::Variant(Variant::Flac44k),
            Self::Medium => AdaptiveTarget::Variant(Variant::Aac320),
            Self::Low => AdaptiveTarget::Variant(Variant::Aac96),
        }
    }
}

impl FromStr for StreamQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adaptive" => Ok(Self::Adaptive),
            "lossless" => Ok(Self::Lossless),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            other => Err(Error::Validation(format!("unknown stream quality: {other:?}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Rendition / GenerationKey
// ---------------------------------------------------------------------------

/// What an adaptive request asks to be generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdaptiveTarget {
    /// The master manifest plus all four variants.
    Master,
    /// A single variant.
    Variant(Variant),
}

impl AdaptiveTarget {
    /// Manifest file name the player should load for this target.
    pub fn manifest_name(&self) -> String {
        match self {
            Self::Master => "master.m3u8".to_string(),
            Self::Variant(v) => format!("{}.m3u8", v.stem()),
        }
    }
}

/// A tagged rendition of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rendition {
    Adaptive(AdaptiveTarget),
    Transcode(TranscodeQuality),
}

impl fmt::Display for Rendition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adaptive(AdaptiveTarget::Master) => write!(f, "adaptive/master"),
            Self::Adaptive(AdaptiveTarget::Variant(v)) => write!(f, "adaptive/{}", v.stem()),
            Self::Transcode(q) => write!(f, "transcode/{q}"),
        }
    }
}

/// Unit of mutual exclusion and of cache identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GenerationKey {
    pub asset_id: AssetId,
    pub rendition: Rendition,
}

impl GenerationKey {
    pub fn new(asset_id: AssetId, rendition: Rendition) -> Self {
        Self {
            asset_id,
            rendition,
        }
    }

    pub fn master(asset_id: AssetId) -> Self {
        Self::new(asset_id, Rendition::Adaptive(AdaptiveTarget::Master))
    }

    pub fn variant(asset_id: AssetId, variant: Variant) -> Self {
        Self::new(
            asset_id,
            Rendition::Adaptive(AdaptiveTarget::Variant(variant)),
        )
    }

    pub fn transcode(asset_id: AssetId, quality: TranscodeQuality) -> Self {
        Self::new(asset_id, Rendition::Transcode(quality))
    }
}

impl fmt::Display for GenerationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.asset_id, self.rendition)
    }
}

// ---------------------------------------------------------------------------
// MediaAsset
// ---------------------------------------------------------------------------

/// Last signature each whole-file transcode was generated from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionSignatures {
    pub low: Option<String>,
    pub medium: Option<String>,
    pub high: Option<String>,
}

impl RenditionSignatures {
    pub fn get(&self, quality: TranscodeQuality) -> Option<&str> {
        match quality {
            TranscodeQuality::Low => self.low.as_deref(),
            TranscodeQuality::Medium => self.medium.as_deref(),
            TranscodeQuality::High => self.high.as_deref(),
        }
    }

    pub fn set(&mut self, quality: TranscodeQuality, signature: impl Into<String>) {
        let slot = match quality {
            TranscodeQuality::Low => &mut self.low,
            TranscodeQuality::Medium => &mut self.medium,
            TranscodeQuality::High => &mut self.high,
        };
        *slot = Some(signature.into());
    }
}

/// Read-only view of a catalog track as seen by the streaming engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: AssetId,
    pub source_path: PathBuf,
    /// Content hash of the source bytes.
    pub file_signature: String,
    #[serde(default)]
    pub rendition_signatures: RenditionSignatures,
}

impl MediaAsset {
    /// Whether the stored signature for `quality` matches the current source.
    pub fn transcode_signature_current(&self, quality: TranscodeQuality) -> bool {
        self.rendition_signatures.get(quality) == Some(self.file_signature.as_str())
    }
}
