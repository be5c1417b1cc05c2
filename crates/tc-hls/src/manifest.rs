//! Pre-published manifests for adaptive audio.
//!
//! Variant manifests are computed from the source duration before encoding
//! starts and list every segment up front, terminated with `#EXT-X-ENDLIST`,
//! even though most segments do not exist yet. The master manifest only needs
//! channel count and bitrate and is complete as soon as it is written.

use tc_core::{Result, Variant};

use crate::generator::{generate_master_playlist, generate_media_playlist};
use crate::segments::{compute_equal_length_segments, target_duration};
use crate::types::{MasterPlaylist, MediaPlaylist, Segment, StreamInf};

/// Name of the initialization segment for `stem`.
pub fn init_segment_name(stem: &str) -> String {
    format!("{stem}_-1.m4s")
}

/// Name of media segment `n` for `stem`.
pub fn segment_name(stem: &str, n: i64) -> String {
    format!("{stem}_{n}.m4s")
}

/// Build the variant manifest text for a source of `duration_ms`.
pub fn build_manifest(duration_ms: u64, segment_length_ms: u64, stem: &str) -> Result<String> {
    let durations = compute_equal_length_segments(segment_length_ms, duration_ms)?;

    let playlist = MediaPlaylist {
        target_duration: target_duration(&durations, segment_length_ms),
        media_sequence: 0,
        segments: durations
            .iter()
            .enumerate()
            .map(|(i, &duration)| Segment {
                duration,
                uri: segment_name(stem, i as i64),
            })
            .collect(),
        vod: true,
        ended: true,
        init_segment_uri: Some(init_segment_name(stem)),
    };

    Ok(generate_media_playlist(&playlist))
}

/// Estimated peak bandwidth advertised for `variant`.
///
/// Lossy variants advertise their nominal bitrate. FLAC at 44.1 kHz is
/// estimated at 400 kbit/s per channel; original FLAC uses the probed source
/// bitrate, or 500 kbit/s per channel when unknown (`0`).
pub fn estimate_bandwidth(variant: Variant, channels: u32, probed_bitrate: u64) -> u64 {
    let channels = u64::from(channels);
    match variant {
        Variant::Aac96 => 96_000,
        Variant::Aac320 => 320_000,
        Variant::Flac44k => 400_000 * channels,
        Variant::FlacOriginal if probed_bitrate > 0 => probed_bitrate,
        Variant::FlacOriginal => 500_000 * channels,
    }
}

/// Build the master manifest listing all four variants.
pub fn build_master_manifest(channels: u32, probed_bitrate: u64) -> String {
    let playlist = MasterPlaylist {
        streams: Variant::ALL
            .into_iter()
            .map(|variant| StreamInf {
                bandwidth: estimate_bandwidth(variant, channels, probed_bitrate),
                codecs: variant.codecs().to_string(),
                channels,
                uri: format!("{}.m3u8", variant.stem()),
            })
            .collect(),
    };
    generate_master_playlist(&playlist)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_lists_every_segment_up_front() {
        let text = build_manifest(10_500, 3000, "96k").unwrap();

        assert!(text.starts_with("#EXTM3U\n#EXT-X-PLAYLIST-TYPE:VOD\n#EXT-X-VERSION:7\n"));
        assert!(text.contains("#EXT-X-TARGETDURATION:3\n"));
        assert!(text.contains("#EXT-X-MEDIA-SEQUENCE:0\n"));
        assert!(text.contains("#EXT-X-MAP:URI=\"96k_-1.m4s\"\n"));
        assert_eq!(text.matches("#EXTINF:3.000000,").count(), 3);
        assert!(text.contains("#EXTINF:1.500000,\n96k_3.m4s\n"));
        assert!(!text.contains("96k_4.m4s"));
        assert!(text.ends_with("#EXT-X-ENDLIST\n"));
    }

    #[test]
    fn map_precedes_first_segment() {
        let text = build_manifest(9000, 3000, "flac_orig").unwrap();
        let map = text.find("#EXT-X-MAP").unwrap();
        let first = text.find("flac_orig_0.m4s").unwrap();
        assert!(map < first);
    }

    #[test]
    fn manifest_rejects_zero_duration() {
        assert!(build_manifest(0, 3000, "96k").is_err());
        assert!(build_manifest(9000, 0, "96k").is_err());
    }

    #[test]
    fn bandwidth_estimates() {
        assert_eq!(estimate_bandwidth(Variant::Aac96, 2, 0), 96_000);
        assert_eq!(estimate_bandwidth(Variant::Aac320, 6, 0), 320_000);
        assert_eq!(estimate_bandwidth(Variant::Flac44k, 2, 0), 800_000);
        assert_eq!(estimate_bandwidth(Variant::FlacOriginal, 2, 0), 1_000_000);
        assert_eq!(estimate_bandwidth(Variant::FlacOriginal, 2, 1_411_000), 1_411_000);
    }

    #[test]
    fn master_lists_four_variants_in_order() {
        let text = build_master_manifest(2, 0);
        let uris: Vec<&str> = text.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(
            uris,
            vec!["96k.m3u8", "320k.m3u8", "flac_44k.m3u8", "flac_orig.m3u8"]
        );
        assert!(text.contains("BANDWIDTH=96000,CODECS=\"mp4a.40.2\",CHANNELS=\"2\""));
        assert!(text.contains("BANDWIDTH=1000000,CODECS=\"flac\",CHANNELS=\"2\""));
    }
}
