//! ffmpeg argument construction for audio renditions.

use std::path::Path;

use tc_core::{LiveQuality, TranscodeQuality, Variant};

/// Codec arguments for an adaptive variant.
pub fn variant_codec_args(variant: Variant) -> &'static [&'static str] {
    match variant {
        Variant::Aac96 => &["-c:a", "aac", "-b:a", "96k"],
        Variant::Aac320 => &["-c:a", "aac", "-b:a", "320k"],
        Variant::Flac44k => &["-c:a", "flac", "-ar", "44100"],
        Variant::FlacOriginal => &["-c:a", "flac"],
    }
}

/// Codec arguments for a whole-file transcode (opus in ogg).
pub fn transcode_codec_args(quality: TranscodeQuality) -> &'static [&'static str] {
    match quality {
        TranscodeQuality::Low => &["-c:a", "libopus", "-b:a", "96k", "-vbr", "on"],
        TranscodeQuality::Medium => &["-c:a", "libopus", "-b:a", "320k", "-vbr", "on"],
        TranscodeQuality::High => &["-c:a", "libopus", "-b:a", "510k", "-vbr", "on"],
    }
}

/// Codec and muxer arguments for an on-the-fly transcode.
pub fn live_codec_args(quality: LiveQuality) -> &'static [&'static str] {
    match quality {
        LiveQuality::Low => &["-c:a", "libopus", "-b:a", "96k", "-vbr", "on", "-f", "opus"],
        LiveQuality::Medium => &["-c:a", "libopus", "-b:a", "320k", "-vbr", "on", "-f", "opus"],
        LiveQuality::High => &["-c:a", "flac", "-ar", "44100", "-f", "flac"],
        LiveQuality::Max => &["-c:a", "flac", "-f", "flac"],
    }
}

/// Thread count handed to ffmpeg: available parallelism capped at `max`.
pub fn encoder_threads(max: u32) -> u32 {
    let available = std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1);
    if max == 0 {
        available
    } else {
        available.min(max)
    }
}

/// Full argument list for segmenting one variant into fMP4 HLS.
///
/// Segments land in `output_dir` as `{stem}_{n}.m4s` with the init segment
/// at `{stem}_-1.m4s`; ffmpeg's own playlist is written to
/// `{stem}-encoder.m3u8` only once every segment has been flushed.
pub fn hls_variant_args(
    source: &Path,
    output_dir: &Path,
    variant: Variant,
    segment_length_ms: u64,
    threads: u32,
) -> Vec<String> {
    let stem = variant.stem();
    let segment_pattern = output_dir.join(format!("{stem}_%d.m4s"));
    let encoder_playlist = output_dir.join(format!("{stem}-encoder.m3u8"));
    let hls_time = format!("{}", segment_length_ms as f64 / 1000.0);

    let mut args: Vec<String> = [
        "-hide_banner",
        "-nostdin",
        "-v",
        "error",
        "-nostats",
        "-progress",
        "pipe:1",
        "-analyzeduration",
        "200M",
        "-probesize",
        "1G",
        "-i",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    args.push(source.to_string_lossy().to_string());
    args.extend(
        [
            "-map_metadata",
            "-1",
            "-map_chapters",
            "-1",
            "-threads",
        ]
        .map(String::from),
    );
    args.push(threads.to_string());
    args.extend(["-filter_complex", "[0:a]asplit=1[a1]", "-map", "[a1]"].map(String::from));
    args.extend(variant_codec_args(variant).iter().map(|s| s.to_string()));
    args.extend(
        [
            "-copyts",
            "-avoid_negative_ts",
            "disabled",
            "-max_muxing_queue_size",
            "2048",
            "-f",
            "hls",
            "-max_delay",
            "5000000",
            "-hls_time",
        ]
        .map(String::from),
    );
    args.push(hls_time);
    args.extend(["-hls_segment_type", "fmp4", "-hls_fmp4_init_filename"].map(String::from));
    args.push(format!("{stem}_-1.m4s"));
    args.extend(["-start_number", "0", "-hls_segment_filename"].map(String::from));
    args.push(segment_pattern.to_string_lossy().to_string());
    args.extend(["-hls_playlist_type", "vod", "-hls_list_size", "0", "-y"].map(String::from));
    args.push(encoder_playlist.to_string_lossy().to_string());
    args
}

/// Full argument list for a whole-file transcode into `output`.
pub fn transcode_args(source: &Path, output: &Path, quality: TranscodeQuality) -> Vec<String> {
    let mut args: Vec<String> = [
        "-hide_banner",
        "-nostdin",
        "-v",
        "error",
        "-nostats",
        "-progress",
        "pipe:1",
        "-i",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    args.push(source.to_string_lossy().to_string());
    args.extend(["-map", "0:a:0", "-vn", "-map_metadata", "-1"].map(String::from));
    args.extend(transcode_codec_args(quality).iter().map(|s| s.to_string()));
    args.extend(["-f", "ogg", "-y"].map(String::from));
    args.push(output.to_string_lossy().to_string());
    args
}

/// Full argument list for a transcode written to stdout, starting
/// `offset_ms` into the source.
pub fn live_args(source: &Path, offset_ms: u64, quality: LiveQuality) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-v", "0", "-accurate_seek", "-ss"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    args.push(format!("{}us", offset_ms * 1000));
    args.push("-i".to_string());
    args.push(source.to_string_lossy().to_string());
    args.extend(["-map", "0:a:0", "-vn"].map(String::from));
    args.extend(live_codec_args(quality).iter().map(|s| s.to_string()));
    args.push("-".to_string());
    args
}
