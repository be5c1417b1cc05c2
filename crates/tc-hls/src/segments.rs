//! Equal-length segment boundaries.
//!
//! Audio has no keyframe constraints, so a rendition is cut into segments of
//! exactly the configured length with one shorter remainder at the end.
//! Durations are computed in integer milliseconds and only converted to
//! seconds at the edge, so `10500 / 3000` yields exactly `[3, 3, 3, 1.5]`.

use tc_core::{Error, Result};

/// Split `total_ms` into segments of `segment_ms`, returned in seconds.
///
/// Produces `floor(total / segment)` full segments plus one remainder
/// segment, which is dropped when the division is exact. Zero inputs are a
/// validation error.
pub fn compute_equal_length_segments(segment_ms: u64, total_ms: u64) -> Result<Vec<f64>> {
    if segment_ms == 0 || total_ms == 0 {
        return Err(Error::Validation(format!(
            "invalid segment length ({segment_ms} ms) or runtime ({total_ms} ms)"
        )));
    }

    let whole = total_ms / segment_ms;
    let remainder = total_ms % segment_ms;

    let mut segments = Vec::with_capacity(whole as usize + 1);
    segments.extend((0..whole).map(|_| ms_to_secs(segment_ms)));
    if remainder > 0 {
        segments.push(ms_to_secs(remainder));
    }

    Ok(segments)
}

/// `ceil` of the longest segment, used for `#EXT-X-TARGETDURATION`.
pub fn target_duration(segments: &[f64], segment_ms: u64) -> u64 {
    let longest = segments
        .iter()
        .copied()
        .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.max(s))))
        .unwrap_or_else(|| ms_to_secs(segment_ms));
    longest.ceil() as u64
}

fn ms_to_secs(ms: u64) -> f64 {
    ms as f64 / 1000.0
}
