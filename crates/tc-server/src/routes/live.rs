//! Transcodes streamed while the encoder runs.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use tc_core::{AssetId, Error, LiveQuality};
use tokio_util::io::ReaderStream;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// Playback position, in milliseconds, the client wants the stream to start at.
pub static X_STREAM_OFFSET: HeaderName = HeaderName::from_static("x-stream-offset");

const CHUNK_SIZE: usize = 64 * 1024;

/// Read [`X_STREAM_OFFSET`]; absent means the start of the track.
pub fn stream_offset(headers: &HeaderMap) -> tc_core::Result<u64> {
    let Some(value) = headers.get(&X_STREAM_OFFSET) else {
        return Ok(0);
    };
    value
        .to_str()
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| Error::Validation(format!("invalid {X_STREAM_OFFSET} header")))
}

/// GET /live/{asset_id}/{quality}
///
/// The encoder is killed as soon as the client goes away.
pub async fn live(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path((asset_id, quality)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let with_id = |e: tc_core::Error| AppError::from(e).with_request_id(request_id.0.clone());

    let asset_id: AssetId = asset_id.parse().map_err(with_id)?;
    let quality: LiveQuality = quality.parse().map_err(with_id)?;
    let offset_ms = stream_offset(&headers).map_err(with_id)?;

    let live = ctx
        .engine
        .open_live(asset_id, quality, offset_ms)
        .await
        .map_err(with_id)?;

    let body = Body::from_stream(ReaderStream::with_capacity(live.reader, CHUNK_SIZE));
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, live.content_type),
            (header::CACHE_CONTROL, "no-store"),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn offset_defaults_to_zero() {
        assert_eq!(stream_offset(&HeaderMap::new()).unwrap(), 0);
    }

    #[test]
    fn offset_is_parsed_in_milliseconds() {
        let mut headers = HeaderMap::new();
        headers.insert(X_STREAM_OFFSET.clone(), HeaderValue::from_static("90500"));
        assert_eq!(stream_offset(&headers).unwrap(), 90_500);
    }

    #[test]
    fn malformed_offset_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(X_STREAM_OFFSET.clone(), HeaderValue::from_static("-5"));
        assert!(matches!(stream_offset(&headers), Err(Error::Validation(_))));
    }
}
