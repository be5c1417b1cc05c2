//! Whole-file transcodes.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Serialize;
use tc_core::{AssetId, Catalog, TranscodeQuality};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;
use crate::routes::streaming_helpers::serve_file_streaming;

#[derive(Debug, Serialize)]
pub struct PrefetchResponse {
    pub asset_id: AssetId,
    pub quality: TranscodeQuality,
    pub status: &'static str,
}

fn parse_target(asset_id: &str, quality: &str) -> tc_core::Result<(AssetId, TranscodeQuality)> {
    Ok((asset_id.parse()?, quality.parse()?))
}

/// GET /transcode/{asset_id}/{quality}
///
/// Generates the transcode inside this request when it is stale, then serves
/// it with range support.
pub async fn get_transcode(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path((asset_id, quality)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let with_id = |e: tc_core::Error| AppError::from(e).with_request_id(request_id.0.clone());

    let (asset_id, quality) = parse_target(&asset_id, &quality).map_err(with_id)?;
    let path = ctx
        .engine
        .ensure_transcoded(asset_id, quality)
        .await
        .map_err(with_id)?;

    let range = headers
        .get(axum::http::header::RANGE)
        .and_then(|v| v.to_str().ok());
    serve_file_streaming(&path, "audio/ogg", range)
        .await
        .map_err(with_id)
}

/// POST /transcode/{asset_id}/{quality}
pub async fn prefetch_transcode(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path((asset_id, quality)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let with_id = |e: tc_core::Error| AppError::from(e).with_request_id(request_id.0.clone());

    let (asset_id, quality) = parse_target(&asset_id, &quality).map_err(with_id)?;
    ctx.engine
        .catalog()
        .get_asset(asset_id)
        .await
        .map_err(with_id)?;

    ctx.engine.prefetch_transcode(asset_id, quality);

    Ok((
        StatusCode::ACCEPTED,
        Json(PrefetchResponse {
            asset_id,
            quality,
            status: "queued",
        }),
    )
        .into_response())
}
