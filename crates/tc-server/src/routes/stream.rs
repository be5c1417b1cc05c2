//! Adaptive streaming: master manifest, variant manifests and segments.
//!
//! Each request triggers generation of the rendition it belongs to and waits
//! until the file is safe to read. Dropping the connection ends the wait.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use tc_core::AssetId;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// GET /stream/{asset_id}/{artifact}
pub async fn artifact(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path((asset_id, artifact)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let with_id = |e: tc_core::Error| AppError::from(e).with_request_id(request_id.0.clone());

    let asset_id: AssetId = asset_id.parse().map_err(with_id)?;
    let served = ctx.engine.serve(asset_id, &artifact).await.map_err(with_id)?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, served.content_type.to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        served.body,
    )
        .into_response())
}
