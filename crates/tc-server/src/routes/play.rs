//! Play entry point: pick a quality, start generating, redirect to the
//! manifest the player should load.

use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::Extension;
use tc_core::{AssetId, StreamQuality};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;

/// GET /play/{asset_id}/{quality}
///
/// `adaptive` redirects to the master manifest; other qualities pin a single
/// variant.
pub async fn play(
    State(ctx): State<AppContext>,
    Extension(request_id): Extension<RequestId>,
    Path((asset_id, quality)): Path<(String, String)>,
) -> Result<Redirect, AppError> {
    let with_id = |e: tc_core::Error| AppError::from(e).with_request_id(request_id.0.clone());

    let asset_id: AssetId = asset_id.parse().map_err(with_id)?;
    let quality: StreamQuality = quality.parse().map_err(with_id)?;
    let manifest = ctx
        .engine
        .start_stream(asset_id, quality)
        .await
        .map_err(with_id)?;

    tracing::debug!(asset_id = %asset_id, manifest = %manifest, "Redirecting player");
    Ok(Redirect::to(&format!("/stream/{asset_id}/{manifest}")))
}
