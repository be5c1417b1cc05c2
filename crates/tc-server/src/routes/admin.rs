//! Admin route handlers.

use axum::extract::State;
use axum::Json;
use tc_av::ToolInfo;

use crate::context::AppContext;
use crate::error::AppError;

/// GET /admin/tools
///
/// Version detection spawns each tool, so it runs off the async workers.
pub async fn tools(State(ctx): State<AppContext>) -> Result<Json<Vec<ToolInfo>>, AppError> {
    let tools = ctx.tools.clone();
    let infos = tokio::task::spawn_blocking(move || tools.check_all())
        .await
        .map_err(|e| tc_core::Error::Internal(format!("spawn_blocking join error: {e}")))?;
    Ok(Json(infos))
}
