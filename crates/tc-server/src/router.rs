//! Axum router construction.

use axum::middleware;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::context::AppContext;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Build the application router with all routes and middleware layers.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/stream/{asset_id}/{artifact}",
            get(routes::stream::artifact),
        )
        .route("/play/{asset_id}/{quality}", get(routes::play::play))
        .route(
            "/transcode/{asset_id}/{quality}",
            get(routes::transcode::get_transcode).post(routes::transcode::prefetch_transcode),
        )
        .route("/live/{asset_id}/{quality}", get(routes::live::live))
        .route("/admin/tools", get(routes::admin::tools))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
