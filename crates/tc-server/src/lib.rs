//! tc-server: HTTP surface and process wiring for tunecast.
//!
//! - Axum routes for adaptive streaming, play redirects and transcodes
//! - SQLite-backed catalog
//! - Background reaper for unused stream directories
//! - Graceful shutdown that kills running encoders

pub mod context;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use tc_av::ToolRegistry;
use tc_core::config::Config;
use tc_db::SqliteCatalog;
use tokio_util::sync::CancellationToken;

pub use context::AppContext;
pub use error::AppError;
pub use router::build_router;

/// Start the tunecast server.
///
/// Opens the catalog, discovers tools, spawns the reaper, and serves HTTP
/// until a shutdown signal arrives. Shutdown cancels every running encoder.
pub async fn start(config: Config) -> tc_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    let pool = tc_db::init_pool(db_path)?;
    if existed {
        tracing::info!("Database opened (existing) at {}", db_path.display());
    } else {
        tracing::info!("Database created (new) at {}", db_path.display());
    }

    let tools = Arc::new(ToolRegistry::discover(&config.tools));
    for info in tools.check_all() {
        if info.available {
            tracing::info!(
                "Tool found: {} ({})",
                info.name,
                info.version.as_deref().unwrap_or("unknown version")
            );
        } else {
            tracing::warn!("Tool not found: {}", info.name);
        }
    }

    let cancel = CancellationToken::new();
    let ctx = AppContext::with_ffmpeg(
        config.clone(),
        Arc::new(SqliteCatalog::new(pool)),
        tools,
        cancel.clone(),
    );

    let reaper_handle = (config.reaper.enabled && config.reaper.interval_secs > 0).then(|| {
        tc_stream::spawn_reaper(
            &config.storage.hls_dir,
            config.reaper.interval(),
            config.reaper.ttl(),
            cancel.clone(),
        )
    });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| tc_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let app = build_router(ctx);

    tracing::info!("Starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| tc_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await
        .map_err(|e| tc_core::Error::Internal(format!("Server error: {e}")))?;

    if let Some(handle) = reaper_handle {
        let _ = handle.await;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM) or cancellation.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
    // Releases readiness waits and kills encoders so connections can drain.
    cancel.cancel();
}
