//! tb-server: HTTP API for tubely.
//!
//! Ties the other tb-* crates into a running server:
//!
//! - Axum routes for video records, video upload and thumbnail upload
//! - Bearer-JWT authentication and request-id tracing
//! - Static serving for thumbnails and locally stored objects
//! - Graceful shutdown that cancels in-flight ingests

pub mod context;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod tokens;

use std::net::SocketAddr;
use std::sync::Arc;

use tb_av::{FfprobeInspector, FfmpegNormalizer, ToolRegistry, Workspace};
use tb_core::config::Config;
use tb_pipeline::{IngestPipeline, SqliteVideoRepository};
use tb_storage::ObjectStorage;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;

/// Build the [`AppContext`] for `config` against real ffmpeg/ffprobe.
///
/// Fails if either tool is missing, if the database cannot be opened, or
/// if the storage backend is misconfigured.
pub fn build_context(config: Config) -> tb_core::Result<AppContext> {
    let tools = Arc::new(ToolRegistry::discover(&config.tools));
    for info in tools.check_all() {
        if info.available {
            tracing::info!(
                "Tool found: {} ({})",
                info.name,
                info.version.as_deref().unwrap_or("unknown version")
            );
        } else {
            tracing::error!("Tool not found: {}", info.name);
        }
    }
    tools.ensure_required()?;

    let db_path = &config.server.db_path;
    let existed = db_path.exists();
    let db = tb_db::pool::init_pool(db_path)?;
    if existed {
        tracing::info!("Database opened (existing) at {}", db_path.display());
    } else {
        tracing::info!("Database created (new) at {}", db_path.display());
    }

    let storage: Arc<dyn ObjectStorage> = Arc::new(tb_storage::build_storage(
        &config.storage,
        &config.server.public_url,
    )?);
    tracing::info!(backend = storage.backend(), "Object storage ready");

    let workspace = Workspace::new(config.workspace.root.clone())?;
    tracing::info!("Scratch workspace at {}", workspace.root().display());

    let pipeline = IngestPipeline::new(
        workspace,
        Arc::new(FfprobeInspector::from_registry(&tools)?),
        Arc::new(FfmpegNormalizer::from_registry(&tools)?),
        storage.clone(),
        Arc::new(SqliteVideoRepository::new(db.clone())),
        config.upload.max_video_bytes,
    );

    Ok(AppContext {
        db,
        tokens: AppContext::token_keys(&config),
        config: Arc::new(config),
        pipeline,
        storage,
        tools,
        shutdown: CancellationToken::new(),
    })
}

/// Start the tubely server and run until a shutdown signal arrives.
pub async fn start(config: Config) -> tb_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| tb_core::Error::Internal(format!("Invalid server address: {e}")))?;

    let ctx = build_context(config)?;

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| tb_core::Error::Internal(format!("Failed to bind to {addr}: {e}")))?;
    tracing::info!("Starting server on {addr}");

    serve(listener, ctx).await?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Serve `ctx` on an already-bound listener until the context's shutdown
/// token is cancelled or a signal is received.
pub async fn serve(listener: TcpListener, ctx: AppContext) -> tb_core::Result<()> {
    let shutdown = ctx.shutdown.clone();
    let app = router::build_router(ctx);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .map_err(|e| tb_core::Error::Internal(format!("Server error: {e}")))
}

/// Wait for SIGINT, SIGTERM or `cancel`, then cancel `cancel` so that
/// in-flight ingests stop and release their scratch files.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
        _ = cancel.cancelled() => {}
    }

    tracing::info!("Shutdown signal received");
    cancel.cancel();
}
