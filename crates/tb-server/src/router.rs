//! Axum router construction.
//!
//! Builds the full application router with the API routes, middleware
//! layers, and static serving for thumbnails and locally stored objects.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::{Json, Router};
use tb_core::config::StorageBackend;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health_check,
        routes::videos::create_video,
        routes::videos::list_videos,
        routes::videos::get_video,
        routes::uploads::upload_video,
        routes::uploads::upload_thumbnail,
    ),
    components(schemas(
        routes::health::HealthResponse,
        routes::videos::CreateVideoRequest,
        routes::videos::VideoResponse,
    ))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn body_limit(bytes: u64) -> usize {
    usize::try_from(bytes.saturating_add(MULTIPART_OVERHEAD)).unwrap_or(usize::MAX)
}

/// Swap axum's default body cap for one sized to the upload limit.
fn limited(routes: Router<AppContext>, max_bytes: u64) -> Router<AppContext> {
    routes
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit(max_bytes)))
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload = &ctx.config.upload;
    let protected_routes = Router::new()
        .route(
            "/videos",
            get(routes::videos::list_videos).post(routes::videos::create_video),
        )
        .route("/videos/{id}", get(routes::videos::get_video))
        .merge(limited(
            Router::new().route("/video_upload/{id}", post(routes::uploads::upload_video)),
            upload.max_video_bytes,
        ))
        .merge(limited(
            Router::new().route(
                "/thumbnail_upload/{id}",
                post(routes::uploads::upload_thumbnail),
            ),
            upload.max_thumbnail_bytes,
        ))
        .layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", protected_routes)
        .nest_service("/assets", ServeDir::new(&ctx.config.server.assets_root));

    if ctx.config.storage.backend == StorageBackend::Local {
        tracing::info!(
            "Serving stored objects from {}",
            ctx.config.storage.local_root.display()
        );
        app = app.nest_service("/objects", ServeDir::new(&ctx.config.storage.local_root));
    }

    app.layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
