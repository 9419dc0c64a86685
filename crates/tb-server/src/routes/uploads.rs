//! Multipart upload handlers for video files and thumbnails.

use std::io;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, Path, State};
use axum::{Extension, Json};
use bytes::BytesMut;
use futures::TryStreamExt;
use tb_core::{Error, ImageType, UserId};
use tb_db::models::Video;
use tb_pipeline::UploadRequest;
use tokio_util::io::StreamReader;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;
use crate::routes::videos::VideoResponse;
use crate::routes::{load_owned_video, parse_video_id};

/// Form field carrying the video file.
pub const VIDEO_FIELD: &str = "video";
/// Form field carrying the thumbnail image.
pub const THUMBNAIL_FIELD: &str = "thumbnail";

fn malformed(e: MultipartError) -> Error {
    Error::Validation(format!("malformed multipart body: {e}"))
}

fn missing_field(name: &str) -> Error {
    Error::Validation(format!("missing form field {name:?}"))
}

/// POST /api/video_upload/{id}
#[utoipa::path(
    post,
    path = "/api/video_upload/{id}",
    params(("id" = String, Path, description = "Video ID")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Upload stored and record updated", body = VideoResponse),
        (status = 400, description = "Malformed id or form"),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such video"),
        (status = 413, description = "File too large"),
        (status = 415, description = "Not video/mp4"),
        (status = 502, description = "ffprobe, ffmpeg or object storage failed")
    )
)]
pub async fn upload_video(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<VideoResponse>, AppError> {
    ingest_video(&ctx, user_id, &id, multipart)
        .await
        .map(|video| Json(VideoResponse::from_model(&video)))
        .map_err(|e| AppError::from(e).with_request_id(request_id.0))
}

async fn ingest_video(
    ctx: &AppContext,
    user_id: UserId,
    raw_id: &str,
    mut multipart: Multipart,
) -> Result<Video, Error> {
    let video_id = parse_video_id(raw_id)?;

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let body = StreamReader::new(Box::pin(field.map_err(io::Error::other)));
        let request = UploadRequest {
            video_id,
            principal: user_id,
            content_type,
            body,
        };

        // A client abort drops this future; shutdown cancels the token.
        let cancel = ctx.shutdown.child_token();
        return ctx.pipeline.ingest(request, &cancel).await;
    }

    Err(missing_field(VIDEO_FIELD))
}

/// POST /api/thumbnail_upload/{id}
#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{id}",
    params(("id" = String, Path, description = "Video ID")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored and record updated", body = VideoResponse),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such video"),
        (status = 413, description = "File too large"),
        (status = 415, description = "Not image/jpeg or image/png")
    )
)]
pub async fn upload_thumbnail(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Extension(request_id): Extension<RequestId>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<VideoResponse>, AppError> {
    store_thumbnail(&ctx, user_id, &id, multipart)
        .await
        .map(|video| Json(VideoResponse::from_model(&video)))
        .map_err(|e| AppError::from(e).with_request_id(request_id.0))
}

async fn store_thumbnail(
    ctx: &AppContext,
    user_id: UserId,
    raw_id: &str,
    mut multipart: Multipart,
) -> Result<Video, Error> {
    let video_id = parse_video_id(raw_id)?;
    let video = load_owned_video(&ctx.db, video_id, user_id)?;

    while let Some(mut field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let image = ImageType::from_content_type(&content_type).ok_or_else(|| {
            Error::UnsupportedMediaType(format!(
                "{content_type:?}; only image/jpeg and image/png are accepted"
            ))
        })?;
        let data = read_limited(&mut field, ctx.config.upload.max_thumbnail_bytes).await?;
        if data.is_empty() {
            return Err(Error::Validation("thumbnail is empty".into()));
        }

        let assets_root = &ctx.config.server.assets_root;
        tokio::fs::create_dir_all(assets_root).await?;
        let name = format!("{}.{}", tb_storage::random_id(), image.extension());
        let path = assets_root.join(&name);
        tokio::fs::write(&path, &data).await?;

        let url = format!(
            "{}/assets/{name}",
            ctx.config.server.public_url.trim_end_matches('/')
        );
        let conn = tb_db::pool::get_conn(&ctx.db)?;
        return match tb_db::queries::videos::set_thumbnail_url(&conn, video.id, &url) {
            Ok(stored) => {
                tracing::info!(video_id = %video_id, file = %name, bytes = data.len(), "Stored thumbnail");
                Ok(stored)
            }
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(path = %path.display(), error = %rm, "Failed to remove orphaned thumbnail");
                }
                Err(e)
            }
        };
    }

    Err(missing_field(THUMBNAIL_FIELD))
}

/// Buffer a field, failing once it grows past `limit` bytes.
async fn read_limited(field: &mut Field<'_>, limit: u64) -> Result<BytesMut, Error> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(malformed)? {
        if (buf.len() + chunk.len()) as u64 > limit {
            return Err(Error::PayloadTooLarge(format!(
                "thumbnail exceeds {limit} bytes"
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}
