//! Video record route handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use tb_core::{Error, UserId};

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::{load_owned_video, parse_video_id};

/// Request body for creating a video record.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateVideoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Video response.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct VideoResponse {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl VideoResponse {
    pub fn from_model(video: &tb_db::models::Video) -> Self {
        Self {
            id: video.id.to_string(),
            user_id: video.user_id.to_string(),
            title: video.title.clone(),
            description: video.description.clone(),
            thumbnail_url: video.thumbnail_url.clone(),
            video_url: video.video_url.clone(),
            created_at: video.created_at.clone(),
            updated_at: video.updated_at.clone(),
        }
    }
}

/// POST /api/videos
#[utoipa::path(
    post,
    path = "/api/videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Draft video created", body = VideoResponse),
        (status = 400, description = "Missing title"),
        (status = 401, description = "Missing or invalid token")
    )
)]
pub async fn create_video(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Json(payload): Json<CreateVideoRequest>,
) -> Result<impl IntoResponse, AppError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(Error::Validation("title is required".into()).into());
    }

    let conn = tb_db::pool::get_conn(&ctx.db)?;
    let video = tb_db::queries::videos::create_video(
        &conn,
        user_id,
        title,
        payload.description.as_deref(),
    )?;
    tracing::info!(video_id = %video.id, user_id = %user_id, "Created video record");

    Ok((StatusCode::CREATED, Json(VideoResponse::from_model(&video))))
}

/// GET /api/videos
#[utoipa::path(
    get,
    path = "/api/videos",
    responses((status = 200, description = "Caller's videos, newest first", body = Vec<VideoResponse>))
)]
pub async fn list_videos(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
) -> Result<Json<Vec<VideoResponse>>, AppError> {
    let conn = tb_db::pool::get_conn(&ctx.db)?;
    let videos = tb_db::queries::videos::list_videos_by_user(&conn, user_id)?;
    Ok(Json(videos.iter().map(VideoResponse::from_model).collect()))
}

/// GET /api/videos/{id}
#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    params(("id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video record", body = VideoResponse),
        (status = 403, description = "Owned by another user"),
        (status = 404, description = "No such video")
    )
)]
pub async fn get_video(
    State(ctx): State<AppContext>,
    Extension(user_id): Extension<UserId>,
    Path(id): Path<String>,
) -> Result<Json<VideoResponse>, AppError> {
    let video_id = parse_video_id(&id)?;
    let video = load_owned_video(&ctx.db, video_id, user_id)?;
    Ok(Json(VideoResponse::from_model(&video)))
}
