//! Route handlers for the HTTP API.

pub mod health;
pub mod uploads;
pub mod videos;

use tb_core::{Error, UserId, VideoId};
use tb_db::models::Video;
use tb_db::pool::DbPool;

/// Parse a path segment as a [`VideoId`].
pub(crate) fn parse_video_id(raw: &str) -> Result<VideoId, Error> {
    raw.parse()
        .map_err(|_| Error::Validation(format!("invalid video id: {raw}")))
}

/// Load a video and check that `user_id` owns it.
pub(crate) fn load_owned_video(db: &DbPool, id: VideoId, user_id: UserId) -> Result<Video, Error> {
    let conn = tb_db::pool::get_conn(db)?;
    let video = tb_db::queries::videos::get_video(&conn, id)?
        .ok_or_else(|| Error::not_found("video", id))?;
    if !video.is_owned_by(user_id) {
        return Err(Error::Forbidden(format!("video {id} is not owned by {user_id}")));
    }
    Ok(video)
}
