//! Video record CRUD operations.

use chrono::Utc;
use rusqlite::Connection;
use tb_core::{Error, Result, UserId, VideoId};

use crate::models::Video;

const COLS: &str =
    "id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at";

/// Create a draft video record with no media attached.
pub fn create_video(
    conn: &Connection,
    user_id: UserId,
    title: &str,
    description: Option<&str>,
) -> Result<Video> {
    let id = VideoId::new();
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO videos (id, user_id, title, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
        rusqlite::params![id.to_string(), user_id.to_string(), title, description, now],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Video {
        id,
        user_id,
        title: title.to_string(),
        description: description.map(String::from),
        thumbnail_url: None,
        video_url: None,
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Get a video by ID.
pub fn get_video(conn: &Connection, id: VideoId) -> Result<Option<Video>> {
    let q = format!("SELECT {COLS} FROM videos WHERE id = ?1");
    match conn.query_row(&q, [id.to_string()], Video::from_row) {
        Ok(video) => Ok(Some(video)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List a user's videos, newest first.
pub fn list_videos_by_user(conn: &Connection, user_id: UserId) -> Result<Vec<Video>> {
    let q = format!("SELECT {COLS} FROM videos WHERE user_id = ?1 ORDER BY created_at DESC");
    let mut stmt = conn.prepare(&q).map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([user_id.to_string()], Video::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Point a video at its uploaded media, leaving every other column as is.
///
/// Returns the stored record, or [`Error::NotFound`] if no row matched.
pub fn set_video_url(conn: &Connection, id: VideoId, url: &str) -> Result<Video> {
    set_url_column(conn, id, "video_url", url)
}

/// Point a video at its thumbnail, leaving every other column as is.
pub fn set_thumbnail_url(conn: &Connection, id: VideoId, url: &str) -> Result<Video> {
    set_url_column(conn, id, "thumbnail_url", url)
}

/// `column` is one of the fixed names above, never caller input.
fn set_url_column(conn: &Connection, id: VideoId, column: &str, url: &str) -> Result<Video> {
    let now = Utc::now().to_rfc3339();
    let q = format!("UPDATE videos SET {column} = ?2, updated_at = ?3 WHERE id = ?1");
    let n = conn
        .execute(&q, rusqlite::params![id.to_string(), url, now])
        .map_err(|e| Error::database(e.to_string()))?;

    if n == 0 {
        return Err(Error::not_found("video", id));
    }

    get_video(conn, id)?.ok_or_else(|| Error::not_found("video", id))
}

/// Delete a video by ID.
pub fn delete_video(conn: &Connection, id: VideoId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM videos WHERE id = ?1", [id.to_string()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
