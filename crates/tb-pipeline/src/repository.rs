//! Metadata access used by the pipeline.

use async_trait::async_trait;
use tb_core::{Error, Result, VideoId};
use tb_db::models::Video;
use tb_db::pool::{get_conn, DbPool};
use tb_db::queries::videos;

/// Read and write video records.
///
/// Implementations provide per-record atomic updates; the pipeline holds no
/// locks of its own.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn get(&self, id: VideoId) -> Result<Option<Video>>;

    /// Set only the record's media URL, returning the stored record.
    /// Other columns written since the run began are preserved.
    async fn set_video_url(&self, id: VideoId, url: &str) -> Result<Video>;
}

/// [`VideoRepository`] over the SQLite pool.
#[derive(Clone)]
pub struct SqliteVideoRepository {
    pool: DbPool,
}

impl SqliteVideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DbPool) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || f(&pool))
            .await
            .map_err(|e| Error::Internal(format!("spawn_blocking join error: {e}")))?
    }
}

#[async_trait]
impl VideoRepository for SqliteVideoRepository {
    async fn get(&self, id: VideoId) -> Result<Option<Video>> {
        self.blocking(move |pool| {
            let conn = get_conn(pool)?;
            videos::get_video(&conn, id)
        })
        .await
    }

    async fn set_video_url(&self, id: VideoId, url: &str) -> Result<Video> {
        let url = url.to_string();
        self.blocking(move |pool| {
            let conn = get_conn(pool)?;
            videos::set_video_url(&conn, id, &url)
        })
        .await
    }
}
