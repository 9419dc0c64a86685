//! The ingestion orchestrator.
//!
//! A run moves through [`IngestState`] in order and stops at the first
//! failure. Scratch files are RAII guards owned by the run, so they are gone
//! by the time [`IngestPipeline::ingest`] returns on every path, including
//! cancellation (the future is dropped) and panics (the guards unwind).

use std::future::Future;
use std::sync::Arc;

use tb_av::{MediaInspector, MediaNormalizer, Workspace};
use tb_core::{Error, Orientation, Result, UserId, VideoId, ACCEPTED_VIDEO_TYPE};
use tb_db::models::Video;
use tb_storage::{derive_key, ObjectStorage, StorageKey};
use tokio::io::AsyncRead;
use tokio_util::sync::CancellationToken;

use crate::repository::VideoRepository;
use crate::state::IngestState;

/// One upload, as received at the HTTP boundary.
pub struct UploadRequest<R> {
    pub video_id: VideoId,
    /// The authenticated caller.
    pub principal: UserId,
    /// Content type declared for the uploaded part.
    pub content_type: String,
    pub body: R,
}

/// Sequences staging, probing, normalization, upload and commit.
#[derive(Clone)]
pub struct IngestPipeline {
    workspace: Workspace,
    inspector: Arc<dyn MediaInspector>,
    normalizer: Arc<dyn MediaNormalizer>,
    storage: Arc<dyn ObjectStorage>,
    repo: Arc<dyn VideoRepository>,
    max_bytes: u64,
}

impl IngestPipeline {
    pub fn new(
        workspace: Workspace,
        inspector: Arc<dyn MediaInspector>,
        normalizer: Arc<dyn MediaNormalizer>,
        storage: Arc<dyn ObjectStorage>,
        repo: Arc<dyn VideoRepository>,
        max_bytes: u64,
    ) -> Self {
        Self {
            workspace,
            inspector,
            normalizer,
            storage,
            repo,
            max_bytes,
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Run one upload to completion, returning the committed record.
    ///
    /// Errors carry their fault class: rejected input before any file is
    /// created, tool, disk and storage faults after staging, and
    /// [`Error::Commit`] when the object was stored but the record could not
    /// be updated. In that last case one delete of the new object is
    /// attempted before returning.
    pub async fn ingest<R>(
        &self,
        request: UploadRequest<R>,
        cancel: &CancellationToken,
    ) -> Result<Video>
    where
        R: AsyncRead + Send + Unpin,
    {
        let video_id = request.video_id;
        let principal = request.principal;
        let mut state = IngestState::Validating;

        let result = self.run(request, cancel, &mut state).await;
        match &result {
            Ok(video) => tracing::info!(
                video_id = %video_id,
                user_id = %principal,
                url = video.video_url.as_deref().unwrap_or(""),
                "Ingest complete"
            ),
            Err(e) => tracing::warn!(
                video_id = %video_id,
                user_id = %principal,
                state = %state,
                error = %e,
                "Ingest failed"
            ),
        }
        result
    }

    async fn run<R>(
        &self,
        request: UploadRequest<R>,
        cancel: &CancellationToken,
        state: &mut IngestState,
    ) -> Result<Video>
    where
        R: AsyncRead + Send + Unpin,
    {
        let UploadRequest {
            video_id,
            principal,
            content_type,
            mut body,
        } = request;

        // -- Validating ------------------------------------------------------
        let video = self
            .repo
            .get(video_id)
            .await?
            .ok_or_else(|| Error::not_found("video", video_id))?;
        if !video.is_owned_by(principal) {
            return Err(Error::Forbidden(format!(
                "video {video_id} is not owned by {principal}"
            )));
        }
        if !tb_core::is_accepted_video(&content_type) {
            return Err(Error::UnsupportedMediaType(format!(
                "{content_type:?}; only {ACCEPTED_VIDEO_TYPE} is accepted"
            )));
        }
        let extension = tb_core::extension_for(ACCEPTED_VIDEO_TYPE)
            .ok_or_else(|| Error::Internal("accepted video type has no extension".into()))?;

        // -- Staged ------------------------------------------------------------
        let mut staged = self.workspace.acquire()?;
        let bytes = until_cancelled(
            cancel,
            *state,
            staged.promote(&mut body, self.max_bytes),
        )
        .await?;
        advance(state, IngestState::Staged, video_id);
        tracing::debug!(video_id = %video_id, bytes, path = %staged.path().display(), "Upload staged");

        // -- Classified ----------------------------------------------------------
        let geometry =
            until_cancelled(cancel, *state, self.inspector.inspect(staged.path())).await?;
        let orientation = Orientation::classify(&geometry.display_aspect_ratio);
        advance(state, IngestState::Classified, video_id);
        tracing::info!(
            video_id = %video_id,
            ratio = %geometry.display_aspect_ratio,
            orientation = %orientation,
            "Classified upload"
        );

        // -- Normalized ----------------------------------------------------------
        staged.rewind().await?;
        let mut normalized =
            until_cancelled(cancel, *state, self.normalizer.normalize(&staged)).await?;
        advance(state, IngestState::Normalized, video_id);

        // -- Uploaded ------------------------------------------------------------
        let key = derive_key(orientation, &extension)?;
        let mut reader = tokio::fs::File::open(normalized.path()).await?;
        until_cancelled(cancel, *state, async {
            self.storage
                .upload(key.as_str(), &mut reader, ACCEPTED_VIDEO_TYPE)
                .await
                .map_err(Error::from)
        })
        .await?;
        drop(reader);
        advance(state, IngestState::Uploaded, video_id);

        // The object is durable now; a scratch removal fault must not fail the run.
        if let Err(e) = normalized.release().and(staged.release()) {
            tracing::warn!(video_id = %video_id, error = %e, "Failed to release scratch files");
        }

        // -- Committed -----------------------------------------------------------
        // Not raced against cancellation: the object already exists.
        let url = self.storage.public_url(key.as_str());
        let committed = match self.repo.set_video_url(video.id, &url).await {
            Ok(v) => v,
            Err(e) => return Err(self.compensate(&key, e).await),
        };
        advance(state, IngestState::Committed, video_id);

        Ok(committed)
    }

    /// Remove an object whose record update failed.
    async fn compensate(&self, key: &StorageKey, cause: Error) -> Error {
        tracing::error!(key = %key, error = %cause, "Commit failed after upload; deleting object");
        if let Err(e) = self.storage.delete(key.as_str()).await {
            tracing::error!(key = %key, error = %e, "Compensating delete failed; object is orphaned");
        }
        Error::commit(key.as_str(), cause.to_string())
    }
}

fn advance(state: &mut IngestState, next: IngestState, video_id: VideoId) {
    tracing::info!(video_id = %video_id, from = %state, to = %next, "Ingest state");
    *state = next;
}

/// Await `fut` unless `cancel` fires first. Dropping `fut` kills any child
/// process it spawned and aborts any in-flight multipart upload.
async fn until_cancelled<T, F>(cancel: &CancellationToken, state: IngestState, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::pipeline(state.as_str(), "cancelled")),
        res = fut => res,
    }
}
