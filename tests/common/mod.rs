//! Shared test harness for integration tests.
//!
//! [`TestHarness`] wires a full [`AppContext`] against an in-memory
//! database, an in-memory object store, a fixed inspector and a byte-copying
//! normalizer, then serves it on a random port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use tb_av::{FixedInspector, PassthroughNormalizer, ToolRegistry, Workspace};
use tb_core::config::{Config, StorageBackend};
use tb_core::UserId;
use tb_db::models::Video;
use tb_db::pool::{get_conn, init_memory_pool, DbPool, PooledConnection};
use tb_pipeline::{IngestPipeline, SqliteVideoRepository};
use tb_server::context::AppContext;
use tb_storage::{ObjectStorage, ObjectStoreStorage};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub const CDN: &str = "https://cdn.example.com";
pub const SECRET: &str = "integration-test-secret";

/// A few bytes that look enough like an MP4 for the fakes.
pub const MP4_BYTES: &[u8] = b"\x00\x00\x00\x18ftypmp42\x00\x00\x00\x00mp42isom fake payload";

pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub storage: Arc<ObjectStoreStorage>,
    pub inspector: Arc<FixedInspector>,
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    workspace_dir: TempDir,
    assets_dir: TempDir,
}

impl TestHarness {
    /// Serve with an inspector reporting a 16:9 display aspect ratio.
    pub async fn start() -> Self {
        Self::with_inspector(FixedInspector::ratio("16:9")).await
    }

    pub async fn with_ratio(ratio: &str) -> Self {
        Self::with_inspector(FixedInspector::ratio(ratio)).await
    }

    pub async fn with_inspector(inspector: FixedInspector) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        let workspace_dir = tempfile::tempdir().unwrap();
        let assets_dir = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.server.public_url = format!("http://{addr}");
        config.server.assets_root = assets_dir.path().to_path_buf();
        config.auth.jwt_secret = Some(SECRET.into());
        config.storage.backend = StorageBackend::Memory;
        config.storage.public_base_url = Some(CDN.into());
        config.workspace.root = workspace_dir.path().to_path_buf();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let storage = Arc::new(ObjectStoreStorage::in_memory(CDN));
        let inspector = Arc::new(inspector);
        let pipeline = IngestPipeline::new(
            Workspace::new(workspace_dir.path()).unwrap(),
            inspector.clone(),
            Arc::new(PassthroughNormalizer::new()),
            storage.clone(),
            Arc::new(SqliteVideoRepository::new(db.clone())),
            config.upload.max_video_bytes,
        );

        let ctx = AppContext {
            db: db.clone(),
            tokens: AppContext::token_keys(&config),
            config: Arc::new(config),
            pipeline,
            storage: storage.clone(),
            tools: Arc::new(ToolRegistry::default()),
            shutdown: CancellationToken::new(),
        };

        tokio::spawn(tb_server::serve(listener, ctx.clone()));

        Self {
            ctx,
            db,
            storage,
            inspector,
            addr,
            client: reqwest::Client::new(),
            workspace_dir,
            assets_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn conn(&self) -> PooledConnection {
        get_conn(&self.db).unwrap()
    }

    pub fn token(&self, user_id: UserId) -> String {
        self.ctx.tokens.as_ref().unwrap().issue(user_id).unwrap()
    }

    /// Insert a draft video owned by `owner`.
    pub fn create_video(&self, owner: UserId) -> Video {
        tb_db::queries::videos::create_video(&self.conn(), owner, "clip", None).unwrap()
    }

    pub fn reload(&self, video: &Video) -> Video {
        tb_db::queries::videos::get_video(&self.conn(), video.id)
            .unwrap()
            .unwrap()
    }

    /// Number of scratch files currently in the workspace.
    pub fn scratch_files(&self) -> usize {
        std::fs::read_dir(self.workspace_dir.path()).unwrap().count()
    }

    pub fn assets_dir(&self) -> &std::path::Path {
        self.assets_dir.path()
    }

    pub async fn object_exists(&self, key: &str) -> bool {
        self.storage.exists(key).await.unwrap()
    }

    /// POST a multipart body with a single file part.
    pub async fn post_file(
        &self,
        path: &str,
        token: Option<&str>,
        field: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> reqwest::Response {
        let part = Part::bytes(bytes.to_vec())
            .file_name("upload.bin")
            .mime_str(content_type)
            .unwrap();
        let mut req = self
            .client
            .post(self.url(path))
            .multipart(Form::new().text("note", "ignored").part(field.to_string(), part));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.unwrap()
    }

    pub async fn upload_video(
        &self,
        token: &str,
        video: &Video,
        content_type: &str,
    ) -> reqwest::Response {
        self.post_file(
            &format!("/api/video_upload/{}", video.id),
            Some(token),
            "video",
            content_type,
            MP4_BYTES,
        )
        .await
    }
}

impl Drop for TestHarness {
    fn drop(&mut self) {
        self.ctx.shutdown.cancel();
    }
}
