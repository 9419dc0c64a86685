//! [`ObjectStorage`] over the `object_store` crate.
//!
//! One implementation serves every backend: `AmazonS3` (plus S3-compatible
//! endpoints), `LocalFileSystem` and `InMemory`. Uploads stream through
//! [`WriteMultipart`], so a file is never held in memory whole, and an upload
//! that fails part way is aborted instead of leaving a visible object.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{
    Attribute, Attributes, ObjectStore, PutMultipartOpts, RetryConfig, WriteMultipart,
};
use tb_core::config::{StorageBackend, StorageConfig};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::traits::{ObjectStorage, StorageError, StorageResult};

const READ_BUF_BYTES: usize = 64 * 1024;
/// In-flight part uploads allowed before `write` waits.
const MAX_IN_FLIGHT_PARTS: usize = 4;

/// Storage backed by any [`ObjectStore`].
#[derive(Debug, Clone)]
pub struct ObjectStoreStorage {
    store: Arc<dyn ObjectStore>,
    backend: &'static str,
    public_base_url: String,
    /// The local filesystem store cannot persist attributes.
    content_type_attribute: bool,
}

impl ObjectStoreStorage {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        backend: &'static str,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            backend,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            content_type_attribute: true,
        }
    }

    /// Volatile storage for tests and demos.
    pub fn in_memory(public_base_url: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemory::new()), "memory", public_base_url)
    }

    /// Objects written under `root`, which is created if missing.
    pub fn local(root: &Path, public_base_url: impl Into<String>) -> StorageResult<Self> {
        std::fs::create_dir_all(root)?;
        let store = LocalFileSystem::new_with_prefix(root)
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        let mut storage = Self::new(Arc::new(store), "local", public_base_url);
        storage.content_type_attribute = false;
        Ok(storage)
    }

    /// S3 or an S3-compatible store. Credentials come from the standard AWS
    /// environment variables.
    pub fn s3(
        bucket: &str,
        region: &str,
        endpoint: Option<&str>,
        public_base_url: impl Into<String>,
    ) -> StorageResult<Self> {
        let store = s3_builder(AmazonS3Builder::from_env(), bucket, region, endpoint)
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;
        Ok(Self::new(Arc::new(store), "s3", public_base_url))
    }

    fn location(key: &str) -> StorageResult<ObjectPath> {
        ObjectPath::parse(key).map_err(|e| StorageError::InvalidKey(format!("{key}: {e}")))
    }

    fn put_options(&self, content_type: &str) -> PutMultipartOpts {
        let mut attributes = Attributes::new();
        if self.content_type_attribute {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
        }
        PutMultipartOpts {
            attributes,
            ..Default::default()
        }
    }

    async fn stream_parts(
        writer: &mut WriteMultipart,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> StorageResult<u64> {
        let mut buf = vec![0u8; READ_BUF_BYTES];
        let mut sent = 0u64;
        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                return Ok(sent);
            }
            writer
                .wait_for_capacity(MAX_IN_FLIGHT_PARTS)
                .await
                .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
            writer.write(&buf[..n]);
            sent += n as u64;
        }
    }
}

/// Retry policy for S3 requests: one attempt, errors surface immediately.
fn single_attempt() -> RetryConfig {
    RetryConfig {
        max_retries: 0,
        ..Default::default()
    }
}

fn s3_builder(
    base: AmazonS3Builder,
    bucket: &str,
    region: &str,
    endpoint: Option<&str>,
) -> AmazonS3Builder {
    let mut builder = base
        .with_region(region)
        .with_bucket_name(bucket)
        .with_retry(single_attempt());

    if let Some(endpoint) = endpoint {
        builder = builder
            .with_endpoint(endpoint)
            .with_allow_http(endpoint.starts_with("http://"));
    }
    builder
}

/// Build the configured backend.
///
/// When `public_base_url` is not configured, URLs fall back to the S3
/// virtual-hosted form (or `{endpoint}/{bucket}`), to `{server_url}/objects`
/// for the local backend, and to `memory://tubely` in memory.
pub fn build_storage(cfg: &StorageConfig, server_url: &str) -> StorageResult<ObjectStoreStorage> {
    let server_url = server_url.trim_end_matches('/');
    match cfg.backend {
        StorageBackend::S3 => {
            let bucket = cfg
                .bucket
                .as_deref()
                .filter(|b| !b.is_empty())
                .ok_or_else(|| StorageError::ConfigError("storage.bucket is required for s3".into()))?;
            let region = cfg.region.as_deref().unwrap_or("us-east-1");
            let base = match (&cfg.public_base_url, &cfg.endpoint) {
                (Some(url), _) => url.clone(),
                (None, Some(endpoint)) => {
                    format!("{}/{}", endpoint.trim_end_matches('/'), bucket)
                }
                (None, None) => format!("https://{bucket}.s3.{region}.amazonaws.com"),
            };
            ObjectStoreStorage::s3(bucket, region, cfg.endpoint.as_deref(), base)
        }
        StorageBackend::Local => {
            let base = cfg
                .public_base_url
                .clone()
                .unwrap_or_else(|| format!("{server_url}/objects"));
            ObjectStoreStorage::local(&cfg.local_root, base)
        }
        StorageBackend::Memory => {
            let base = cfg
                .public_base_url
                .clone()
                .unwrap_or_else(|| "memory://tubely".into());
            Ok(ObjectStoreStorage::in_memory(base))
        }
    }
}

#[async_trait]
impl ObjectStorage for ObjectStoreStorage {
    fn backend(&self) -> &'static str {
        self.backend
    }

    async fn upload(
        &self,
        key: &str,
        reader: &mut (dyn AsyncRead + Send + Unpin),
        content_type: &str,
    ) -> StorageResult<u64> {
        let location = Self::location(key)?;
        let start = Instant::now();

        let upload = self
            .store
            .put_multipart_opts(&location, self.put_options(content_type))
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        let mut writer = WriteMultipart::new(upload);

        let sent = match Self::stream_parts(&mut writer, reader).await {
            Ok(sent) => sent,
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(key = %key, error = %abort_err, "Failed to abort multipart upload");
                }
                tracing::error!(
                    backend = self.backend,
                    key = %key,
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object upload failed"
                );
                return Err(e);
            }
        };

        writer.finish().await.map_err(|e| {
            tracing::error!(
                backend = self.backend,
                key = %key,
                size_bytes = sent,
                error = %e,
                "Object upload failed to complete"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            backend = self.backend,
            key = %key,
            content_type = %content_type,
            size_bytes = sent,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );
        Ok(sent)
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let location = Self::location(key)?;
        match self.store.delete(&location).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => {
                tracing::info!(backend = self.backend, key = %key, "Object deleted");
                Ok(())
            }
            Err(e) => Err(StorageError::DeleteFailed(e.to_string())),
        }
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let location = Self::location(key)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}
