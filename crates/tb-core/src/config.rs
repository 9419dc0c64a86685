//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, auth, tools, storage, workspace and upload
//! limits. Every section defaults sensibly so a completely empty `{}` file is
//! valid. A handful of deployment secrets can be overridden from the
//! environment after loading, see [`Config::apply_env_overrides`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub tools: ToolsConfig,
    pub storage: StorageConfig,
    pub workspace: WorkspaceConfig,
    pub upload: UploadConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Apply `TUBELY_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using an arbitrary lookup function.
    ///
    /// Empty values are ignored. An unparsable `TUBELY_PORT` is logged and
    /// leaves the configured port in place.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(secret) = get("TUBELY_JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(bucket) = get("TUBELY_S3_BUCKET") {
            self.storage.bucket = Some(bucket);
        }
        if let Some(region) = get("TUBELY_S3_REGION") {
            self.storage.region = Some(region);
        }
        if let Some(url) = get("TUBELY_PUBLIC_BASE_URL") {
            self.storage.public_base_url = Some(url);
        }
        if let Some(port) = get("TUBELY_PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(e) => tracing::warn!("Ignoring TUBELY_PORT={port}: {e}"),
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        match self.auth.jwt_secret.as_deref() {
            None => warnings.push(
                "auth.jwt_secret is not set; authenticated routes will reject every request"
                    .into(),
            ),
            Some(s) if s.len() < 16 => {
                warnings.push("auth.jwt_secret is shorter than 16 bytes".into())
            }
            Some(_) => {}
        }

        if self.storage.backend == StorageBackend::S3 {
            if self.storage.bucket.as_deref().unwrap_or("").is_empty() {
                warnings.push("storage.backend is s3 but storage.bucket is not set".into());
            }
            if self.storage.region.is_none() {
                warnings.push("storage.backend is s3 but storage.region is not set".into());
            }
        }

        if self.upload.max_video_bytes == 0 {
            warnings.push("upload.max_video_bytes is 0; every video upload will fail".into());
        }

        if self.tools.timeout_secs == Some(0) {
            warnings.push("tools.timeout_secs is 0; every tool invocation will time out".into());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Directory holding thumbnails, served under `/assets`.
    pub assets_root: PathBuf,
    /// Externally reachable base URL of this server (no trailing slash).
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8091,
            db_path: PathBuf::from("./data/tubely.db"),
            assets_root: PathBuf::from("./assets"),
            public_url: "http://localhost:8091".into(),
        }
    }
}

/// Bearer-token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign and verify HS256 tokens.
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl_hours: 24,
        }
    }
}

/// Paths to external CLI tools.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
    /// Upper bound on each tool invocation. Unbounded when unset.
    pub timeout_secs: Option<u64>,
}

/// Which object store implementation backs durable storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    #[default]
    Local,
    Memory,
}

/// Object storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub bucket: Option<String>,
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible stores (MinIO, R2, ...).
    pub endpoint: Option<String>,
    /// Root directory for the `local` backend.
    pub local_root: PathBuf,
    /// Base URL that object keys are appended to when building public URLs,
    /// typically a CDN distribution.
    pub public_base_url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Local,
            bucket: None,
            region: None,
            endpoint: None,
            local_root: PathBuf::from("./data/objects"),
            public_base_url: None,
        }
    }
}

/// Scratch space for in-flight uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub root: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: std::env::temp_dir().join("tubely"),
        }
    }
}

/// Request body limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_video_bytes: u64,
    pub max_thumbnail_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_video_bytes: 1 << 30,
            max_thumbnail_bytes: 10 << 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8091);
        assert_eq!(cfg.auth.token_ttl_hours, 24);
        assert_eq!(cfg.storage.backend, StorageBackend::Local);
        assert_eq!(cfg.upload.max_video_bytes, 1024 * 1024 * 1024);
        assert_eq!(cfg.upload.max_thumbnail_bytes, 10 * 1024 * 1024);
        assert!(cfg.tools.timeout_secs.is_none());
    }

    #[test]
    fn default_config_warns_only_about_secret() {
        let cfg = Config::default();
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 1, "unexpected warnings: {:?}", warnings);
        assert!(warnings[0].contains("jwt_secret"));
    }

    #[test]
    fn configured_secret_has_no_warnings() {
        let mut cfg = Config::default();
        cfg.auth.jwt_secret = Some("a-sufficiently-long-secret".into());
        let warnings = cfg.validate();
        assert!(warnings.is_empty(), "unexpected warnings: {:?}", warnings);
    }

    #[test]
    fn short_secret_warns() {
        let mut cfg = Config::default();
        cfg.auth.jwt_secret = Some("short".into());
        assert!(cfg.validate().iter().any(|w| w.contains("shorter")));
    }

    #[test]
    fn s3_without_bucket_warns() {
        let mut cfg = Config::default();
        cfg.auth.jwt_secret = Some("a-sufficiently-long-secret".into());
        cfg.storage.backend = StorageBackend::S3;
        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("storage.bucket")));
        assert!(warnings.iter().any(|w| w.contains("storage.region")));
    }

    #[test]
    fn parse_json_config() {
        let json = r#"{
            "server": {"port": 9090},
            "storage": {"backend": "s3", "bucket": "tubely-media", "region": "us-east-2"},
            "tools": {"timeout_secs": 120}
        }"#;
        let cfg = Config::from_json(json).unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.storage.backend, StorageBackend::S3);
        assert_eq!(cfg.storage.bucket.as_deref(), Some("tubely-media"));
        assert_eq!(cfg.tools.timeout_secs, Some(120));
        // untouched sections keep their defaults
        assert_eq!(cfg.upload.max_video_bytes, 1 << 30);
    }

    #[test]
    fn parse_empty_json_uses_defaults() {
        let cfg = Config::from_json("{}").unwrap();
        assert_eq!(cfg.server.port, 8091);
        assert_eq!(cfg.storage.local_root, PathBuf::from("./data/objects"));
    }

    #[test]
    fn parse_invalid_json_is_validation_error() {
        let err = Config::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn unknown_backend_rejected() {
        assert!(Config::from_json(r#"{"storage": {"backend": "gcs"}}"#).is_err());
    }

    #[test]
    fn load_or_default_with_none() {
        let cfg = Config::load_or_default(None);
        assert_eq!(cfg.server.port, 8091);
    }

    #[test]
    fn load_or_default_with_missing_file() {
        let cfg = Config::load_or_default(Some(Path::new("/nonexistent/tubely.json")));
        assert_eq!(cfg.server.port, 8091);
    }

    #[test]
    fn load_or_default_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tubely.json");
        std::fs::write(&path, r#"{"workspace": {"root": "/srv/tubely/tmp"}}"#).unwrap();
        let cfg = Config::load_or_default(Some(&path));
        assert_eq!(cfg.workspace.root, PathBuf::from("/srv/tubely/tmp"));
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = Config::default();
        cfg.apply_overrides_from(lookup(&[
            ("TUBELY_JWT_SECRET", "from-the-environment"),
            ("TUBELY_S3_BUCKET", "bucket-a"),
            ("TUBELY_S3_REGION", "eu-west-1"),
            ("TUBELY_PUBLIC_BASE_URL", "https://d111.cloudfront.net"),
            ("TUBELY_PORT", "9000"),
        ]));
        assert_eq!(cfg.auth.jwt_secret.as_deref(), Some("from-the-environment"));
        assert_eq!(cfg.storage.bucket.as_deref(), Some("bucket-a"));
        assert_eq!(cfg.storage.region.as_deref(), Some("eu-west-1"));
        assert_eq!(
            cfg.storage.public_base_url.as_deref(),
            Some("https://d111.cloudfront.net")
        );
        assert_eq!(cfg.server.port, 9000);
    }

    #[test]
    fn env_overrides_skip_empty_and_bad_values() {
        let mut cfg = Config::default();
        cfg.auth.jwt_secret = Some("configured".into());
        cfg.apply_overrides_from(lookup(&[
            ("TUBELY_JWT_SECRET", "  "),
            ("TUBELY_PORT", "not-a-port"),
        ]));
        assert_eq!(cfg.auth.jwt_secret.as_deref(), Some("configured"));
        assert_eq!(cfg.server.port, 8091);
    }
}
