//! Application context shared by every route handler via Axum state.

use std::sync::Arc;

use tb_av::ToolRegistry;
use tb_core::config::Config;
use tb_db::pool::DbPool;
use tb_pipeline::IngestPipeline;
use tb_storage::ObjectStorage;
use tokio_util::sync::CancellationToken;

use crate::tokens::TokenKeys;

/// Immutable infrastructure for the HTTP layer. Cheap to clone.
#[derive(Clone)]
pub struct AppContext {
    pub db: DbPool,
    pub config: Arc<Config>,
    pub pipeline: IngestPipeline,
    pub storage: Arc<dyn ObjectStorage>,
    pub tools: Arc<ToolRegistry>,
    /// `None` when no secret is configured; every protected route then
    /// answers 401.
    pub tokens: Option<Arc<TokenKeys>>,
    /// Cancelled on server shutdown; in-flight ingests observe it.
    pub shutdown: CancellationToken,
}

impl AppContext {
    /// Token keys built from `config.auth`, if a secret is set.
    pub fn token_keys(config: &Config) -> Option<Arc<TokenKeys>> {
        config
            .auth
            .jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|secret| Arc::new(TokenKeys::new(secret, config.auth.token_ttl_hours)))
    }
}
