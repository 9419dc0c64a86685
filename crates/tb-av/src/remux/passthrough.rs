//! Byte-copying [`MediaNormalizer`] for tests and tool-less environments.

use std::path::Path;

use async_trait::async_trait;

use super::MediaNormalizer;

/// Copies the input verbatim, or fails on demand.
#[derive(Debug, Clone, Default)]
pub struct PassthroughNormalizer {
    fail: bool,
}

impl PassthroughNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizer that writes partial output and then fails, like a crashed
    /// remux.
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl MediaNormalizer for PassthroughNormalizer {
    fn name(&self) -> &'static str {
        "passthrough"
    }

    async fn remux(&self, input: &Path, output: &Path) -> tb_core::Result<()> {
        if self.fail {
            tokio::fs::write(output, b"partial").await?;
            return Err(tb_core::Error::tool("passthrough", "simulated remux failure"));
        }
        tokio::fs::copy(input, output).await?;
        Ok(())
    }
}
