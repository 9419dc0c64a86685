//! Container normalization for progressive playback.
//!
//! A [`MediaNormalizer`] rewrites a staged upload so its index sits at the
//! front of the file. Output always lands in the [`NormalizedFile`] guard
//! derived from the staged file, which exists before the tool runs.

pub mod ffmpeg;
pub mod passthrough;

use std::path::Path;

use async_trait::async_trait;

use crate::workspace::{NormalizedFile, StagedFile};

pub use self::ffmpeg::FfmpegNormalizer;
pub use self::passthrough::PassthroughNormalizer;

/// Rewrites media containers without re-encoding.
#[async_trait]
pub trait MediaNormalizer: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Write a normalized copy of `input` to `output`.
    async fn remux(&self, input: &Path, output: &Path) -> tb_core::Result<()>;

    /// Normalize a staged upload into its sibling output.
    ///
    /// On any failure the returned guard is dropped, removing whatever the
    /// tool left behind.
    async fn normalize(&self, staged: &StagedFile) -> tb_core::Result<NormalizedFile> {
        let output = staged.normalized_sibling();
        self.remux(staged.path(), output.path()).await?;
        output.ensure_written().await?;
        Ok(output)
    }
}
