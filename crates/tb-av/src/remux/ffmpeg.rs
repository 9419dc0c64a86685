//! Faststart remux using ffmpeg.

use std::path::Path;

use async_trait::async_trait;

use super::MediaNormalizer;
use crate::tools::{ToolConfig, ToolRegistry};

/// Copies all streams into a fresh MP4 with `+faststart`, which moves the
/// `moov` atom ahead of the media data.
#[derive(Debug, Clone)]
pub struct FfmpegNormalizer {
    tool: ToolConfig,
}

impl FfmpegNormalizer {
    pub fn new(tool: ToolConfig) -> Self {
        Self { tool }
    }

    /// Build from a registry, failing if ffmpeg was not discovered.
    pub fn from_registry(tools: &ToolRegistry) -> tb_core::Result<Self> {
        Ok(Self::new(tools.require("ffmpeg")?.clone()))
    }
}

/// Argument list for a stream-copy faststart remux.
///
/// The output carries a non-media suffix, so the muxer is named explicitly.
pub(crate) fn faststart_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-c".into(),
        "copy".into(),
        "-movflags".into(),
        "+faststart".into(),
        "-f".into(),
        "mp4".into(),
        output.to_string_lossy().into_owned(),
    ]
}

#[async_trait]
impl MediaNormalizer for FfmpegNormalizer {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn remux(&self, input: &Path, output: &Path) -> tb_core::Result<()> {
        tracing::info!("remux {} -> {}", input.display(), output.display());

        let mut cmd = self.tool.command();
        cmd.args(faststart_args(input, output));
        cmd.execute().await?;
        Ok(())
    }
}
