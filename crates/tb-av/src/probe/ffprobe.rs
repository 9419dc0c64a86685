//! FFprobe-backed [`MediaInspector`].
//!
//! Runs `ffprobe -v error -print_format json -show_streams <file>` and reads
//! the display aspect ratio of the first reported stream.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tb_core::MediaGeometry;

use super::MediaInspector;
use crate::tools::{ToolConfig, ToolRegistry};

/// An inspector backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    tool: ToolConfig,
}

impl FfprobeInspector {
    pub fn new(tool: ToolConfig) -> Self {
        Self { tool }
    }

    /// Build from a registry, failing if ffprobe was not discovered.
    pub fn from_registry(tools: &ToolRegistry) -> tb_core::Result<Self> {
        Ok(Self::new(tools.require("ffprobe")?.clone()))
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    fn name(&self) -> &'static str {
        "ffprobe"
    }

    async fn inspect(&self, path: &Path) -> tb_core::Result<MediaGeometry> {
        let mut cmd = self.tool.command();
        cmd.args(["-v", "error", "-print_format", "json", "-show_streams"]);
        cmd.path_arg(path);

        let output = cmd.execute().await?;
        let geometry = parse_geometry(&output.stdout)?;

        tracing::debug!(
            path = %path.display(),
            ratio = %geometry.display_aspect_ratio,
            "Probed media geometry"
        );
        Ok(geometry)
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    #[serde(default)]
    display_aspect_ratio: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Decode ffprobe JSON into the geometry of its first stream.
///
/// A missing `display_aspect_ratio` yields an empty ratio, which classifies
/// as "other". An empty stream list is an error.
pub fn parse_geometry(json: &str) -> tb_core::Result<MediaGeometry> {
    let output: FfprobeOutput = serde_json::from_str(json)
        .map_err(|e| tb_core::Error::Probe(format!("ffprobe JSON parse error: {e}")))?;

    let first = output
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| tb_core::Error::Probe("no streams found".into()))?;

    Ok(MediaGeometry {
        display_aspect_ratio: first.display_aspect_ratio.unwrap_or_default(),
        width: first.width,
        height: first.height,
    })
}
