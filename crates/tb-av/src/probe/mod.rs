//! Media inspection.
//!
//! [`MediaInspector`] extracts the [`MediaGeometry`] of a staged file. The
//! production backend shells out to ffprobe; [`FixedInspector`] returns canned
//! answers so the pipeline can be exercised without the binary installed.

pub mod ffprobe;
pub mod fixed;

use std::path::Path;

use async_trait::async_trait;
use tb_core::MediaGeometry;

pub use self::ffprobe::FfprobeInspector;
pub use self::fixed::FixedInspector;

/// Extracts stream geometry from a media file on disk.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    /// Inspect the file at `path`, returning the first stream's geometry.
    ///
    /// Fails with [`tb_core::Error::Probe`] when the file reports no streams
    /// or the tool output cannot be decoded, and with
    /// [`tb_core::Error::Tool`] when the tool itself fails.
    async fn inspect(&self, path: &Path) -> tb_core::Result<MediaGeometry>;
}
