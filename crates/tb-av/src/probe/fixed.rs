//! Canned [`MediaInspector`] for tests and tool-less environments.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tb_core::MediaGeometry;

use super::MediaInspector;

/// Returns the same geometry for every file, or reports zero streams.
#[derive(Debug, Default)]
pub struct FixedInspector {
    geometry: Option<MediaGeometry>,
    calls: AtomicUsize,
}

impl FixedInspector {
    pub fn new(geometry: MediaGeometry) -> Self {
        Self {
            geometry: Some(geometry),
            calls: AtomicUsize::new(0),
        }
    }

    /// Inspector that always answers with the given aspect ratio.
    pub fn ratio(ratio: &str) -> Self {
        Self::new(MediaGeometry::with_ratio(ratio))
    }

    /// Inspector that behaves like a probe of a file with no streams.
    pub fn no_streams() -> Self {
        Self::default()
    }

    /// Number of times [`MediaInspector::inspect`] has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaInspector for FixedInspector {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn inspect(&self, path: &Path) -> tb_core::Result<MediaGeometry> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if tokio::fs::metadata(path).await.is_err() {
            return Err(tb_core::Error::Probe(format!(
                "{}: no such file",
                path.display()
            )));
        }
        self.geometry
            .clone()
            .ok_or_else(|| tb_core::Error::Probe("no streams found".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_canned_ratio() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let inspector = FixedInspector::ratio("9:16");
        let geometry = inspector.inspect(file.path()).await.unwrap();
        assert_eq!(geometry.display_aspect_ratio, "9:16");
        assert_eq!(inspector.calls(), 1);
    }

    #[tokio::test]
    async fn no_streams_is_probe_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = FixedInspector::no_streams()
            .inspect(file.path())
            .await
            .unwrap_err();
        assert!(matches!(err, tb_core::Error::Probe(_)));
    }

    #[tokio::test]
    async fn missing_file_is_probe_error() {
        let err = FixedInspector::ratio("16:9")
            .inspect(Path::new("/nonexistent/upload.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, tb_core::Error::Probe(_)));
    }
}
