//! Scratch-file management for in-flight uploads.
//!
//! A [`Workspace`] is rooted at an explicit directory from configuration.
//! Each upload acquires its own [`StagedFile`] there, and normalization writes
//! to a [`NormalizedFile`] next to it. Both are guards: the file is removed
//! when the guard is released or dropped, so early returns, cancelled futures
//! and panics all leave the workspace clean.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

const STAGED_PREFIX: &str = "tubely-upload-";
const STAGED_SUFFIX: &str = ".mp4";
const NORMALIZED_SUFFIX: &str = ".processing";

/// Root directory for per-upload scratch files.
///
/// # Example
///
/// ```no_run
/// use tb_av::Workspace;
///
/// # async fn example(body: &[u8]) -> tb_core::Result<()> {
/// let workspace = Workspace::new("/var/tmp/tubely")?;
/// let mut staged = workspace.acquire()?;
/// staged.promote(body, 1 << 30).await?;
/// // ... probe and normalize staged.path() ...
/// staged.release()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Use `root` as the workspace, creating it if needed.
    pub fn new(root: impl Into<PathBuf>) -> tb_core::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a uniquely named, empty staging file owned by the caller.
    pub fn acquire(&self) -> tb_core::Result<StagedFile> {
        let named = tempfile::Builder::new()
            .prefix(STAGED_PREFIX)
            .suffix(STAGED_SUFFIX)
            .tempfile_in(&self.root)?;
        let (file, guard) = named.into_parts();
        let path = guard.to_path_buf();
        tracing::debug!(path = %path.display(), "Acquired staging file");

        Ok(StagedFile {
            path,
            file: Some(File::from_std(file)),
            guard: Some(guard),
        })
    }
}

// ---------------------------------------------------------------------------
// StagedFile
// ---------------------------------------------------------------------------

/// The raw uploaded bytes on disk.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    file: Option<File>,
    guard: Option<TempPath>,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether [`StagedFile::release`] has already run.
    pub fn is_released(&self) -> bool {
        self.guard.is_none()
    }

    fn handle(&mut self) -> tb_core::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| tb_core::Error::Internal("staging file already released".into()))
    }

    /// Stream `reader` into the file, then rewind to offset zero.
    ///
    /// At most `max_bytes` are accepted; a longer body yields
    /// [`tb_core::Error::PayloadTooLarge`]. Write failures surface as
    /// [`tb_core::Error::Io`].
    pub async fn promote<R>(&mut self, reader: R, max_bytes: u64) -> tb_core::Result<u64>
    where
        R: AsyncRead + Unpin,
    {
        let file = self.handle()?;
        let mut limited = reader.take(max_bytes.saturating_add(1));
        let written = tokio::io::copy(&mut limited, file).await?;
        if written > max_bytes {
            return Err(tb_core::Error::PayloadTooLarge(format!(
                "upload exceeds {max_bytes} bytes"
            )));
        }
        file.flush().await?;
        file.seek(SeekFrom::Start(0)).await?;

        tracing::debug!(path = %self.path.display(), bytes = written, "Promoted upload to disk");
        Ok(written)
    }

    /// Reset the read cursor to the start of the file.
    pub async fn rewind(&mut self) -> tb_core::Result<()> {
        self.handle()?.seek(SeekFrom::Start(0)).await?;
        Ok(())
    }

    /// Read handle positioned wherever the last operation left it.
    pub fn reader(&mut self) -> tb_core::Result<&mut File> {
        self.handle()
    }

    /// Guard for the normalized output written next to this file.
    ///
    /// Create it before invoking the normalizer so that a partially written
    /// output is removed along with everything else.
    pub fn normalized_sibling(&self) -> NormalizedFile {
        let mut name = self.path.clone().into_os_string();
        name.push(NORMALIZED_SUFFIX);
        NormalizedFile {
            path: PathBuf::from(name),
            released: false,
        }
    }

    /// Close the handle and delete the file. Safe to call more than once.
    pub fn release(&mut self) -> tb_core::Result<()> {
        self.file.take();
        if let Some(guard) = self.guard.take() {
            guard.close()?;
            tracing::debug!(path = %self.path.display(), "Released staging file");
        }
        Ok(())
    }
}

// Dropping the TempPath guard removes the file if release() never ran.

// ---------------------------------------------------------------------------
// NormalizedFile
// ---------------------------------------------------------------------------

/// The remuxed output, owned by the same upload as its [`StagedFile`].
#[derive(Debug)]
pub struct NormalizedFile {
    path: PathBuf,
    released: bool,
}

impl NormalizedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Confirm the normalizer produced a non-empty file, returning its size.
    pub async fn ensure_written(&self) -> tb_core::Result<u64> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(meta.len()),
            Ok(_) => Err(tb_core::Error::pipeline(
                "normalize",
                format!("output is empty: {}", self.path.display()),
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(tb_core::Error::pipeline(
                "normalize",
                format!("output missing: {}", self.path.display()),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the output if it exists. Safe to call more than once.
    pub fn release(&mut self) -> tb_core::Result<()> {
        if self.released {
            return Ok(());
        }
        // Stays unreleased on failure so a later call or Drop retries.
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Released normalized file");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        self.released = true;
        Ok(())
    }
}

impl Drop for NormalizedFile {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(path = %self.path.display(), "Failed to remove normalized file: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn entries(dir: &Path) -> Vec<PathBuf> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect()
    }

    #[test]
    fn new_creates_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("workspace");
        let ws = Workspace::new(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(ws.root(), root);
    }

    #[test]
    fn acquire_creates_named_file_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let staged = ws.acquire().unwrap();

        assert!(staged.path().starts_with(dir.path()));
        assert!(staged.path().exists());
        let name = staged.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("tubely-upload-"));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn acquisitions_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let a = ws.acquire().unwrap();
        let b = ws.acquire().unwrap();
        assert_ne!(a.path(), b.path());
        assert_eq!(entries(dir.path()).len(), 2);
    }

    #[test]
    fn release_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let mut staged = ws.acquire().unwrap();

        staged.release().unwrap();
        assert!(staged.is_released());
        assert!(!staged.path().exists());
        staged.release().unwrap();
    }

    #[test]
    fn drop_removes_staged_file() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let path = {
            let staged = ws.acquire().unwrap();
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
        assert!(entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn promote_writes_and_rewinds() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let mut staged = ws.acquire().unwrap();

        let written = staged.promote(&b"ftypisom-bytes"[..], 1024).await.unwrap();
        assert_eq!(written, 14);
        assert_eq!(fs::read(staged.path()).unwrap(), b"ftypisom-bytes");

        let mut first = Vec::new();
        staged.reader().unwrap().read_to_end(&mut first).await.unwrap();
        assert_eq!(first, b"ftypisom-bytes");

        // a second consumer needs an explicit rewind
        staged.rewind().await.unwrap();
        let mut second = Vec::new();
        staged.reader().unwrap().read_to_end(&mut second).await.unwrap();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn promote_rejects_oversized_body() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let mut staged = ws.acquire().unwrap();

        let err = staged.promote(&[0u8; 64][..], 16).await.unwrap_err();
        assert!(matches!(err, tb_core::Error::PayloadTooLarge(_)));

        drop(staged);
        assert!(entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn promote_accepts_exact_limit() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let mut staged = ws.acquire().unwrap();
        assert_eq!(staged.promote(&[7u8; 16][..], 16).await.unwrap(), 16);
    }

    #[tokio::test]
    async fn promote_after_release_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let mut staged = ws.acquire().unwrap();
        staged.release().unwrap();
        assert!(staged.promote(&b"late"[..], 16).await.is_err());
    }

    #[tokio::test]
    async fn normalized_sibling_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let staged = ws.acquire().unwrap();
        let mut normalized = staged.normalized_sibling();

        assert_eq!(normalized.path().parent(), staged.path().parent());
        assert!(normalized
            .path()
            .to_string_lossy()
            .ends_with(".mp4.processing"));

        // nothing written yet
        let err = normalized.ensure_written().await.unwrap_err();
        assert!(err.to_string().contains("output missing"));

        fs::write(normalized.path(), b"").unwrap();
        let err = normalized.ensure_written().await.unwrap_err();
        assert!(err.to_string().contains("output is empty"));

        fs::write(normalized.path(), b"moov-first").unwrap();
        assert_eq!(normalized.ensure_written().await.unwrap(), 10);

        normalized.release().unwrap();
        assert!(!normalized.path().exists());
        normalized.release().unwrap();
    }

    #[test]
    fn drop_removes_partial_normalized_output() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        {
            let staged = ws.acquire().unwrap();
            let normalized = staged.normalized_sibling();
            fs::write(normalized.path(), b"partial").unwrap();
        }
        assert!(entries(dir.path()).is_empty());
    }

    #[test]
    fn release_without_output_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let staged = ws.acquire().unwrap();
        let mut normalized = staged.normalized_sibling();
        normalized.release().unwrap();
    }

    #[test]
    fn failed_release_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path()).unwrap();
        let staged = ws.acquire().unwrap();
        let mut normalized = staged.normalized_sibling();

        // A non-empty directory at the output path makes remove_file fail.
        fs::create_dir(normalized.path()).unwrap();
        fs::write(normalized.path().join("blocker"), b"x").unwrap();
        assert!(normalized.release().is_err());

        fs::remove_dir_all(normalized.path()).unwrap();
        fs::write(normalized.path(), b"late output").unwrap();
        normalized.release().unwrap();
        assert!(!normalized.path().exists());
    }
}
