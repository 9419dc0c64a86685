//! Ingestion state machine labels.

use std::fmt;

/// Progress of a single ingestion run. Failure can occur in any state but
/// [`IngestState::Committed`]; the state a run failed in is logged with the
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    /// Checking content type and record ownership. No files exist yet.
    Validating,
    /// Upload bytes are on disk.
    Staged,
    /// The first stream's aspect ratio has been mapped to an orientation.
    Classified,
    /// A faststart copy exists next to the staged file.
    Normalized,
    /// The object store holds the normalized bytes.
    Uploaded,
    /// The record points at the new object.
    Committed,
}

impl IngestState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Staged => "staged",
            Self::Classified => "classified",
            Self::Normalized => "normalized",
            Self::Uploaded => "uploaded",
            Self::Committed => "committed",
        }
    }
}

impl fmt::Display for IngestState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
