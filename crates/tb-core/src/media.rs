//! Media-domain types: orientation partitions, probe geometry, and the
//! content types accepted at the upload boundary.
//!
//! Enums serialize in lowercase (via `serde(rename_all = "lowercase")`) and
//! implement `Display` manually for consistent string representation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The single container type accepted for video uploads.
pub const ACCEPTED_VIDEO_TYPE: &str = "video/mp4";

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

/// Storage partition chosen from a stream's display aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Landscape,
    Portrait,
    Other,
}

impl Orientation {
    /// Classify a display aspect ratio string.
    ///
    /// Only the exact strings `"16:9"` and `"9:16"` are recognised; ffprobe
    /// reports ratios already reduced, so no numeric comparison is done.
    /// Anything else, including the empty string, is [`Orientation::Other`].
    pub fn classify(aspect_ratio: &str) -> Self {
        match aspect_ratio {
            "16:9" => Self::Landscape,
            "9:16" => Self::Portrait,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// MediaGeometry
// ---------------------------------------------------------------------------

/// Geometry of the first stream reported by the prober.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaGeometry {
    /// Display aspect ratio as reported, e.g. `"16:9"`. Empty when absent.
    pub display_aspect_ratio: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl MediaGeometry {
    /// Geometry carrying only an aspect ratio.
    pub fn with_ratio(ratio: impl Into<String>) -> Self {
        Self {
            display_aspect_ratio: ratio.into(),
            ..Self::default()
        }
    }

    pub fn orientation(&self) -> Orientation {
        Orientation::classify(&self.display_aspect_ratio)
    }
}

// ---------------------------------------------------------------------------
// ImageType
// ---------------------------------------------------------------------------

/// Image formats accepted for thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Jpeg,
    Png,
}

impl ImageType {
    /// Match a (normalized) content type against the accepted image types.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match normalize_media_type(content_type).as_str() {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.content_type())
    }
}

// ---------------------------------------------------------------------------
// Content-type helpers
// ---------------------------------------------------------------------------

/// Strip parameters and lowercase a MIME type: `"Video/MP4; codecs=x"` becomes
/// `"video/mp4"`.
pub fn normalize_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Whether a declared content type is the accepted video container.
pub fn is_accepted_video(content_type: &str) -> bool {
    normalize_media_type(content_type) == ACCEPTED_VIDEO_TYPE
}

/// File extension for a content type: its subtype, e.g. `mp4` for `video/mp4`.
///
/// Returns `None` when the value has no `type/subtype` shape or the subtype
/// contains anything but ASCII alphanumerics.
pub fn extension_for(content_type: &str) -> Option<String> {
    let normalized = normalize_media_type(content_type);
    let (_, subtype) = normalized.split_once('/')?;
    if subtype.is_empty() || !subtype.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(subtype.to_string())
}
