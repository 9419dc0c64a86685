//! # tb-av
//!
//! External media tooling and scratch-file management for the tubely
//! ingestion pipeline.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- find ffmpeg and ffprobe from
//!   config overrides or `PATH`.
//! - **Command execution** ([`ToolCommand`]) -- async builder with optional
//!   timeout; children are killed when the invoking future is dropped.
//! - **Workspace management** ([`Workspace`]) -- per-upload staging files
//!   that remove themselves on every exit path.
//! - **Inspection** ([`MediaInspector`]) -- ffprobe-backed geometry
//!   extraction, plus a fixed fake for tests.
//! - **Normalization** ([`MediaNormalizer`]) -- ffmpeg faststart remux, plus a
//!   byte-copying fake for tests.

pub mod command;
pub mod probe;
pub mod remux;
pub mod tools;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use probe::{FfprobeInspector, FixedInspector, MediaInspector};
pub use remux::{FfmpegNormalizer, MediaNormalizer, PassthroughNormalizer};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry};
pub use workspace::{NormalizedFile, StagedFile, Workspace};
