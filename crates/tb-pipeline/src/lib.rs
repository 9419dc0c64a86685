//! # tb-pipeline
//!
//! Video ingestion: the [`IngestPipeline`] takes an authenticated upload from
//! validation through staging, probing, orientation classification, faststart
//! normalization and object upload, and finally commits the public URL to the
//! video record.
//!
//! Every collaborator is a trait object ([`tb_av::MediaInspector`],
//! [`tb_av::MediaNormalizer`], [`tb_storage::ObjectStorage`],
//! [`VideoRepository`]) so the whole run can be exercised without ffmpeg,
//! S3 or a database file.

pub mod ingest;
pub mod repository;
pub mod state;

pub use ingest::{IngestPipeline, UploadRequest};
pub use repository::{SqliteVideoRepository, VideoRepository};
pub use state::IngestState;
