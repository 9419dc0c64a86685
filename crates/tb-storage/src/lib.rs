//! # tb-storage
//!
//! Durable object storage for ingested media.
//!
//! - [`keys`] derives random, orientation-partitioned object keys.
//! - [`ObjectStorage`] is the seam the pipeline uploads through.
//! - [`ObjectStoreStorage`] implements it over the `object_store` crate for
//!   S3 (and compatibles), the local filesystem, and memory.

pub mod keys;
pub mod object;
pub mod traits;

pub use keys::{derive_key, random_id, StorageKey};
pub use object::{build_storage, ObjectStoreStorage};
pub use traits::{ObjectStorage, StorageError, StorageResult};
