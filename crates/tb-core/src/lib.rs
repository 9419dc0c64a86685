//! tb-core: shared types, IDs, errors, configuration, and media-domain
//! helpers.
//!
//! This crate is the foundational dependency for all other tb-* crates,
//! providing type-safe identifiers, a unified error type with fault
//! classification, the orientation classifier, and application
//! configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod media;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, FaultClass, Result};
pub use ids::*;
pub use media::*;
