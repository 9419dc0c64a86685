//! tb-db: metadata persistence for tubely.
//!
//! SQLite storage with connection pooling, embedded migrations, the
//! [`models::Video`] record and its queries.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
