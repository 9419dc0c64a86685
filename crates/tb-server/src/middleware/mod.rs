//! HTTP middleware: request ID and bearer authentication.

pub mod auth;
pub mod request_id;
