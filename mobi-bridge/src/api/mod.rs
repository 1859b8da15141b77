//! Retrieval HTTP service.
//!
//! A single endpoint, `GET /{slug}`, streams the converted artifact
//! registered under `slug`. No authentication, no range requests, no expiry.

pub mod error;
pub mod routes;
pub mod server;

pub use server::{ApiServer, ApiServerConfig, AppState};

/// Content type of every served artifact.
pub const MOBI_CONTENT_TYPE: &str = "application/x-mobipocket-ebook";
