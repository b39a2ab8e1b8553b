//! Filedrop API: presigned upload and download URLs for a shared bucket

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]

/// Presigned URL issuance
pub mod file_storage;

/// HTTP route handlers
pub mod routes;

/// Server assembly
pub mod server;

/// Configuration, errors and extractors
pub mod types;
