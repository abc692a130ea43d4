//! # BookTracker Shared Library
//!
//! Domain types and infrastructure used by the BookTracker API server.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, bearer tokens, request authentication
//! - `db`: Connection pool and embedded migrations
//! - `files`: Upload directory storage
//! - `models`: Database models and data structures
//! - `store`: Store traits with PostgreSQL and in-memory backends

pub mod auth;
pub mod db;
pub mod files;
pub mod models;
pub mod store;

/// Current version of the BookTracker shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
