//! Storage layer for blobbox
//!
//! This crate provides:
//! - SQLite connection setup and migrations
//! - The capacity-bounded JSON blob store

pub mod blob;
pub mod db;
pub mod error;
pub mod models;

pub use blob::{BlobStore, SaveOutcome};
pub use db::Storage;
pub use error::{Result, StorageError};
pub use models::{DocumentInfo, StoreLimits, StoreStats};
