//! Storage Module - Catalog & Content Store Seams
//!
//! The engine never talks to a database directly. It sees two traits:
//! - `Catalog`: metadata records (accepted files + anomaly log)
//! - `ContentStore`: write-once blob bytes
//!
//! `memory` holds the in-process implementations used by tests and by the
//! server's `memory` backend. The PostgreSQL implementations live in the
//! server crate.

pub mod catalog;
pub mod content;
pub mod memory;

use thiserror::Error;

pub use catalog::Catalog;
pub use content::{BlobMetadata, ContentStore};
pub use memory::{MemoryCatalog, MemoryContentStore};

/// Storage failure, fatal to the current request
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Uniqueness constraint on `checksum` rejected the write
    #[error("checksum {0} is already cataloged")]
    DuplicateChecksum(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;
