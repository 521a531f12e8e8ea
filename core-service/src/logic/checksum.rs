//! Checksum Index - exact duplicate detection
//!
//! Read view over the catalog's checksum index. The catalog stays the only
//! writer; this type only fingerprints and looks up.

use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::logic::storage::{Catalog, StorageResult};
use crate::logic::types::FileRecord;

/// Hex digest length of a fingerprint
pub const CHECKSUM_HEX_LEN: usize = 64;

/// SHA-256 content fingerprint, lowercase hex
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[derive(Clone)]
pub struct ChecksumIndex {
    catalog: Arc<dyn Catalog>,
}

impl ChecksumIndex {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// First-seen record with this checksum, if any
    pub async fn lookup(&self, checksum: &str) -> StorageResult<Option<FileRecord>> {
        self.catalog.find_by_checksum(checksum).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::storage::MemoryCatalog;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = fingerprint(b"hello world");
        let b = fingerprint(b"hello world");
        assert_eq!(a, b);
        assert_eq!(a.len(), CHECKSUM_HEX_LEN);
        assert_eq!(
            a,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_fingerprint_differs_for_different_bytes() {
        assert_ne!(fingerprint(b"a"), fingerprint(b"b"));
        assert_eq!(
            fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_lookup_miss_on_empty_catalog() {
        let index = ChecksumIndex::new(Arc::new(MemoryCatalog::new()));
        let found = tokio_test::block_on(index.lookup(&fingerprint(b"x"))).unwrap();
        assert!(found.is_none());
    }
}
