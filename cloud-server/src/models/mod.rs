//! Data models

pub mod anomaly;
pub mod blob;
pub mod file;

pub use anomaly::*;
pub use blob::*;
pub use file::*;

/// Postgres has no unsigned integers; negative values never get written
pub(crate) fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
