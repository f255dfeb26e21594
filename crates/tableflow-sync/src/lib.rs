//! Bulk transfer between a local directory tree and a remote bucket prefix.
//!
//! Transfers are best-effort by design: each object gets a bounded number of
//! retry attempts, and an object that exhausts them is logged and skipped
//! rather than failing the call. Callers that need to know about gaps read
//! the returned [`SyncReport`].

use thiserror::Error;

pub mod folder;
pub mod pool;

pub use folder::{
    DEFAULT_CONCURRENCY, SyncReport, TRANSFER_MAX_ATTEMPTS, download_folder, upload_folder,
};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("bucket error: {0}")]
    Bucket(#[from] tableflow_bucket::BucketError),

    #[error("file enumeration failed: {0}")]
    Walk(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
