//! Sequencing of the four pipeline stages: cache pull, table update, table
//! combine, publish. Each stage allocates a scratch workspace, pulls its
//! inputs from the staging bucket, invokes the table collaborator, pushes
//! its outputs, and lets the workspace be destroyed on the way out.

use thiserror::Error;

mod fetch;
mod publish;
mod stages;

pub use publish::{CsvPublisher, PublishTransform};
pub use stages::{StageOrchestrator, StageReport};

#[derive(Debug, Error)]
pub enum StageError {
    #[error("pipeline error: {0}")]
    Pipeline(#[from] tableflow_core::PipelineError),

    #[error("sync enumeration failed: {0}")]
    Sync(#[from] tableflow_sync::SyncError),

    #[error("bucket error: {0}")]
    Bucket(#[from] tableflow_bucket::BucketError),

    #[error("workspace I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    Http(String),
}

impl StageError {
    /// True for caller mistakes (unknown table, bad source index) as opposed
    /// to infrastructure failures.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            StageError::Pipeline(
                tableflow_core::PipelineError::UnknownTable(_)
                    | tableflow_core::PipelineError::MissingConfig(_)
            )
        )
    }
}
