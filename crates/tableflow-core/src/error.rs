use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Bucket error: {0}")]
    Bucket(#[from] tableflow_bucket::BucketError),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Missing configuration value: {0}")]
    MissingConfig(String),

    #[error("Data processing error: {0}")]
    Processing(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
