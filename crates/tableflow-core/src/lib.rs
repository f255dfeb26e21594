pub mod error;
pub mod pipeline;
pub mod registry;
pub mod intermediate;
pub mod csv_pipeline;
pub mod sitemap;
pub mod sources;
pub mod workspace;

pub use error::{PipelineError, Result};
pub use pipeline::{IntermediateResult, TableOutput, TablePipeline};
pub use registry::PipelineRegistry;
pub use workspace::ScratchWorkspace;
