use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{PipelineError, Result};
use crate::pipeline::TablePipeline;

/// Explicit table-name → pipeline lookup, built once at process start.
#[derive(Default)]
pub struct PipelineRegistry {
    pipelines: HashMap<String, Arc<dyn TablePipeline>>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pipeline: Arc<dyn TablePipeline>) {
        self.pipelines
            .insert(pipeline.table_name().to_string(), pipeline);
    }

    /// Look up the collaborator for `table`. An unknown name is a fatal
    /// precondition violation, not a recoverable condition.
    pub fn get(&self, table: &str) -> Result<Arc<dyn TablePipeline>> {
        self.pipelines
            .get(table)
            .cloned()
            .ok_or_else(|| PipelineError::UnknownTable(table.to_string()))
    }

    pub fn contains(&self, table: &str) -> bool {
        self.pipelines.contains_key(table)
    }

    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pipelines.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
