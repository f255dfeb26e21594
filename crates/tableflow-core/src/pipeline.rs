use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Parsed rows for one data source of a table, persisted between the update
/// and combine stages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntermediateResult {
    pub source: String,
    pub records: Vec<BTreeMap<String, String>>,
}

/// A combined table ready for serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct TableOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableOutput {
    /// Write the table as CSV with a header row.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// The parsing/combination collaborator for one table. Implementations are
/// registered by table name at process start; the orchestrator never reaches
/// past this boundary. The source filter is an explicit argument so callers
/// never mutate collaborator state to narrow a run.
pub trait TablePipeline: Send + Sync {
    fn table_name(&self) -> &str;

    /// Names of the table's data sources, in declaration order. Also the
    /// file names used for persisted intermediate results.
    fn source_names(&self) -> Vec<String>;

    /// Parse the workspace's raw inputs into per-source intermediate
    /// results. `source_filter` selects a single source by index.
    fn parse(
        &self,
        workspace: &Path,
        source_filter: Option<usize>,
    ) -> Result<Vec<IntermediateResult>>;

    /// Combine per-source results into one table.
    fn combine(&self, results: Vec<IntermediateResult>) -> Result<TableOutput>;
}
