//! Reference [`TablePipeline`] implementation over delimited snapshot files.
//!
//! Each source is a CSV file the cache-pull stage (or an operator) placed
//! under the workspace's `snapshot/` directory. Real deployments register
//! their own collaborators; this one is enough to run the system end to end.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::pipeline::{IntermediateResult, TableOutput, TablePipeline};

pub struct CsvTablePipeline {
    table: String,
    sources: Vec<String>,
}

impl CsvTablePipeline {
    pub fn new(table: impl Into<String>, sources: Vec<String>) -> Self {
        Self {
            table: table.into(),
            sources,
        }
    }

    fn selected_sources(&self, source_filter: Option<usize>) -> Result<Vec<String>> {
        match source_filter {
            None => Ok(self.sources.clone()),
            Some(idx) => self
                .sources
                .get(idx)
                .cloned()
                .map(|source| vec![source])
                .ok_or_else(|| {
                    PipelineError::MissingConfig(format!(
                        "source index {idx} out of range for table {}",
                        self.table
                    ))
                }),
        }
    }
}

impl TablePipeline for CsvTablePipeline {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn source_names(&self) -> Vec<String> {
        self.sources.clone()
    }

    fn parse(
        &self,
        workspace: &Path,
        source_filter: Option<usize>,
    ) -> Result<Vec<IntermediateResult>> {
        let snapshot_dir = workspace.join("snapshot");
        let mut results = Vec::new();

        for source in self.selected_sources(source_filter)? {
            let path = snapshot_dir.join(format!("{source}.csv"));
            if !path.is_file() {
                warn!(%source, "no snapshot for source, skipping");
                continue;
            }

            let mut reader = csv::Reader::from_path(&path)?;
            let headers = reader.headers()?.clone();
            let mut records = Vec::new();
            for row in reader.records() {
                let row = row?;
                let record: BTreeMap<String, String> = headers
                    .iter()
                    .zip(row.iter())
                    .map(|(header, value)| (header.to_string(), value.to_string()))
                    .collect();
                records.push(record);
            }

            results.push(IntermediateResult { source, records });
        }

        Ok(results)
    }

    fn combine(&self, results: Vec<IntermediateResult>) -> Result<TableOutput> {
        let mut value_columns = BTreeSet::new();
        for result in &results {
            for record in &result.records {
                value_columns.extend(record.keys().cloned());
            }
        }

        let mut columns = vec!["source".to_string()];
        columns.extend(value_columns);

        let mut rows = Vec::new();
        for result in results {
            for record in result.records {
                let mut row = Vec::with_capacity(columns.len());
                row.push(result.source.clone());
                for column in &columns[1..] {
                    row.push(record.get(column).cloned().unwrap_or_default());
                }
                rows.push(row);
            }
        }

        Ok(TableOutput { columns, rows })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::CsvTablePipeline;
    use crate::error::PipelineError;
    use crate::pipeline::TablePipeline;

    fn pipeline() -> CsvTablePipeline {
        CsvTablePipeline::new(
            "epidemiology",
            vec!["who".to_string(), "ecdc".to_string()],
        )
    }

    fn write_snapshots(workspace: &TempDir) {
        let snapshot = workspace.path().join("snapshot");
        fs::create_dir_all(&snapshot).unwrap();
        fs::write(snapshot.join("who.csv"), "date,cases\n2021-05-01,10\n").unwrap();
        fs::write(snapshot.join("ecdc.csv"), "date,deaths\n2021-05-01,2\n").unwrap();
    }

    #[test]
    fn parses_every_source() {
        let workspace = TempDir::new().unwrap();
        write_snapshots(&workspace);

        let results = pipeline().parse(workspace.path(), None).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source, "who");
        assert_eq!(results[0].records[0]["cases"], "10");
    }

    #[test]
    fn source_filter_selects_a_single_source() {
        let workspace = TempDir::new().unwrap();
        write_snapshots(&workspace);

        let results = pipeline().parse(workspace.path(), Some(1)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "ecdc");
    }

    #[test]
    fn out_of_range_filter_is_fatal() {
        let workspace = TempDir::new().unwrap();
        let err = pipeline().parse(workspace.path(), Some(7)).unwrap_err();
        assert!(matches!(err, PipelineError::MissingConfig(_)));
    }

    #[test]
    fn missing_snapshot_is_skipped() {
        let workspace = TempDir::new().unwrap();
        let snapshot = workspace.path().join("snapshot");
        fs::create_dir_all(&snapshot).unwrap();
        fs::write(snapshot.join("who.csv"), "date,cases\n2021-05-01,10\n").unwrap();

        let results = pipeline().parse(workspace.path(), None).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn combine_concatenates_with_source_column() {
        let workspace = TempDir::new().unwrap();
        write_snapshots(&workspace);

        let pipeline = pipeline();
        let results = pipeline.parse(workspace.path(), None).unwrap();
        let table = pipeline.combine(results).unwrap();

        assert_eq!(table.columns, vec!["source", "cases", "date", "deaths"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][0], "who");
        assert_eq!(table.rows[1][0], "ecdc");
        // Columns a source never produced are blank, not errors.
        assert_eq!(table.rows[0][3], "");
    }
}
