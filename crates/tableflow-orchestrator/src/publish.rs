//! Publish-time transform: turn the combined tables into the public-facing
//! artifact tree.

use std::fs;
use std::path::Path;

use tableflow_core::{PipelineError, Result};

pub trait PublishTransform: Send + Sync {
    /// Populate `public_dir` from the combined tables in `tables_dir`.
    fn publish(&self, public_dir: &Path, tables_dir: &Path) -> Result<()>;
}

/// Default transform: copy every combined CSV under `v1/` and write an
/// `index.json` naming the published tables.
pub struct CsvPublisher;

impl PublishTransform for CsvPublisher {
    fn publish(&self, public_dir: &Path, tables_dir: &Path) -> Result<()> {
        let v1 = public_dir.join("v1");
        fs::create_dir_all(&v1)?;

        let mut tables = Vec::new();
        for entry in fs::read_dir(tables_dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "csv") {
                continue;
            }
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| {
                    PipelineError::Processing(format!(
                        "table file name is not valid UTF-8: {}",
                        path.display()
                    ))
                })?
                .to_string();
            fs::copy(&path, v1.join(&name))?;
            tables.push(name);
        }

        tables.sort();
        fs::write(v1.join("index.json"), serde_json::to_vec(&tables)?)?;
        Ok(())
    }
}
