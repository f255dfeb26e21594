//! Persistence of per-source intermediate results between the update and
//! combine stages. One JSON file per source, named after the source.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::pipeline::IntermediateResult;

/// Write each result to `dir/{source}.json`, overwriting any previous file.
pub fn save_intermediate_results(dir: &Path, results: &[IntermediateResult]) -> Result<()> {
    fs::create_dir_all(dir)?;
    for result in results {
        let path = dir.join(format!("{}.json", result.source));
        let payload = serde_json::to_vec(result)?;
        fs::write(path, payload)?;
    }
    Ok(())
}

/// Rehydrate the named sources from `dir`. A source whose file is absent is
/// skipped with a warning: missing intermediates are the expected product of
/// best-effort sync, and combining what exists beats combining nothing.
pub fn load_intermediate_results(dir: &Path, sources: &[String]) -> Result<Vec<IntermediateResult>> {
    let mut results = Vec::new();
    for source in sources {
        let path = dir.join(format!("{source}.json"));
        if !path.is_file() {
            warn!(%source, "intermediate file missing, skipping source");
            continue;
        }
        let payload = fs::read(&path)?;
        results.push(serde_json::from_slice(&payload)?);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tempfile::TempDir;

    use super::{load_intermediate_results, save_intermediate_results};
    use crate::pipeline::IntermediateResult;

    fn record(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let originals = vec![
            IntermediateResult {
                source: "who".to_string(),
                records: vec![record(&[("date", "2021-05-01"), ("cases", "10")])],
            },
            IntermediateResult {
                source: "ecdc".to_string(),
                records: vec![record(&[("date", "2021-05-01"), ("cases", "12")])],
            },
        ];

        save_intermediate_results(dir.path(), &originals).unwrap();
        let loaded = load_intermediate_results(
            dir.path(),
            &["who".to_string(), "ecdc".to_string()],
        )
        .unwrap();

        assert_eq!(loaded, originals);
    }

    #[test]
    fn missing_source_file_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        let saved = vec![IntermediateResult {
            source: "who".to_string(),
            records: vec![],
        }];
        save_intermediate_results(dir.path(), &saved).unwrap();

        let loaded = load_intermediate_results(
            dir.path(),
            &["who".to_string(), "never-synced".to_string()],
        )
        .unwrap();

        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].source, "who");
    }
}
