use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tableflow_bucket::{BucketStore, MemoryBucketStore, S3BucketStore, S3Config};
use tableflow_core::PipelineRegistry;
use tableflow_core::csv_pipeline::CsvTablePipeline;
use tableflow_core::sources::{CacheSource, load_cache_sources};
use tableflow_orchestrator::{CsvPublisher, StageOrchestrator};
use tracing::warn;

pub struct AppState {
    pub orchestrator: Arc<StageOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<StageOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Build the full state from environment configuration: bucket backend
    /// and credentials, registered tables, cache source list.
    pub async fn from_env() -> Result<Self> {
        let staging_bucket = std::env::var("TABLEFLOW_STAGING_BUCKET")
            .unwrap_or_else(|_| "tableflow-staging".to_string());
        let prod_bucket = std::env::var("TABLEFLOW_PROD_BUCKET")
            .unwrap_or_else(|_| "tableflow-prod".to_string());

        let backend =
            std::env::var("TABLEFLOW_BUCKET_BACKEND").unwrap_or_else(|_| "s3".to_string());
        let (staging, prod): (Arc<dyn BucketStore>, Arc<dyn BucketStore>) =
            match backend.as_str() {
                "memory" => (
                    Arc::new(MemoryBucketStore::new()),
                    Arc::new(MemoryBucketStore::new()),
                ),
                _ => (
                    Arc::new(S3BucketStore::new(bucket_config(staging_bucket)?).await?),
                    Arc::new(S3BucketStore::new(bucket_config(prod_bucket)?).await?),
                ),
            };

        let registry = Arc::new(registry_from_env()?);
        let cache_sources = cache_sources_from_env()?;

        let orchestrator = Arc::new(StageOrchestrator::new(
            staging,
            prod,
            registry,
            cache_sources,
            Arc::new(CsvPublisher),
        )?);

        Ok(Self::new(orchestrator))
    }
}

fn bucket_config(bucket: String) -> Result<S3Config> {
    Ok(S3Config {
        bucket,
        region: std::env::var("BUCKET_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        endpoint: std::env::var("BUCKET_ENDPOINT").ok(),
        access_key_id: std::env::var("BUCKET_ACCESS_KEY").ok(),
        secret_access_key: std::env::var("BUCKET_SECRET_KEY").ok(),
        force_path_style: std::env::var("BUCKET_FORCE_PATH_STYLE")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
    })
}

/// Table registry from `TABLEFLOW_TABLE_CONFIG`, a JSON file mapping table
/// names to their source lists. No file means an empty registry: every
/// table-scoped trigger will hit the unknown-table precondition.
fn registry_from_env() -> Result<PipelineRegistry> {
    let mut registry = PipelineRegistry::new();

    let Ok(path) = std::env::var("TABLEFLOW_TABLE_CONFIG") else {
        warn!("TABLEFLOW_TABLE_CONFIG not set, no tables registered");
        return Ok(registry);
    };

    let payload = std::fs::read(Path::new(&path))
        .with_context(|| format!("reading table config {path}"))?;
    let tables: BTreeMap<String, Vec<String>> =
        serde_json::from_slice(&payload).with_context(|| format!("parsing table config {path}"))?;

    for (table, sources) in tables {
        registry.register(Arc::new(CsvTablePipeline::new(table, sources)));
    }
    Ok(registry)
}

fn cache_sources_from_env() -> Result<Vec<CacheSource>> {
    let Ok(path) = std::env::var("TABLEFLOW_CACHE_CONFIG") else {
        warn!("TABLEFLOW_CACHE_CONFIG not set, cache pull has no sources");
        return Ok(Vec::new());
    };
    load_cache_sources(Path::new(&path)).with_context(|| format!("loading cache config {path}"))
}
