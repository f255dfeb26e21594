//! Best-effort fetching of configured cache sources.

use std::path::Path;

use tableflow_core::sources::CacheSource;
use tableflow_sync::pool;
use tracing::{error, info};

/// Fetch every source into `output_dir`, bounded by the shared pool size.
/// A failed fetch is logged and its source skipped; the returned list names
/// the URLs that did not land.
pub async fn fetch_sources(
    client: &reqwest::Client,
    sources: &[CacheSource],
    output_dir: &Path,
) -> Vec<String> {
    let outcomes = pool::run_all(
        sources.to_vec(),
        tableflow_sync::DEFAULT_CONCURRENCY,
        |source| async move {
            match fetch_one(client, &source, output_dir).await {
                Ok(()) => {
                    info!(url = %source.url, output = %source.output, "cached source");
                    None
                }
                Err(err) => {
                    error!(url = %source.url, "cache pull failed: {err}");
                    Some(source.url)
                }
            }
        },
    )
    .await;

    outcomes.into_iter().flatten().collect()
}

async fn fetch_one(
    client: &reqwest::Client,
    source: &CacheSource,
    output_dir: &Path,
) -> Result<(), FetchError> {
    let response = client
        .get(&source.url)
        .send()
        .await?
        .error_for_status()?;
    let bytes = response.bytes().await?;
    tokio::fs::write(output_dir.join(&source.output), &bytes).await?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
}
