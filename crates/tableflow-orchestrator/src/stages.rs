use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use tableflow_bucket::BucketStore;
use tableflow_core::sitemap::{CACHE_PREFIX, SITEMAP_KEY, build_cache_sitemap};
use tableflow_core::sources::CacheSource;
use tableflow_core::{PipelineError, PipelineRegistry, ScratchWorkspace, intermediate};
use tableflow_sync::{SyncReport, download_folder, upload_folder};
use tracing::{info, warn};

use crate::StageError;
use crate::fetch::fetch_sources;
use crate::publish::PublishTransform;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// What a stage accomplished. Transfer and fetch gaps are reported here for
/// logging; they never fail the stage.
#[derive(Debug, Default)]
pub struct StageReport {
    pub failed_transfers: Vec<String>,
    pub failed_fetches: Vec<String>,
}

impl StageReport {
    fn absorb(&mut self, sync: SyncReport) {
        self.failed_transfers.extend(sync.failed);
    }

    pub fn is_complete(&self) -> bool {
        self.failed_transfers.is_empty() && self.failed_fetches.is_empty()
    }
}

/// Drives the four pipeline stages against a staging bucket (everything up
/// to publish) and a production bucket (published artifacts only).
pub struct StageOrchestrator {
    staging: Arc<dyn BucketStore>,
    prod: Arc<dyn BucketStore>,
    registry: Arc<PipelineRegistry>,
    cache_sources: Vec<CacheSource>,
    publisher: Arc<dyn PublishTransform>,
    http: reqwest::Client,
}

impl StageOrchestrator {
    pub fn new(
        staging: Arc<dyn BucketStore>,
        prod: Arc<dyn BucketStore>,
        registry: Arc<PipelineRegistry>,
        cache_sources: Vec<CacheSource>,
        publisher: Arc<dyn PublishTransform>,
    ) -> Result<Self, StageError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|err| StageError::Http(err.to_string()))?;

        Ok(Self {
            staging,
            prod,
            registry,
            cache_sources,
            publisher,
            http,
        })
    }

    /// Fetch every configured source into an hourly snapshot folder, upload
    /// the lot under `cache/`, then rebuild and overwrite the sitemap.
    /// Sources that fail to fetch are skipped; the stage still succeeds.
    pub async fn cache_pull(&self) -> Result<StageReport, StageError> {
        let workspace = ScratchWorkspace::new()?;
        let hour = Utc::now().format("%Y-%m-%d-%H").to_string();
        let output_dir = workspace.subdir(&hour)?;

        let mut report = StageReport {
            failed_fetches: fetch_sources(&self.http, &self.cache_sources, &output_dir).await,
            ..Default::default()
        };

        report.absorb(upload_folder(self.staging.as_ref(), CACHE_PREFIX, workspace.path()).await?);

        let sitemap = build_cache_sitemap(self.staging.as_ref()).await?;
        let payload = serde_json::to_vec(&sitemap).map_err(PipelineError::from)?;
        self.staging
            .put_object(SITEMAP_KEY, Bytes::from(payload))
            .await?;

        self.finish("cache_pull", &report);
        Ok(report)
    }

    /// Parse the named table's sources and upload the snapshot and
    /// intermediate trees, namespaced by table so concurrent updates of
    /// different tables never collide.
    pub async fn update_table(
        &self,
        table: &str,
        source_index: Option<usize>,
    ) -> Result<StageReport, StageError> {
        // Precondition check before any workspace or store activity.
        let pipeline = self.registry.get(table)?;

        let workspace = ScratchWorkspace::new()?;
        let snapshot_dir = workspace.subdir("snapshot")?;
        let intermediate_dir = workspace.subdir("intermediate")?;

        let results = pipeline.parse(workspace.path(), source_index)?;
        intermediate::save_intermediate_results(&intermediate_dir, &results)?;

        let mut report = StageReport::default();
        report.absorb(
            upload_folder(
                self.staging.as_ref(),
                &format!("snapshot/{table}"),
                &snapshot_dir,
            )
            .await?,
        );
        report.absorb(
            upload_folder(
                self.staging.as_ref(),
                &format!("intermediate/{table}"),
                &intermediate_dir,
            )
            .await?,
        );

        self.finish("update_table", &report);
        Ok(report)
    }

    /// Pull the table's intermediate tree, combine it, and upload the
    /// serialized table.
    pub async fn combine_table(&self, table: &str) -> Result<StageReport, StageError> {
        let pipeline = self.registry.get(table)?;

        let workspace = ScratchWorkspace::new()?;
        let intermediate_dir = workspace.subdir("intermediate")?;
        let tables_dir = workspace.subdir("tables")?;

        let mut report = StageReport::default();
        report.absorb(
            download_folder(
                self.staging.as_ref(),
                &format!("intermediate/{table}"),
                &intermediate_dir,
            )
            .await?,
        );

        let results =
            intermediate::load_intermediate_results(&intermediate_dir, &pipeline.source_names())?;
        let output = pipeline.combine(results)?;
        output.write_csv(&tables_dir.join(format!("{table}.csv")))?;

        report.absorb(upload_folder(self.staging.as_ref(), "tables", &tables_dir).await?);

        self.finish("combine_table", &report);
        Ok(report)
    }

    /// Pull every combined table, run the publish transform, and upload the
    /// public tree to the production bucket root. Production uploads get the
    /// same best-effort transfer contract as everything else.
    pub async fn publish(&self) -> Result<StageReport, StageError> {
        let workspace = ScratchWorkspace::new()?;
        let tables_dir = workspace.subdir("tables")?;
        let public_dir = workspace.subdir("public")?;

        let mut report = StageReport::default();
        report.absorb(download_folder(self.staging.as_ref(), "tables", &tables_dir).await?);

        self.publisher.publish(&public_dir, &tables_dir)?;

        report.absorb(upload_folder(self.prod.as_ref(), "", &public_dir).await?);

        self.finish("publish", &report);
        Ok(report)
    }

    fn finish(&self, stage: &str, report: &StageReport) {
        if report.is_complete() {
            info!(stage, "stage complete");
        } else {
            warn!(
                stage,
                failed_transfers = ?report.failed_transfers,
                failed_fetches = ?report.failed_fetches,
                "stage complete with gaps"
            );
        }
    }
}
