use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tableflow_api::state::AppState;
use tableflow_orchestrator::{StageError, StageReport};
use tokio::net::TcpListener;
use tracing::{Level, info};

/// HTTP-triggered orchestrator for the tabular data pipeline.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the HTTP trigger surface.
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
    /// Fetch all cache sources and rebuild the sitemap.
    CachePull,
    /// Parse one table's sources and upload snapshot/intermediate trees.
    UpdateTable {
        #[arg(long)]
        table: String,
        /// Restrict the run to a single source by index.
        #[arg(long)]
        idx: Option<usize>,
    },
    /// Combine a table's intermediates into its serialized table.
    CombineTable {
        #[arg(long)]
        table: String,
    },
    /// Publish combined tables to the production bucket.
    Publish,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let state = Arc::new(AppState::from_env().await?);

    match cli.command {
        Command::Serve { port } => {
            let router = tableflow_api::router(state);
            let listener = TcpListener::bind((std::net::Ipv4Addr::UNSPECIFIED, port)).await?;
            info!("listening on {}", listener.local_addr()?);
            axum::serve(listener, router.into_make_service()).await?;
            Ok(())
        }
        Command::CachePull => finish(state.orchestrator.cache_pull().await),
        Command::UpdateTable { table, idx } => {
            finish(state.orchestrator.update_table(&table, idx).await)
        }
        Command::CombineTable { table } => finish(state.orchestrator.combine_table(&table).await),
        Command::Publish => finish(state.orchestrator.publish().await),
    }
}

fn finish(result: Result<StageReport, StageError>) -> Result<()> {
    let report = result?;
    if report.is_complete() {
        info!("stage finished");
    } else {
        info!(
            failed_transfers = report.failed_transfers.len(),
            failed_fetches = report.failed_fetches.len(),
            "stage finished with gaps"
        );
    }
    Ok(())
}
