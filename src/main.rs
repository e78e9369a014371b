//! Batch loader: reads every `*.txt` file of a folder into the vector store.
//!
//! Usage: `semantic-search [FOLDER]` (default `INGEST_FOLDER` or `data/enzymes`).
//! Exits with status 1 when any file could not be ingested.

use std::process::ExitCode;

use anyhow::Context;
use search_service::{IndicatifProgress, SemanticSearchService, ingest_folder};
use tracing::{Level, info, warn};

const DEFAULT_INGEST_FOLDER: &str = "data/enzymes";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // A missing .env is fine; a malformed one is not.
    let dotenv = match dotenvy::dotenv() {
        Ok(path) => Some(path),
        Err(e) if e.not_found() => None,
        Err(e) => return Err(e).context("failed to load .env"),
    };

    ai_llm_service::telemetry::init("info", Level::INFO).context("failed to init logging")?;
    if let Some(path) = dotenv {
        info!(target: "semantic_search", path = %path.display(), "loaded .env");
    }

    let folder = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("INGEST_FOLDER").ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_INGEST_FOLDER.to_string());

    let service = SemanticSearchService::from_env().context("failed to build search service")?;
    info!(target: "semantic_search", folder = %folder, "starting ingestion");

    let progress = IndicatifProgress::bar(0);
    let report = ingest_folder(&service, &folder, &progress)
        .await
        .with_context(|| format!("cannot ingest {folder}"))?;

    info!(
        target: "semantic_search",
        ingested = report.ingested,
        total = report.total_files,
        store_count = ?report.store_count,
        "ingestion finished"
    );

    if report.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        for f in &report.failed {
            warn!(target: "semantic_search", id = %f.id, error = %f.error, "not ingested");
        }
        Ok(ExitCode::FAILURE)
    }
}
