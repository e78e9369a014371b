//! Folder ingestion: every `*.txt` file in a directory becomes one fragment.
//!
//! Files are taken in name order; the fragment id is the file stem and the
//! `document_id` is the file's 1-based position. A file that cannot be read
//! or stored is recorded in the report and the batch moves on.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::SemanticSearchService;
use crate::errors::search_error::SearchError;
use crate::progress::Progress;

/// One file that was not ingested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestFailure {
    pub id: String,
    pub error: String,
}

/// Summary of one folder ingestion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    /// `*.txt` files found.
    pub total_files: usize,
    /// Files stored successfully.
    pub ingested: usize,
    pub failed: Vec<IngestFailure>,
    /// Store size after the batch; `None` if the count itself failed.
    pub store_count: Option<u64>,
    pub duration_ms: u128,
}

impl IngestReport {
    /// True when every file was stored.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.ingested == self.total_files
    }
}

/// Loads every `*.txt` file under `folder` (non-recursive) into the service.
///
/// # Errors
/// - [`SearchError::InvalidInput`] if `folder` is missing or not a directory
/// - [`SearchError::Io`] if the directory cannot be listed
pub async fn ingest_folder(
    service: &SemanticSearchService,
    folder: impl AsRef<Path>,
    progress: &dyn Progress,
) -> Result<IngestReport, SearchError> {
    let folder = folder.as_ref();
    if !folder.exists() {
        return Err(SearchError::InvalidInput(format!(
            "folder does not exist: {}",
            folder.display()
        )));
    }
    if !folder.is_dir() {
        return Err(SearchError::InvalidInput(format!(
            "path is not a directory: {}",
            folder.display()
        )));
    }

    let started = Instant::now();
    let files = list_txt_files(folder)?;
    let total = files.len();
    if total == 0 {
        warn!(target: "search_service::ingest", folder = %folder.display(), "no .txt files found");
    } else {
        info!(target: "search_service::ingest", folder = %folder.display(), files = total, "ingest: start");
    }
    progress.set_total(total as u64);

    let mut ingested = 0usize;
    let mut failed = Vec::new();
    for (idx, path) in files.iter().enumerate() {
        let position = idx + 1;
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let outcome = match std::fs::read_to_string(path) {
            Ok(text) => service
                .add_document(&id, &text, position as i64)
                .await
                .map(|()| text.len()),
            Err(e) => Err(SearchError::Io(e)),
        };

        match outcome {
            Ok(chars) => {
                info!(target: "search_service::ingest", position, total, id = %id, chars, "ingested");
                ingested += 1;
            }
            Err(e) => {
                let error = error_chain(&e);
                error!(target: "search_service::ingest", position, total, id = %id, error = %error, "failed to ingest");
                failed.push(IngestFailure {
                    id: id.clone(),
                    error,
                });
            }
        }
        progress.step(&id);
    }

    let store_count = match service.get_collection_count().await {
        Ok(n) => Some(n),
        Err(e) => {
            error!(target: "search_service::ingest", error = %error_chain(&e), "failed to read collection count");
            None
        }
    };

    let report = IngestReport {
        total_files: total,
        ingested,
        failed,
        store_count,
        duration_ms: started.elapsed().as_millis(),
    };
    progress.finish(&format!("ingested {ingested}/{total}"));
    info!(
        target: "search_service::ingest",
        ingested = report.ingested,
        failed = report.failed.len(),
        store_count = ?report.store_count,
        duration_ms = report.duration_ms,
        "ingest: finished"
    );
    Ok(report)
}

/// `outer: inner: ...` rendering of an error and its sources.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        out.push_str(": ");
        out.push_str(&inner.to_string());
        source = inner.source();
    }
    out
}

fn list_txt_files(folder: &Path) -> Result<Vec<PathBuf>, SearchError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        let is_txt = path.extension().is_some_and(|ext| ext == "txt");
        if is_txt && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
