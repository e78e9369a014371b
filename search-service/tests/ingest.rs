use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use pretty_assertions::assert_eq;
use rag_store::{DistanceKind, EmbeddingProvider, HashingEmbedder, MemoryStore, VectorStore};
use search_service::{
    EnhancementState, NoopProgress, Progress, SearchError, SemanticSearchService, ingest_folder,
};
use serde_json::json;

const DIM: usize = 64;

fn service() -> (SemanticSearchService, Arc<MemoryStore>) {
    let embedder = Arc::new(EmbeddingProvider::from_embedder(
        "hashing-64",
        DIM,
        Arc::new(HashingEmbedder::new(DIM)),
    ));
    let store = Arc::new(MemoryStore::new(DIM, DistanceKind::Cosine, Some(Arc::clone(&embedder))));
    let svc = SemanticSearchService::new(
        Arc::clone(&store) as Arc<dyn VectorStore>,
        embedder,
        EnhancementState::Unconfigured,
        3,
    );
    (svc, store)
}

#[derive(Default)]
struct Counting {
    total: AtomicU64,
    steps: AtomicU64,
}

impl Progress for Counting {
    fn set_total(&self, n: u64) {
        self.total.store(n, Ordering::SeqCst);
    }
    fn step(&self, _msg: &str) {
        self.steps.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn ingests_txt_files_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("enz2.txt"), "Xylanase improves dough extensibility.").unwrap();
    fs::write(dir.path().join("enz1.txt"), "Alpha-amylase is dosed at 20 ppm.").unwrap();
    fs::write(dir.path().join("notes.md"), "not ingested").unwrap();
    fs::create_dir(dir.path().join("nested.txt")).unwrap();

    let (svc, store) = service();
    let progress = Counting::default();
    let report = ingest_folder(&svc, dir.path(), &progress).await.unwrap();

    assert_eq!(report.total_files, 2);
    assert_eq!(report.ingested, 2);
    assert!(report.failed.is_empty());
    assert!(report.is_complete());
    assert_eq!(report.store_count, Some(2));
    assert_eq!(progress.total.load(Ordering::SeqCst), 2);
    assert_eq!(progress.steps.load(Ordering::SeqCst), 2);

    let enz1 = store.get("enz1").unwrap();
    assert_eq!(enz1.text, "Alpha-amylase is dosed at 20 ppm.");
    assert_eq!(enz1.metadata.get("document_id"), Some(&json!(1)));
    assert_eq!(store.get("enz2").unwrap().metadata.get("document_id"), Some(&json!(2)));
}

#[tokio::test]
async fn bad_files_are_reported_and_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "Lipase strengthens gluten.").unwrap();
    fs::write(dir.path().join("b.txt"), "   \n").unwrap();
    fs::write(dir.path().join("c.txt"), [0xff, 0xfe, 0xfd]).unwrap();
    fs::write(dir.path().join("d.txt"), "Glucose oxidase dries sticky doughs.").unwrap();

    let (svc, store) = service();
    let report = ingest_folder(&svc, dir.path(), &NoopProgress).await.unwrap();

    assert_eq!(report.total_files, 4);
    assert_eq!(report.ingested, 2);
    assert!(!report.is_complete());
    assert_eq!(
        report.failed.iter().map(|f| f.id.as_str()).collect::<Vec<_>>(),
        vec!["b", "c"]
    );
    assert_eq!(report.store_count, Some(2));
    assert!(report.failed[0].error.starts_with("invalid input"), "{}", report.failed[0].error);
    assert!(
        report.failed[1].error.starts_with("io error: "),
        "{}",
        report.failed[1].error
    );
    // position is kept even after failures
    assert_eq!(store.get("d").unwrap().metadata.get("document_id"), Some(&json!(4)));
}

#[tokio::test]
async fn empty_folder_is_a_complete_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let (svc, _) = service();
    let report = ingest_folder(&svc, dir.path(), &NoopProgress).await.unwrap();
    assert_eq!(report.total_files, 0);
    assert!(report.is_complete());
    assert_eq!(report.store_count, Some(0));
}

#[tokio::test]
async fn missing_or_file_path_is_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("enz1.txt");
    fs::write(&file, "x").unwrap();
    let (svc, _) = service();

    let err = ingest_folder(&svc, dir.path().join("missing"), &NoopProgress)
        .await
        .unwrap_err();
    assert!(matches!(err, SearchError::InvalidInput(_)));

    let err = ingest_folder(&svc, &file, &NoopProgress).await.unwrap_err();
    assert!(matches!(err, SearchError::InvalidInput(_)));
}

#[tokio::test]
async fn ingested_folder_is_searchable() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("enz1.txt"),
        "Alpha-amylase is dosed at 20 ppm to improve crumb structure.",
    )
    .unwrap();
    let (svc, _) = service();
    ingest_folder(&svc, dir.path(), &NoopProgress).await.unwrap();

    let results = svc.search("how much amylase should I use", false).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document_id, 1);
}
