//! End-to-end pipeline tests with the deterministic mock provider.
//!
//! These exercise the full index → cache → store → search flow the way
//! a host application drives it, including cold-start rehydration and
//! reindex-after-edit, without any network access.

use std::sync::Arc;
use std::time::Duration;

use tempfile::tempdir;

use notesmith::{
    cancellation, ChunkingConfig, CorpusIndexer, Document, EmbeddingCache, EmbeddingProvider,
    IndexingConfig, MockEmbeddingProvider, NoteChunker, RetrievalError, RetrievalService,
    VectorStore,
};

fn session(
    cache_dir: &std::path::Path,
    provider: MockEmbeddingProvider,
) -> (CorpusIndexer, RetrievalService, Arc<VectorStore>) {
    let store = Arc::new(VectorStore::new());
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(provider);
    let indexer = CorpusIndexer::new(
        Arc::clone(&provider),
        EmbeddingCache::new(cache_dir),
        Arc::clone(&store),
    );
    let service = RetrievalService::new(provider, Arc::clone(&store));
    (indexer, service, store)
}

#[tokio::test]
async fn index_then_search_finds_the_matching_note() {
    let dir = tempdir().unwrap();
    let (indexer, service, _store) = session(dir.path(), MockEmbeddingProvider::new());

    let notes = [
        Document::new("notes/rust.md", "ownership and borrowing in rust", 100, 1_000),
        Document::new("notes/garden.md", "pruning tomato plants in july", 100, 1_000),
        Document::new("notes/travel.md", "train routes through the alps", 100, 1_000),
    ];
    for note in &notes {
        assert!(indexer.index_document(note).await.unwrap());
    }

    // The mock embeds identical text identically, so querying with a
    // note's exact text must rank that note first with score ~1.0.
    let results = service
        .search("pruning tomato plants in july", None)
        .await
        .unwrap();

    assert!(results.is_ready());
    assert_eq!(results.hits[0].chunk.path(), "notes/garden.md");
    assert!((results.hits[0].score - 1.0).abs() < 1e-5);
    assert!(results.hits.len() <= notesmith::DEFAULT_TOP_K);
}

#[tokio::test]
async fn search_before_any_indexing_is_not_ready() {
    let dir = tempdir().unwrap();
    let (_indexer, service, _store) = session(dir.path(), MockEmbeddingProvider::new());

    let results = service.search("anything at all", None).await.unwrap();
    assert!(!results.is_ready());
    assert!(results.hits.is_empty());
}

#[tokio::test]
async fn cold_start_rehydrates_without_reembedding() {
    let dir = tempdir().unwrap();

    // Session one builds the cache.
    {
        let (indexer, _service, _store) = session(dir.path(), MockEmbeddingProvider::new());
        for (path, text) in [
            ("notes/a.md", "first note body"),
            ("notes/b.md", "second note body"),
        ] {
            assert!(indexer
                .index_document(&Document::new(path, text, 100, 1_000))
                .await
                .unwrap());
        }
    }

    // Session two starts with an empty store and the same cache root.
    let provider = MockEmbeddingProvider::new();
    let (indexer, service, store) = session(dir.path(), provider.clone());

    assert!(indexer.load_from_cache("notes/a.md").await.unwrap());
    assert!(indexer.load_from_cache("notes/b.md").await.unwrap());
    assert_eq!(store.len(), 2);
    assert_eq!(provider.call_count(), 0, "hydration embeds nothing");

    // Cached entries are still fresh, so indexing is a no-op.
    assert!(!indexer
        .index_document(&Document::new("notes/a.md", "first note body", 100, 1_000))
        .await
        .unwrap());
    assert_eq!(provider.call_count(), 0);

    let results = service.search("second note body", None).await.unwrap();
    assert_eq!(results.hits[0].chunk.path(), "notes/b.md");
}

#[tokio::test]
async fn editing_a_note_reindexes_and_supersedes_old_chunks() {
    let dir = tempdir().unwrap();
    let (indexer, service, store) = session(dir.path(), MockEmbeddingProvider::new());

    let original = Document::new("notes/a.md", "the meeting is on tuesday", 100, 1_000);
    assert!(indexer.index_document(&original).await.unwrap());
    assert!(!indexer.is_stale("notes/a.md", 1_000).await);

    // Host sees a new mtime well past the jitter threshold.
    let edited = Document::new("notes/a.md", "the meeting moved to friday", 100, 60_000);
    assert!(indexer.is_stale("notes/a.md", edited.last_modified).await);
    assert!(indexer.index_document(&edited).await.unwrap());

    let results = service
        .search("the meeting moved to friday", None)
        .await
        .unwrap();
    assert!((results.hits[0].score - 1.0).abs() < 1e-5);

    // Only the superseding records remain for that path.
    assert_eq!(store.len(), 1);
    assert_eq!(
        store
            .similarity_search(&vec![0.0; 8], 10)
            .iter()
            .filter(|hit| hit.chunk.path() == "notes/a.md")
            .count(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn long_document_respects_batch_cadence_end_to_end() {
    let dir = tempdir().unwrap();
    let store = Arc::new(VectorStore::new());
    let provider = MockEmbeddingProvider::new();
    let indexer = CorpusIndexer::new(
        Arc::new(provider.clone()),
        EmbeddingCache::new(dir.path()),
        Arc::clone(&store),
    )
    .with_chunker(NoteChunker::new(
        ChunkingConfig::new().target_size(40).overlap(8),
    ))
    .with_config(
        IndexingConfig::new()
            .batch_size(3)
            .batch_pause(Duration::from_secs(3)),
    );

    // 232 chars at 40/8 → stride 32 → ceil(224/32) = 7 chunks.
    let body: String = (0..232)
        .map(|i| char::from_u32('a' as u32 + (i % 26) as u32).unwrap())
        .collect();
    let began = tokio::time::Instant::now();
    assert!(indexer
        .index_document(&Document::new("notes/long.md", &body, 100, 1_000))
        .await
        .unwrap());

    assert_eq!(provider.batch_sizes(), vec![3, 3, 1]);
    assert_eq!(began.elapsed(), Duration::from_secs(6));
    assert_eq!(store.len(), 7);
}

#[tokio::test]
async fn deleting_a_note_removes_it_from_search() {
    let dir = tempdir().unwrap();
    let (indexer, service, _store) = session(dir.path(), MockEmbeddingProvider::new());

    for (path, text) in [
        ("notes/keep.md", "note that stays"),
        ("notes/drop.md", "note that goes"),
    ] {
        assert!(indexer
            .index_document(&Document::new(path, text, 100, 1_000))
            .await
            .unwrap());
    }

    indexer.remove_document("notes/drop.md").await.unwrap();

    let results = service.search("note that goes", None).await.unwrap();
    assert!(results.is_ready());
    assert!(results
        .hits
        .iter()
        .all(|hit| hit.chunk.path() != "notes/drop.md"));

    // The cache entry is gone too: a future index call must re-embed.
    assert!(indexer.is_stale("notes/drop.md", 1_000).await);
}

#[tokio::test(start_paused = true)]
async fn cancelled_search_reports_cancellation_not_failure() {
    let dir = tempdir().unwrap();
    let provider = MockEmbeddingProvider::new().with_delay(Duration::from_secs(30));
    let (indexer, _service, store) = session(dir.path(), MockEmbeddingProvider::new());
    assert!(indexer
        .index_document(&Document::new("notes/a.md", "some note", 100, 1_000))
        .await
        .unwrap());

    // A slow provider on the query path, same populated store.
    let service = RetrievalService::new(Arc::new(provider), store);
    let (handle, signal) = cancellation();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
    });

    let err = service
        .search_with_signal("some note", None, &signal)
        .await
        .unwrap_err();
    assert!(matches!(err, RetrievalError::Cancelled));
}
