//! Indexing orchestration: clean → staleness gate → chunk → batched
//! embedding → store swap → cache write.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info, warn};

use crate::cache::EmbeddingCache;
use crate::chunking::{self, NoteChunker};
use crate::config::IndexingConfig;
use crate::embeddings::EmbeddingProvider;
use crate::stores::VectorStore;
use crate::types::{Chunk, Document, RetrievalError, VectorRecord};

/// Drives the indexing pipeline for one corpus.
///
/// Embedding batches within a document are issued strictly one after
/// another, separated by the configured pause — explicit backpressure
/// against provider rate limits, not an incidental ordering. Distinct
/// documents may index concurrently; operations touching the same path
/// serialize on a per-path lock so a reindex's remove+add swap stays
/// atomic.
pub struct CorpusIndexer {
    chunker: NoteChunker,
    provider: Arc<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
    store: Arc<VectorStore>,
    config: IndexingConfig,
    path_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl CorpusIndexer {
    /// Create an indexer with default chunking and indexing
    /// configuration.
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        cache: EmbeddingCache,
        store: Arc<VectorStore>,
    ) -> Self {
        Self {
            chunker: NoteChunker::with_defaults(),
            provider,
            cache,
            store,
            config: IndexingConfig::default(),
            path_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Override the chunker.
    #[must_use]
    pub fn with_chunker(mut self, chunker: NoteChunker) -> Self {
        self.chunker = chunker;
        self
    }

    /// Override the indexing configuration.
    #[must_use]
    pub fn with_config(mut self, config: IndexingConfig) -> Self {
        self.config = config;
        self
    }

    /// The live vector store this indexer feeds.
    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }

    /// The durable cache this indexer maintains.
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// Index one document. Returns `true` if it was (re)indexed, `false`
    /// if it was skipped — either nothing indexable after cleanup, or
    /// the cache entry is still fresh.
    ///
    /// A provider failure mid-document aborts the whole operation: no
    /// cache write, no store mutation, the document stays at its last
    /// successfully indexed state. A cache-write failure propagates
    /// after the store was already updated; memory runs ahead of disk
    /// until the next successful write.
    pub async fn index_document(&self, document: &Document) -> Result<bool, RetrievalError> {
        let cleaned = chunking::clean(&document.text);
        if chunking::is_blank(&cleaned) {
            debug!(path = %document.path, "nothing to index after cleanup");
            return Ok(false);
        }

        let _guard = self.lock_path(&document.path).await;

        if !self
            .cache
            .is_stale(
                &document.path,
                document.last_modified,
                self.config.staleness_threshold_ms,
            )
            .await
        {
            debug!(path = %document.path, "cache entry fresh, skipping reindex");
            return Ok(false);
        }

        let chunks = self.chunker.chunk_cleaned(document, &cleaned);
        let embeddings = self.embed_chunks(&document.path, &chunks).await?;

        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorRecord::new(embedding, chunk))
            .collect();

        self.store.replace(&document.path, records.clone())?;
        self.cache
            .write(&document.path, &records, document.last_modified)
            .await?;

        info!(path = %document.path, chunks = records.len(), "indexed document");
        Ok(true)
    }

    /// Hydrate one document's records from the durable cache into the
    /// live store (cold start). Returns `false` on a cache miss or when
    /// the cached vectors no longer fit the store's dimension — both
    /// mean the host should reindex.
    pub async fn load_from_cache(&self, document_path: &str) -> Result<bool, RetrievalError> {
        let _guard = self.lock_path(document_path).await;

        let Some(entry) = self.cache.read(document_path).await else {
            return Ok(false);
        };

        match self.store.replace(document_path, entry.records) {
            Ok(_) => {
                debug!(path = document_path, "loaded cached records into store");
                Ok(true)
            }
            Err(RetrievalError::DimensionMismatch { expected, got }) => {
                warn!(
                    path = document_path,
                    expected, got, "cached records have a different dimension, treating as miss"
                );
                Ok(false)
            }
            Err(other) => Err(other),
        }
    }

    /// Drop a deleted document from the live store and the durable
    /// cache. Returns the number of records removed from the store.
    pub async fn remove_document(&self, document_path: &str) -> Result<usize, RetrievalError> {
        let _guard = self.lock_path(document_path).await;
        let removed = self.store.remove_by_path(document_path);
        self.cache.remove(document_path).await?;
        Ok(removed)
    }

    /// Whether the cached embeddings for a document are out of date
    /// relative to `current_modified` (epoch milliseconds). Exposed so
    /// the host's change triggers can gate their calls.
    pub async fn is_stale(&self, document_path: &str, current_modified: i64) -> bool {
        self.cache
            .is_stale(
                document_path,
                current_modified,
                self.config.staleness_threshold_ms,
            )
            .await
    }

    /// Embed chunk texts in sequential batches with the mandated pause
    /// between consecutive calls.
    async fn embed_chunks(
        &self,
        path: &str,
        chunks: &[Chunk],
    ) -> Result<Vec<Vec<f32>>, RetrievalError> {
        let batch_size = self.config.batch_size.max(1);
        let mut embeddings = Vec::with_capacity(chunks.len());

        for (index, batch) in chunks.chunks(batch_size).enumerate() {
            if index > 0 {
                tokio::time::sleep(self.config.batch_pause).await;
            }

            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let vectors = self.provider.embed_batch(&texts).await?;
            if vectors.len() != texts.len() {
                return Err(RetrievalError::Provider(format!(
                    "provider returned {} embeddings for {} inputs",
                    vectors.len(),
                    texts.len()
                )));
            }

            debug!(path, batch = index + 1, size = texts.len(), "embedded batch");
            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }

    /// Get or create the serialization lock for a document path.
    async fn lock_path(&self, path: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.path_locks.lock();
            locks
                .entry(path.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
