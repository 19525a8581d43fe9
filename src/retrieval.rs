//! Query façade: embed the query once, rank against the live store.

use std::sync::Arc;

use tracing::debug;

use crate::embeddings::EmbeddingProvider;
use crate::stores::VectorStore;
use crate::types::{CancelSignal, RetrievalError, ScoredChunk};

/// Default number of chunks returned by a search.
pub const DEFAULT_TOP_K: usize = 8;

/// Outcome of a search.
///
/// `ready: false` means the store had no records yet (cold start before
/// any document was indexed or hydrated); the caller should invite the
/// user to wait rather than treat it as a failure.
#[derive(Clone, Debug, Default)]
pub struct SearchResults {
    /// Matching chunks, best first.
    pub hits: Vec<ScoredChunk>,
    /// Whether the store was populated when the search ran.
    pub ready: bool,
}

impl SearchResults {
    fn not_ready() -> Self {
        Self {
            hits: Vec::new(),
            ready: false,
        }
    }

    /// Whether the store was populated when the search ran.
    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Answers "which chunks across the corpus are most relevant to this
/// query".
pub struct RetrievalService {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<VectorStore>,
    default_k: usize,
}

impl RetrievalService {
    /// Create a service over a provider and the live store.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<VectorStore>) -> Self {
        Self {
            provider,
            store,
            default_k: DEFAULT_TOP_K,
        }
    }

    /// Override the default result count.
    #[must_use]
    pub fn default_top_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    /// Return up to `k` chunks (default [`DEFAULT_TOP_K`]) ranked by
    /// similarity to `query`.
    ///
    /// An unpopulated store yields the designed soft-empty not-ready
    /// state without calling the provider. Provider failures propagate —
    /// an interactive caller must be able to tell "nothing matched"
    /// from "the search broke".
    pub async fn search(
        &self,
        query: &str,
        k: Option<usize>,
    ) -> Result<SearchResults, RetrievalError> {
        if self.store.is_empty() {
            debug!("vector store not yet populated, returning not-ready");
            return Ok(SearchResults::not_ready());
        }

        let query_vector = self.embed_query(query).await?;
        let hits = self
            .store
            .similarity_search(&query_vector, k.unwrap_or(self.default_k));

        debug!(hits = hits.len(), "search complete");
        Ok(SearchResults { hits, ready: true })
    }

    /// Like [`search`](Self::search), but races the provider call
    /// against `signal`. Cancellation yields
    /// [`RetrievalError::Cancelled`], distinguishable from a provider
    /// failure.
    pub async fn search_with_signal(
        &self,
        query: &str,
        k: Option<usize>,
        signal: &CancelSignal,
    ) -> Result<SearchResults, RetrievalError> {
        if signal.is_cancelled() {
            return Err(RetrievalError::Cancelled);
        }

        tokio::select! {
            _ = signal.cancelled() => Err(RetrievalError::Cancelled),
            results = self.search(query, k) => results,
        }
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, RetrievalError> {
        let texts = vec![query.to_string()];
        let mut vectors = self.provider.embed_batch(&texts).await?;
        if vectors.len() != 1 {
            return Err(RetrievalError::Provider(format!(
                "provider returned {} embeddings for a single query",
                vectors.len()
            )));
        }
        Ok(vectors.remove(0))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
