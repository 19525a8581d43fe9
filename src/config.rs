//! Configuration for chunking, embedding, and indexing.
//!
//! All configs use builder-style `#[must_use]` setters over documented
//! defaults. The embedding secrets can be pulled from the environment
//! (`.env` aware) so hosts don't have to thread the token through their
//! own settings layer.

use std::env;
use std::time::Duration;

// ── ChunkingConfig ─────────────────────────────────────────────────────

/// Configuration for [`NoteChunker`](crate::chunking::NoteChunker).
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Target chunk length in characters. Default: 4000.
    pub target_size: usize,
    /// Characters shared between consecutive chunks. Default: 80.
    /// Must be smaller than `target_size`.
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_size: 4000,
            overlap: 80,
        }
    }
}

impl ChunkingConfig {
    /// Create a config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target chunk length in characters.
    #[must_use]
    pub fn target_size(mut self, chars: usize) -> Self {
        self.target_size = chars;
        self
    }

    /// Set the overlap between consecutive chunks.
    ///
    /// # Panics (debug only)
    ///
    /// Debug-asserts that `chars` is smaller than the target size.
    #[must_use]
    pub fn overlap(mut self, chars: usize) -> Self {
        debug_assert!(
            chars < self.target_size,
            "overlap {chars} must be smaller than target_size {}",
            self.target_size,
        );
        self.overlap = chars;
        self
    }
}

// ── EmbeddingConfig ────────────────────────────────────────────────────

/// Configuration for [`HttpEmbeddingProvider`](crate::embeddings::HttpEmbeddingProvider).
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Model identifier sent to the provider.
    /// Default: `text-embedding-3-small`.
    pub model: String,
    /// Requested output dimensionality. Default: 1536.
    pub dimensions: usize,
    /// Opaque API token; supplied externally, never persisted by this
    /// crate.
    pub api_token: String,
    /// Endpoint base, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Per-request timeout at the provider boundary — the only blocking
    /// point in the pipeline with a mandatory bound. Default: 30 s.
    pub request_timeout: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            api_token: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl EmbeddingConfig {
    /// Create a config with defaults and the given token.
    #[must_use]
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            ..Self::default()
        }
    }

    /// Read configuration from the environment (`.env` files honored).
    ///
    /// Returns `None` when `NOTESMITH_EMBEDDING_API_TOKEN` is unset;
    /// `NOTESMITH_EMBEDDING_MODEL`, `NOTESMITH_EMBEDDING_DIMENSIONS`,
    /// and `NOTESMITH_EMBEDDING_BASE_URL` fall back to defaults.
    pub fn from_env() -> Option<Self> {
        let _ = dotenvy::dotenv();
        let api_token = env::var("NOTESMITH_EMBEDDING_API_TOKEN").ok()?;

        let mut config = Self::new(api_token);
        if let Ok(model) = env::var("NOTESMITH_EMBEDDING_MODEL") {
            config.model = model;
        }
        if let Some(dimensions) = env::var("NOTESMITH_EMBEDDING_DIMENSIONS")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
        {
            config.dimensions = dimensions;
        }
        if let Ok(base_url) = env::var("NOTESMITH_EMBEDDING_BASE_URL") {
            config.base_url = base_url;
        }
        Some(config)
    }

    /// Set the model identifier.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the requested output dimensionality.
    #[must_use]
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Set the endpoint base URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

// ── IndexingConfig ─────────────────────────────────────────────────────

/// Configuration for [`CorpusIndexer`](crate::indexer::CorpusIndexer).
#[derive(Debug, Clone)]
pub struct IndexingConfig {
    /// Texts per embedding call. Default: 3.
    pub batch_size: usize,
    /// Mandatory pause between consecutive embedding batches. This is a
    /// rate-limit contract with the provider, not a tunable
    /// optimization. Default: 3 s.
    pub batch_pause: Duration,
    /// Modification-time slack before a cache entry counts as stale,
    /// absorbing filesystem timestamp jitter. Default: 1000 ms.
    pub staleness_threshold_ms: i64,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            batch_pause: Duration::from_secs(3),
            staleness_threshold_ms: 1000,
        }
    }
}

impl IndexingConfig {
    /// Create a config with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of texts per embedding call.
    ///
    /// # Panics (debug only)
    ///
    /// Debug-asserts that `size` is non-zero.
    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        debug_assert!(size > 0, "batch_size must be non-zero");
        self.batch_size = size;
        self
    }

    /// Set the pause between embedding batches.
    #[must_use]
    pub fn batch_pause(mut self, pause: Duration) -> Self {
        self.batch_pause = pause;
        self
    }

    /// Set the staleness threshold in milliseconds.
    #[must_use]
    pub fn staleness_threshold_ms(mut self, threshold: i64) -> Self {
        self.staleness_threshold_ms = threshold;
        self
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
