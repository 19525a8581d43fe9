//! Embedding providers.
//!
//! The pipeline never talks to a provider directly; everything goes
//! through the [`EmbeddingProvider`] trait so hosts can inject their own
//! client and tests can run deterministically offline.

pub mod http;

pub use http::HttpEmbeddingProvider;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::RetrievalError;

/// Converts text into fixed-dimension vectors.
///
/// # Contract
///
/// - Output order matches input order, one vector per text.
/// - Every vector has [`dimensions`](Self::dimensions) entries for a
///   given provider configuration.
/// - Failures surface as [`RetrievalError::Provider`]; implementations
///   do not retry internally — retry policy belongs to the caller.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier used in logs.
    fn id(&self) -> &str;

    /// Output dimensionality for this configuration.
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError>;
}

// ── MockEmbeddingProvider ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct MockState {
    batch_sizes: Vec<usize>,
    fail_from_call: Option<usize>,
}

/// Deterministic in-process provider for tests and offline development.
///
/// Vectors are derived from a hash of the text, so identical inputs
/// always embed identically. The provider records the size of every
/// batch it receives and can be armed to fail from the nth call on.
#[derive(Clone, Debug)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
    delay: Option<Duration>,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbeddingProvider {
    /// Create a mock with 8-dimensional output.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dimensions(8)
    }

    /// Create a mock with the given output dimensionality.
    #[must_use]
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            delay: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Sleep this long inside every call, to exercise cancellation and
    /// timeout paths.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every call from `call` on (1-based).
    #[must_use]
    pub fn failing_from_call(self, call: usize) -> Self {
        self.state.lock().fail_from_call = Some(call);
        self
    }

    /// Sizes of the batches received so far, in call order.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.state.lock().batch_sizes.clone()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.state.lock().batch_sizes.len()
    }
}

fn hash_to_vec(text: &str, dimensions: usize) -> Vec<f32> {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();
    (0..dimensions)
        .map(|i| {
            let bits = seed.rotate_left(((i % 8) * 8) as u32) ^ ((i as u64) << 24);
            ((bits as f64) / (u64::MAX as f64)) as f32
        })
        .collect()
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn id(&self) -> &str {
        "mock"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RetrievalError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let (call, fail_from) = {
            let mut state = self.state.lock();
            state.batch_sizes.push(texts.len());
            (state.batch_sizes.len(), state.fail_from_call)
        };
        if fail_from.is_some_and(|fail_from| call >= fail_from) {
            return Err(RetrievalError::Provider(format!(
                "mock provider armed to fail on call {call}"
            )));
        }

        Ok(texts
            .iter()
            .map(|text| hash_to_vec(text, self.dimensions))
            .collect())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
