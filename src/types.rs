//! Core data model and error taxonomy shared across the crate.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use uuid::Uuid;

// ── Document ───────────────────────────────────────────────────────────

/// A source document handed to the indexer by the host application.
///
/// Paths are corpus-relative (e.g. `notes/projects/alpha.md`); the host
/// owns the corpus root and file access. Timestamps are epoch
/// milliseconds, matching the cache-file format consumed downstream.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// Corpus-relative path identifying this document.
    pub path: String,
    /// Raw document text, before cleanup.
    pub text: String,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    /// Last modification time in epoch milliseconds.
    pub last_modified: i64,
}

impl Document {
    /// Create a new document.
    pub fn new(
        path: impl Into<String>,
        text: impl Into<String>,
        created_at: i64,
        last_modified: i64,
    ) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
            created_at,
            last_modified,
        }
    }
}

// ── Chunk ──────────────────────────────────────────────────────────────

/// Provenance carried by every chunk.
///
/// Field names serialize in camelCase: `metadata.path` and
/// `metadata.lastModified` are read back by cache consumers for the
/// staleness check and must keep these exact names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// Corpus-relative path of the source document.
    pub path: String,
    /// Source document creation time (epoch milliseconds).
    pub created_at: i64,
    /// Source document modification time at chunking time (epoch
    /// milliseconds).
    pub last_modified: i64,
    /// Zero-based position of this chunk within its document.
    pub sequence_index: usize,
}

/// A bounded slice of a document's cleaned text, the unit of embedding.
///
/// Chunks are immutable: when the source document changes they are
/// superseded by a fresh chunking pass, never edited in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier for this chunk.
    pub id: Uuid,
    /// The chunk text.
    pub text: String,
    /// Provenance of the chunk.
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Create a new chunk with a fresh id.
    pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            metadata,
        }
    }

    /// Corpus-relative path of the source document.
    pub fn path(&self) -> &str {
        &self.metadata.path
    }

    /// Zero-based position within the source document.
    pub fn sequence_index(&self) -> usize {
        self.metadata.sequence_index
    }
}

// ── VectorRecord ───────────────────────────────────────────────────────

/// One embedding vector paired with the chunk it was derived from.
///
/// Serializes flat as `{id, embedding, text, metadata}`, so a cache file
/// is a plain JSON array of these objects.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// The embedding vector. Every record in a given store has the same
    /// length.
    pub embedding: Vec<f32>,
    /// The source chunk.
    #[serde(flatten)]
    pub chunk: Chunk,
}

impl VectorRecord {
    /// Pair an embedding with its chunk.
    pub fn new(embedding: Vec<f32>, chunk: Chunk) -> Self {
        Self { embedding, chunk }
    }

    /// Vector dimensionality.
    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }
}

/// A chunk returned from similarity search, with its score.
///
/// Cosine scores fall in `[-1, 1]`; larger is more similar. Callers must
/// not read anything else into the sign.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

// ── Errors ─────────────────────────────────────────────────────────────

/// Errors surfaced by indexing and retrieval operations.
///
/// Cache *reads* never produce an error: a missing or malformed entry is
/// reported as a miss and the caller reindexes.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// The embedding provider call failed (network, auth, quota).
    #[error("embedding provider error: {0}")]
    Provider(String),

    /// Persisting a cache entry to disk failed. The in-memory store may
    /// be ahead of the durable cache until the next successful write.
    #[error("cache write failed for '{path}': {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The operation was cancelled by the caller's signal.
    #[error("operation cancelled by caller")]
    Cancelled,

    /// A record's vector length did not match the store's dimension.
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Filesystem failure outside the cache write path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        RetrievalError::Provider(err.to_string())
    }
}

// ── Cancellation ───────────────────────────────────────────────────────

/// Create a linked cancellation handle/signal pair.
///
/// The handle stays with the caller; the signal is passed into the query
/// path. Dropping the handle without cancelling leaves the signal
/// permanently unset.
pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// Caller-held handle that flips the linked [`CancelSignal`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation to every linked [`CancelSignal`].
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Cancellation signal observed inside long-running operations.
#[derive(Clone, Debug)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested. If the handle was dropped
    /// without cancelling, this never resolves.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
