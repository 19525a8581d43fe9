//! Durable per-document embedding cache.
//!
//! Each document's records persist as one JSON file under the cache
//! root, at a path derived from the document's own corpus-relative path
//! (`<root>/<path>.json`). The file is a plain array of record objects;
//! the `metadata.path` / `metadata.lastModified` fields inside each
//! record drive the staleness check and are shared with external
//! consumers of these files.
//!
//! Reads are forgiving: a missing, unreadable, or malformed entry is a
//! cache miss (the caller reindexes), never an error. Writes go through
//! a sibling temp file and a rename, so readers never observe a
//! partially-written entry.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::types::{RetrievalError, VectorRecord};

/// The persisted record set for one document.
#[derive(Clone, Debug)]
pub struct DocumentCacheEntry {
    /// Records in document (sequence) order.
    pub records: Vec<VectorRecord>,
    /// Source document modification time at embed time (epoch
    /// milliseconds) — the sole staleness oracle.
    pub last_modified: i64,
}

/// Filesystem-backed cache of embedding records, keyed by document path.
#[derive(Clone, Debug)]
pub struct EmbeddingCache {
    root: PathBuf,
}

impl EmbeddingCache {
    /// Create a cache rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Compute the cache file path for a document. The mapping is
    /// deterministic and collision-free within one corpus: the
    /// document's own relative path plus a `.json` suffix.
    pub fn entry_path(&self, document_path: &str) -> PathBuf {
        let relative = document_path.trim_start_matches(['/', '\\']);
        self.root.join(format!("{relative}.json"))
    }

    /// Load the cache entry for `document_path`.
    ///
    /// Returns `None` on any miss: no file, unreadable file, malformed
    /// JSON, or an empty record array.
    pub async fn read(&self, document_path: &str) -> Option<DocumentCacheEntry> {
        let path = self.entry_path(document_path);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %path.display(), %err, "cache entry unreadable, treating as miss");
                return None;
            }
        };

        let records: Vec<VectorRecord> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(err) => {
                warn!(path = %path.display(), %err, "cache entry malformed, treating as miss");
                return None;
            }
        };

        let last_modified = records.first()?.chunk.metadata.last_modified;
        Some(DocumentCacheEntry {
            records,
            last_modified,
        })
    }

    /// Persist `records` as the cache entry for `document_path`,
    /// replacing any prior entry. `last_modified` is the source
    /// document's modification time at the moment the embeddings were
    /// computed; the records are expected to carry it in their metadata.
    pub async fn write(
        &self,
        document_path: &str,
        records: &[VectorRecord],
        last_modified: i64,
    ) -> Result<(), RetrievalError> {
        debug_assert!(
            records
                .iter()
                .all(|record| record.chunk.metadata.last_modified == last_modified),
            "records must carry the document's modification time",
        );

        let path = self.entry_path(document_path);
        let cache_write = |source: std::io::Error| RetrievalError::CacheWrite {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(cache_write)?;
        }

        let serialized = serde_json::to_vec(records)
            .map_err(|err| cache_write(err.into()))?;

        // Write-then-rename keeps the swap atomic from a reader's view.
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, &serialized).await.map_err(cache_write)?;
        fs::rename(&staging, &path).await.map_err(cache_write)?;

        debug!(
            path = %path.display(),
            records = records.len(),
            last_modified,
            "wrote cache entry"
        );
        Ok(())
    }

    /// Whether the cached embeddings for `document_path` are out of date
    /// relative to `current_modified` (epoch milliseconds).
    ///
    /// A cache miss is always stale. Otherwise the entry is stale iff
    /// the document's modification time has advanced past the cached one
    /// by strictly more than `threshold_ms` (slack that absorbs
    /// filesystem timestamp jitter). This is the sole gate in front of
    /// re-embedding.
    pub async fn is_stale(
        &self,
        document_path: &str,
        current_modified: i64,
        threshold_ms: i64,
    ) -> bool {
        match self.read(document_path).await {
            None => true,
            Some(entry) => current_modified - entry.last_modified > threshold_ms,
        }
    }

    /// Delete the cache entry for `document_path`. Returns whether an
    /// entry existed.
    pub async fn remove(&self, document_path: &str) -> Result<bool, RetrievalError> {
        let path = self.entry_path(document_path);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
