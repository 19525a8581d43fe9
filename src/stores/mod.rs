//! In-memory vector store with brute-force cosine search.
//!
//! The store is the live, queryable aggregate for a retrieval session:
//! records are grouped by source path (so reindexing a document swaps
//! its run in one step) and searched as a flat index. It is rebuilt
//! from cache files on cold start and lives for the process lifetime.

use std::cmp::Ordering;
use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::types::{RetrievalError, ScoredChunk, VectorRecord};

#[derive(Default)]
struct Inner {
    by_path: HashMap<String, Vec<OrderedRecord>>,
    next_order: u64,
    dimensions: Option<usize>,
}

struct OrderedRecord {
    /// Global insertion counter; breaks similarity ties stably.
    order: u64,
    record: VectorRecord,
}

/// Thread-safe in-memory collection of [`VectorRecord`]s.
///
/// Mutations (`add`, `remove_by_path`, `replace`) take a write lock, so
/// a concurrent [`similarity_search`](Self::similarity_search) never
/// observes a half-applied reindex. The lock is never held across an
/// `.await`.
#[derive(Default)]
pub struct VectorStore {
    inner: RwLock<Inner>,
}

impl VectorStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of records across all paths.
    pub fn len(&self) -> usize {
        self.inner.read().by_path.values().map(Vec::len).sum()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.inner.read().by_path.values().all(Vec::is_empty)
    }

    /// Vector dimensionality of the stored records, if any are present.
    pub fn dimensions(&self) -> Option<usize> {
        self.inner.read().dimensions
    }

    /// Append records. No de-duplication happens here: callers reindexing
    /// a document remove its old records first (or use [`replace`](Self::replace)).
    ///
    /// # Errors
    ///
    /// [`RetrievalError::DimensionMismatch`] if any record's vector
    /// length differs from the store's established dimension. The store
    /// is left unchanged on error.
    pub fn add(&self, records: Vec<VectorRecord>) -> Result<(), RetrievalError> {
        let mut inner = self.inner.write();
        validate_dimensions(&inner, None, &records)?;
        insert_records(&mut inner, records);
        Ok(())
    }

    /// Remove every record whose source path equals `path`. Returns the
    /// number removed; a no-op for unknown paths.
    pub fn remove_by_path(&self, path: &str) -> usize {
        let mut inner = self.inner.write();
        let removed = inner.by_path.remove(path).map_or(0, |run| run.len());
        if removed > 0 {
            debug!(path, removed, "removed records from vector store");
        }
        refresh_dimensions(&mut inner);
        removed
    }

    /// Atomically swap the records for `path`: the remove and the add
    /// happen under one write lock, so concurrent searches see either
    /// the old run or the new one, never a mix. Returns the number of
    /// records removed.
    ///
    /// # Errors
    ///
    /// [`RetrievalError::DimensionMismatch`] if the new records don't
    /// match the dimension of records belonging to *other* paths. The
    /// store is left unchanged on error.
    pub fn replace(
        &self,
        path: &str,
        records: Vec<VectorRecord>,
    ) -> Result<usize, RetrievalError> {
        let mut inner = self.inner.write();
        validate_dimensions(&inner, Some(path), &records)?;

        let removed = inner.by_path.remove(path).map_or(0, |run| run.len());
        refresh_dimensions(&mut inner);
        insert_records(&mut inner, records);
        debug!(path, removed, "replaced records in vector store");
        Ok(removed)
    }

    /// Return up to `k` chunks ranked by descending cosine similarity to
    /// `query`, ties broken by insertion order. `k == 0` and an empty
    /// store both yield an empty result, never an error.
    pub fn similarity_search(&self, query: &[f32], k: usize) -> Vec<ScoredChunk> {
        if k == 0 {
            return Vec::new();
        }

        let inner = self.inner.read();
        let mut scored: Vec<(f32, u64, &VectorRecord)> = inner
            .by_path
            .values()
            .flatten()
            .map(|entry| {
                (
                    cosine_similarity(query, &entry.record.embedding),
                    entry.order,
                    &entry.record,
                )
            })
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });

        scored
            .into_iter()
            .take(k)
            .map(|(score, _, record)| ScoredChunk {
                chunk: record.chunk.clone(),
                score,
            })
            .collect()
    }
}

fn insert_records(inner: &mut Inner, records: Vec<VectorRecord>) {
    for record in records {
        if inner.dimensions.is_none() {
            inner.dimensions = Some(record.dimensions());
        }
        let order = inner.next_order;
        inner.next_order += 1;
        inner
            .by_path
            .entry(record.chunk.path().to_string())
            .or_default()
            .push(OrderedRecord { order, record });
    }
}

/// Check that `records` agree with each other and with the dimension of
/// records the mutation will keep (`skip_path` names the run about to be
/// replaced, which doesn't count).
fn validate_dimensions(
    inner: &Inner,
    skip_path: Option<&str>,
    records: &[VectorRecord],
) -> Result<(), RetrievalError> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    let expected = first.dimensions();
    for record in records {
        if record.dimensions() != expected {
            return Err(RetrievalError::DimensionMismatch {
                expected,
                got: record.dimensions(),
            });
        }
    }

    let keeps_others = inner
        .by_path
        .iter()
        .any(|(path, run)| skip_path != Some(path.as_str()) && !run.is_empty());
    if keeps_others {
        if let Some(dimensions) = inner.dimensions {
            if expected != dimensions {
                return Err(RetrievalError::DimensionMismatch {
                    expected: dimensions,
                    got: expected,
                });
            }
        }
    }
    Ok(())
}

/// Forget the established dimension once the store is empty, so a
/// provider change doesn't wedge future loads.
fn refresh_dimensions(inner: &mut Inner) {
    if inner.by_path.values().all(Vec::is_empty) {
        inner.dimensions = None;
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

// ── Tests ──────────────────────────────────────────────────────────────
