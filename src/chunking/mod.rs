//! Splitting cleaned note text into bounded, overlapping chunks.
//!
//! Chunk boundaries are measured in characters, not bytes, so multi-byte
//! text never splits mid-character. Consecutive chunks share
//! [`ChunkingConfig::overlap`] characters of context.

pub mod cleanup;

pub use cleanup::{clean, is_blank};

use crate::config::ChunkingConfig;
use crate::types::{Chunk, ChunkMetadata, Document};

/// Splits documents into overlapping chunks ready for embedding.
#[derive(Debug, Clone, Default)]
pub struct NoteChunker {
    config: ChunkingConfig,
}

impl NoteChunker {
    /// Create a chunker with the given configuration.
    #[must_use]
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    /// Create a chunker with default configuration (4000 / 80).
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(ChunkingConfig::default())
    }

    /// Clean and chunk a document.
    ///
    /// Returns chunks in document order. An empty or whitespace-only
    /// document (after cleanup) yields no chunks — that is the
    /// "nothing to index" signal, not an error.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        let cleaned = cleanup::clean(&document.text);
        self.chunk_cleaned(document, &cleaned)
    }

    /// Chunk text that has already been through [`cleanup::clean`].
    pub(crate) fn chunk_cleaned(&self, document: &Document, cleaned: &str) -> Vec<Chunk> {
        self.split(cleaned)
            .into_iter()
            .enumerate()
            .map(|(sequence_index, text)| {
                Chunk::new(
                    text,
                    ChunkMetadata {
                        path: document.path.clone(),
                        created_at: document.created_at,
                        last_modified: document.last_modified,
                        sequence_index,
                    },
                )
            })
            .collect()
    }

    /// Split `text` into character windows of `target_size`, each window
    /// after the first starting `overlap` characters before the previous
    /// window's end. The final window is end-anchored, so concatenating
    /// the windows (dropping each overlap) reconstructs `text` exactly.
    fn split(&self, text: &str) -> Vec<String> {
        if cleanup::is_blank(text) {
            return Vec::new();
        }

        let target = self.config.target_size.max(1);
        // Clamp so the window always advances.
        let overlap = self.config.overlap.min(target - 1);

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        if total <= target {
            return vec![text.to_string()];
        }

        let stride = target - overlap;
        let mut windows = Vec::with_capacity((total - overlap).div_ceil(stride));
        let mut start = 0;
        loop {
            let end = (start + target).min(total);
            windows.push(chars[start..end].iter().collect());
            if end == total {
                break;
            }
            start = end - overlap;
        }
        windows
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
