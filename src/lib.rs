//! Local semantic retrieval over a note corpus.
//!
//! ```text
//! Document ──► chunking::clean ──► NoteChunker ──► Chunks
//!                                                    │
//!                        CorpusIndexer ◄─────────────┘
//!                              │ (sequential batches + pause)
//!                              ▼
//!                       EmbeddingProvider ──► VectorRecords
//!                              │                    │
//!              EmbeddingCache ◄┴─► (staleness gate) │
//!                    │                              ▼
//!            cache files (JSON)              VectorStore (live)
//!                                                   │
//!                   RetrievalService ◄──────────────┘
//!                         │
//!                query ──► top-k ScoredChunks
//! ```
//!
//! The crate is the retrieval core of a note assistant: the host owns
//! file watching, settings, UI, and the generation step, and calls in
//! through [`CorpusIndexer`] and [`RetrievalService`].

pub mod cache;
pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod indexer;
pub mod retrieval;
pub mod stores;
pub mod types;

pub use cache::{DocumentCacheEntry, EmbeddingCache};
pub use chunking::NoteChunker;
pub use config::{ChunkingConfig, EmbeddingConfig, IndexingConfig};
pub use embeddings::{EmbeddingProvider, HttpEmbeddingProvider, MockEmbeddingProvider};
pub use indexer::CorpusIndexer;
pub use retrieval::{RetrievalService, SearchResults, DEFAULT_TOP_K};
pub use stores::VectorStore;
pub use types::{
    cancellation, CancelHandle, CancelSignal, Chunk, ChunkMetadata, Document, RetrievalError,
    ScoredChunk, VectorRecord,
};
