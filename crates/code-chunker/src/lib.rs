//! # Codebook Chunker
//!
//! Hierarchical, grammar-aware chunking of whole codebases into token-bounded
//! windows for size-limited text generation services.
//!
//! ## Architecture
//!
//! ```text
//! (base_dir, [path], {path → content})
//!     │
//!     ├──> Directory Grouper → level-1 listing records
//!     │
//!     ├──> Structural Extractor (per file, on a worker pool)
//!     │    ├─> level 2: whole file
//!     │    ├─> tree-sitter grammar → levels 3/4/5
//!     │    └─> heuristic line signatures → levels 3/4 (fallback)
//!     │
//!     ├──> RecordArena (flat, index-based parent links)
//!     │
//!     └──> Chunk Packer (sequential)
//!          ├─> sort by (file_path, start_line)
//!          ├─> greedy fill up to the Budget
//!          └─> carry overlap into the next chunk
//! ```
//!
//! ## Example
//!
//! ```rust
//! use codebook_chunker::{chunk_codebase, ChunkerConfig, FixedContextWindow};
//! use std::collections::HashMap;
//! use std::path::Path;
//!
//! let paths = vec!["src/lib.rs".to_string()];
//! let mut contents = HashMap::new();
//! contents.insert(
//!     "src/lib.rs".to_string(),
//!     "pub fn add(a: i32, b: i32) -> i32 {\n    a + b\n}\n".to_string(),
//! );
//!
//! let chunks = chunk_codebase(
//!     Path::new(""),
//!     &paths,
//!     &contents,
//!     &FixedContextWindow(8192),
//!     &ChunkerConfig::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].files, vec!["src/lib.rs".to_string()]);
//! ```

mod arena;
mod budget;
mod chunker;
mod config;
mod directory;
mod error;
mod extractor;
mod language;
mod packer;
pub mod parser;
mod tokens;
mod types;

pub use arena::RecordArena;
pub use budget::{
    Budget, ContextWindow, EnvContextWindow, FixedContextWindow, SharedContextWindow,
    CONTEXT_LENGTH_ENV, DEFAULT_CONTEXT_LENGTH,
};
pub use chunker::{chunk_codebase, CodebaseChunker};
pub use config::ChunkerConfig;
pub use directory::{group_by_directory, relative_to, DirectoryGroup};
pub use error::{ChunkerError, Result};
pub use extractor::{StructuralExtractor, PLAIN_TEXT};
pub use language::{Language, NodeTypes};
pub use packer::{ChunkPacker, PackingStats};
pub use tokens::estimate_tokens;
pub use types::{ChunkRecord, ChunkSummary, HierarchyLevel, PackedChunk};
