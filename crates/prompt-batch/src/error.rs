use codebook_chunker::ChunkerError;
use thiserror::Error;

/// Result type for prompt preparation
pub type Result<T> = std::result::Result<T, BatchError>;

/// Errors raised before any prompt is submitted.
///
/// Failures of the generation function are never surfaced here; they are
/// recorded per chunk in [`ChunkResult`](crate::ChunkResult).
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Invalid prompt template: {0}")]
    InvalidTemplate(String),

    #[error(transparent)]
    Chunker(#[from] ChunkerError),

    #[error("Invalid batch configuration: {0}")]
    InvalidConfig(String),
}
