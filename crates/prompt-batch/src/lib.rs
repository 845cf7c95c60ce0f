//! # Codebook Batch
//!
//! Turns packed code chunks into prompts and submits them, one at a time, to
//! an external text generation service.
//!
//! - [`process_code_for_llm`] chunks a codebase and wraps each chunk in a
//!   `{code}` template, skipping chunks that would not fit.
//! - [`estimate_model_calls`] gives a quick pre-flight estimate from content
//!   size alone.
//! - [`batch_process_chunks`] submits prepared prompts, retrying transient
//!   failures with jittered exponential backoff and recording every other
//!   failure per chunk.

mod cancel;
mod command;
mod config;
mod error;
mod estimate;
mod prepare;
mod retry;
mod runner;
mod template;

pub use cancel::CancelToken;
pub use command::{CommandGenerator, USE_CACHE_ENV};
pub use config::BatchConfig;
pub use error::{BatchError, Result};
pub use estimate::{estimate_model_calls, CallEstimate};
pub use prepare::{process_code_for_llm, PreparedPrompt, PromptPreparer};
pub use retry::{backoff_delay, is_transient, is_transient_message};
pub use runner::{batch_process_chunks, ChunkResult, ChunkStatus, FnGenerator, Generator};
pub use template::{PromptTemplate, CODE_PLACEHOLDER, DEFAULT_PROMPT_OVERHEAD};
