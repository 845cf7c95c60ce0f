use codebook_chunker::{Budget, ContextWindow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Characters per token assumed by the pre-flight estimate
const CHARS_PER_TOKEN: f64 = 4.0;

/// Pre-flight estimate of model usage for a codebase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallEstimate {
    pub files: usize,
    pub estimated_code_tokens: usize,
    pub estimated_chunks: usize,
    pub estimated_input_tokens: usize,
    pub estimated_response_tokens: usize,
    pub total_tokens: usize,
    pub model_context_length: usize,
    pub max_input_tokens: usize,
}

/// Estimate calls from raw content size, without chunking.
///
/// Counts characters of the listed files only; paths without content count
/// as empty.
pub fn estimate_model_calls(
    file_paths: &[String],
    file_contents: &HashMap<String, String>,
    prompt_overhead: usize,
    window: &dyn ContextWindow,
) -> CallEstimate {
    let budget = Budget::current(window);

    let total_chars: usize = file_paths
        .iter()
        .filter_map(|p| file_contents.get(p))
        .map(|content| content.chars().count())
        .sum();
    let code_tokens = total_chars as f64 / CHARS_PER_TOKEN;

    let effective = budget.effective_input_tokens(prompt_overhead).max(1);
    let estimated_chunks = ((code_tokens / effective as f64).floor() as usize + 1).max(1);

    let input_tokens = (code_tokens + (prompt_overhead * estimated_chunks) as f64).floor() as usize;
    let response_tokens = estimated_chunks * budget.reserved_response_tokens;

    CallEstimate {
        files: file_paths.len(),
        estimated_code_tokens: code_tokens.floor() as usize,
        estimated_chunks,
        estimated_input_tokens: input_tokens,
        estimated_response_tokens: response_tokens,
        total_tokens: input_tokens + response_tokens,
        model_context_length: budget.context_length,
        max_input_tokens: budget.max_input_tokens,
    }
}
