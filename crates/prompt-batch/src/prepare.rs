use crate::error::Result;
use crate::template::{PromptTemplate, DEFAULT_PROMPT_OVERHEAD};
use codebook_chunker::{
    estimate_tokens, Budget, ChunkSummary, ChunkerConfig, CodebaseChunker, ContextWindow,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A chunk wrapped in its prompt, ready for submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedPrompt {
    pub prompt: String,
    pub chunk_id: usize,
    pub files: Vec<String>,
    /// Chunk tokens plus the assumed prompt overhead
    pub token_count: usize,
    /// Estimate of the rendered prompt
    pub estimated_tokens: usize,
    /// `token_count` as a percentage of `max_input_tokens`
    pub token_utilization: f64,
    pub estimated_response_tokens: usize,
}

/// Wraps packed chunks in a prompt template
#[derive(Debug, Clone)]
pub struct PromptPreparer {
    template: PromptTemplate,
    overhead: usize,
    chunker_config: ChunkerConfig,
}

impl PromptPreparer {
    /// Preparer that reserves `overhead` tokens per chunk for the template
    pub fn new(template: PromptTemplate, overhead: usize) -> Self {
        Self {
            template,
            overhead,
            chunker_config: ChunkerConfig::for_prompts(overhead),
        }
    }

    /// Use `config` for chunking; its reserved prompt tokens are replaced by the overhead
    #[must_use]
    pub fn with_chunker_config(mut self, config: ChunkerConfig) -> Self {
        self.chunker_config = ChunkerConfig {
            reserved_prompt_tokens: self.overhead,
            ..config
        };
        self
    }

    pub const fn overhead(&self) -> usize {
        self.overhead
    }

    /// Render one prompt per chunk, skipping chunks too large for the budget
    pub fn prepare(&self, chunks: &[ChunkSummary], budget: Budget) -> Vec<PreparedPrompt> {
        let limit = budget.effective_input_tokens(self.overhead);
        let mut prompts = Vec::with_capacity(chunks.len());

        for chunk in chunks {
            if chunk.token_count > limit {
                log::warn!(
                    "Chunk {} exceeds max token limit ({} > {limit}). Skipping.",
                    chunk.chunk_id,
                    chunk.token_count
                );
                continue;
            }

            let prompt = self.template.render(&chunk.content);
            let token_count = chunk.token_count + self.overhead;
            let token_utilization = if budget.max_input_tokens == 0 {
                0.0
            } else {
                token_count as f64 / budget.max_input_tokens as f64 * 100.0
            };

            prompts.push(PreparedPrompt {
                estimated_tokens: estimate_tokens(&prompt),
                prompt,
                chunk_id: chunk.chunk_id,
                files: chunk.files.clone(),
                token_count,
                token_utilization,
                estimated_response_tokens: budget.reserved_response_tokens,
            });
        }

        prompts
    }

    /// Chunk a codebase and prepare its prompts under the window's current budget
    pub fn run(
        &self,
        base_dir: &Path,
        file_paths: &[String],
        file_contents: &HashMap<String, String>,
        window: &dyn ContextWindow,
    ) -> Result<Vec<PreparedPrompt>> {
        let budget = Budget::current(window);
        log::info!("Model context length: {}", budget.context_length);
        log::info!("Max input tokens (80%): {}", budget.max_input_tokens);
        log::info!(
            "Effective max tokens for code: {}",
            budget.effective_input_tokens(self.overhead)
        );

        let chunker = CodebaseChunker::new(self.chunker_config.clone())?;
        let chunks: Vec<ChunkSummary> = chunker
            .chunk(base_dir, file_paths, file_contents, budget)?
            .into_iter()
            .map(ChunkSummary::from)
            .collect();

        Ok(self.prepare(&chunks, budget))
    }
}

/// Chunk a codebase and wrap each chunk in `template`, assuming the default
/// prompt overhead.
pub fn process_code_for_llm(
    base_dir: &Path,
    file_paths: &[String],
    file_contents: &HashMap<String, String>,
    template: &str,
    window: &dyn ContextWindow,
) -> Result<Vec<PreparedPrompt>> {
    let template = PromptTemplate::new(template)?;
    PromptPreparer::new(template, DEFAULT_PROMPT_OVERHEAD).run(
        base_dir,
        file_paths,
        file_contents,
        window,
    )
}
