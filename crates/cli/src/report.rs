use codebook_batch::{CallEstimate, ChunkResult, PreparedPrompt};
use codebook_chunker::{PackedChunk, PackingStats};
use std::fmt::Write;

pub(crate) fn render_chunks(
    chunks: &[PackedChunk],
    max_input_tokens: usize,
    oversized_paths: &[String],
) -> String {
    let stats = PackingStats::from_chunks(chunks);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} chunks, {} tokens (min {}, max {}, avg {:.1}; budget {max_input_tokens})",
        stats.chunks, stats.total_tokens, stats.min_tokens, stats.max_tokens, stats.avg_tokens
    );
    if stats.oversized > 0 {
        let _ = writeln!(out, "{} oversized chunk(s)", stats.oversized);
    }
    for path in oversized_paths {
        let _ = writeln!(out, "  oversized: {path}");
    }
    for chunk in chunks {
        let _ = writeln!(
            out,
            "chunk {:>3}  {:>6} tokens  {:>5} carried  {}{}",
            chunk.id,
            chunk.token_total,
            chunk.carried_tokens,
            chunk.files.join(", "),
            if chunk.oversized { "  [oversized]" } else { "" }
        );
    }
    out
}

pub(crate) fn render_estimate(estimate: &CallEstimate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Files:               {}", estimate.files);
    let _ = writeln!(out, "Context length:      {}", estimate.model_context_length);
    let _ = writeln!(out, "Max input tokens:    {}", estimate.max_input_tokens);
    let _ = writeln!(out, "Code tokens (est.):  {}", estimate.estimated_code_tokens);
    let _ = writeln!(out, "Model calls (est.):  {}", estimate.estimated_chunks);
    let _ = writeln!(out, "Input tokens:        {}", estimate.estimated_input_tokens);
    let _ = writeln!(out, "Response tokens:     {}", estimate.estimated_response_tokens);
    let _ = writeln!(out, "Total tokens:        {}", estimate.total_tokens);
    out
}

pub(crate) fn render_prompts(prompts: &[PreparedPrompt]) -> String {
    let mut out = String::new();
    for prompt in prompts {
        let _ = writeln!(
            out,
            "=== chunk {} ({} tokens, {:.1}% of input budget) ===",
            prompt.chunk_id, prompt.token_count, prompt.token_utilization
        );
        let _ = writeln!(out, "{}", prompt.prompt);
    }
    out
}

pub(crate) fn render_results(results: &[ChunkResult]) -> String {
    let mut out = String::new();
    for result in results {
        match (&result.response, &result.error) {
            (Some(response), _) => {
                let _ = writeln!(
                    out,
                    "=== chunk {} ok (retries: {}) ===\n{}",
                    result.chunk_id, result.retries, response
                );
            }
            (None, Some(error)) => {
                let _ = writeln!(
                    out,
                    "=== chunk {} failed (retries: {}) ===\n{}",
                    result.chunk_id, result.retries, error
                );
            }
            (None, None) => {}
        }
    }
    out
}
