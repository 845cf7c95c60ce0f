use crate::cancel::CancelToken;
use crate::config::BatchConfig;
use crate::error::{BatchError, Result};
use crate::prepare::PreparedPrompt;
use crate::retry::{backoff_delay, is_transient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// External text generation service.
///
/// Treated as opaque: only the messages of returned errors are inspected,
/// to decide whether a retry is worthwhile.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, use_cache: bool) -> anyhow::Result<String>;
}

/// Adapts a synchronous function into a [`Generator`]
pub struct FnGenerator<F>(pub F);

impl<F> FnGenerator<F>
where
    F: Fn(&str, bool) -> anyhow::Result<String> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> Generator for FnGenerator<F>
where
    F: Fn(&str, bool) -> anyhow::Result<String> + Send + Sync,
{
    async fn generate(&self, prompt: &str, use_cache: bool) -> anyhow::Result<String> {
        (self.0)(prompt, use_cache)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStatus {
    Ok,
    Error,
}

/// Outcome of one chunk's submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkResult {
    pub chunk_id: usize,
    pub files: Vec<String>,
    pub status: ChunkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Retries spent on this chunk
    pub retries: u32,
}

impl ChunkResult {
    fn ok(prompt: &PreparedPrompt, response: String, retries: u32) -> Self {
        Self {
            chunk_id: prompt.chunk_id,
            files: prompt.files.clone(),
            status: ChunkStatus::Ok,
            response: Some(response),
            error: None,
            retries,
        }
    }

    fn error(prompt: &PreparedPrompt, error: String, retries: u32) -> Self {
        Self {
            chunk_id: prompt.chunk_id,
            files: prompt.files.clone(),
            status: ChunkStatus::Error,
            response: None,
            error: Some(error),
            retries,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == ChunkStatus::Ok
    }
}

/// Submit prompts one at a time, retrying transient failures.
///
/// A chunk's failure never stops the batch. Each call is bounded by
/// `request_timeout`; an expired call is retried like any transient error.
/// Cancellation is checked between submissions and interrupts an in-flight
/// call or backoff; chunks not yet submitted are left out of the result.
///
/// Fails only on invalid configuration, before anything is submitted.
pub async fn batch_process_chunks(
    prompts: &[PreparedPrompt],
    generator: &dyn Generator,
    config: &BatchConfig,
    cancel: &CancelToken,
) -> Result<Vec<ChunkResult>> {
    config.validate().map_err(BatchError::InvalidConfig)?;

    let total = prompts.len();
    let mut results = Vec::with_capacity(total);

    for (i, prompt) in prompts.iter().enumerate() {
        if cancel.is_cancelled() {
            log::warn!(
                "Batch cancelled; {} of {total} chunks not submitted",
                total - i
            );
            break;
        }

        log::info!("Processing chunk {}/{total}: {}", i + 1, prompt.chunk_id);
        let result = submit_with_retry(prompt, generator, config, cancel).await;
        if result.is_ok() {
            log::info!("Successfully processed chunk {}", prompt.chunk_id);
        }
        results.push(result);
    }

    Ok(results)
}

/// One bounded generation call. `None` when cancelled mid-call.
async fn attempt(
    prompt: &str,
    use_cache: bool,
    generator: &dyn Generator,
    config: &BatchConfig,
    cancel: &CancelToken,
) -> Option<anyhow::Result<String>> {
    let timeout = config.request_timeout();
    tokio::select! {
        outcome = tokio::time::timeout(timeout, generator.generate(prompt, use_cache)) => {
            Some(outcome.unwrap_or_else(|_| {
                Err(anyhow::anyhow!("generation timed out after {timeout:?}"))
            }))
        }
        () = cancel.cancelled() => None,
    }
}

async fn submit_with_retry(
    prompt: &PreparedPrompt,
    generator: &dyn Generator,
    config: &BatchConfig,
    cancel: &CancelToken,
) -> ChunkResult {
    let mut retries = 0;
    loop {
        let use_cache = config.use_cache && retries == 0;
        let Some(outcome) = attempt(&prompt.prompt, use_cache, generator, config, cancel).await
        else {
            log::warn!("Batch cancelled while chunk {} was generating", prompt.chunk_id);
            return ChunkResult::error(prompt, "cancelled during generation".to_string(), retries);
        };
        match outcome {
            Ok(response) => return ChunkResult::ok(prompt, response, retries),
            Err(e) => {
                let message = format!("{e:#}");
                if !is_transient(&e) || retries >= config.max_retries {
                    log::error!("Error processing chunk {}: {message}", prompt.chunk_id);
                    return ChunkResult::error(prompt, message, retries);
                }

                retries += 1;
                let delay = backoff_delay(retries, config);
                log::warn!(
                    "Transient error on chunk {} (retry {retries}/{}): {message}; retrying in {delay:?}",
                    prompt.chunk_id,
                    config.max_retries
                );
                if !cancel.sleep(delay).await {
                    log::warn!("Batch cancelled while chunk {} was backing off", prompt.chunk_id);
                    return ChunkResult::error(prompt, format!("cancelled after: {message}"), retries);
                }
            }
        }
    }
}
