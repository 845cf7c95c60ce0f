use anyhow::{Context as AnyhowContext, Result};
use codebook_batch::BatchConfig;
use codebook_chunker::{ChunkerConfig, ContextWindow, EnvContextWindow, FixedContextWindow};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Settings read from `--config <file.toml>`
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub(crate) context_length: Option<usize>,
    pub(crate) chunker: ChunkerConfig,
    pub(crate) batch: BatchConfig,
}

impl FileConfig {
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;

        config
            .chunker
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [chunker] config: {e}"))?;
        config
            .batch
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid [batch] config: {e}"))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// `--context-length`, then the config file, then the environment
    pub(crate) fn context_window(&self, flag: Option<usize>) -> Box<dyn ContextWindow> {
        match flag.or(self.context_length) {
            Some(length) => Box::new(FixedContextWindow(length)),
            None => Box::new(EnvContextWindow::default()),
        }
    }
}
