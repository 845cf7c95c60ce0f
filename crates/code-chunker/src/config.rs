use serde::{Deserialize, Serialize};

/// Configuration for codebase chunking behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Fraction of a packed chunk's budget carried into the next chunk (0.0..1.0)
    pub overlap_ratio: f64,

    /// Tokens subtracted from `max_input_tokens` before packing, reserved for
    /// the prompt template that will wrap each chunk
    pub reserved_prompt_tokens: usize,

    /// Run per-file extraction on a worker pool
    pub parallel: bool,

    /// Emit level-5 statement records under each function
    pub statement_level: bool,

    /// Prefix of the marker line inserted when a packed chunk crosses into a new file
    pub file_marker_prefix: String,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            overlap_ratio: 0.2,
            reserved_prompt_tokens: 0,
            parallel: true,
            statement_level: true,
            file_marker_prefix: "# FILE: ".to_string(),
        }
    }
}

impl ChunkerConfig {
    /// Config sized for wrapping each chunk in a prompt of `overhead` tokens
    pub fn for_prompts(overhead: usize) -> Self {
        Self {
            reserved_prompt_tokens: overhead,
            ..Default::default()
        }
    }

    /// Create config optimized for speed (no statement records, no overlap)
    pub fn for_speed() -> Self {
        Self {
            overlap_ratio: 0.0,
            statement_level: false,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.overlap_ratio.is_finite() || !(0.0..1.0).contains(&self.overlap_ratio) {
            return Err(format!(
                "overlap_ratio ({}) must be in [0.0, 1.0)",
                self.overlap_ratio
            ));
        }

        if self.file_marker_prefix.contains('\n') {
            return Err("file_marker_prefix must be a single line".to_string());
        }

        Ok(())
    }
}
