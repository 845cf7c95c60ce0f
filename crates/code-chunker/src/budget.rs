//! Token budget derived from the model's context window.
//!
//! The context length is read through a [`ContextWindow`] on every call and the
//! resulting [`Budget`] is passed explicitly to the packer and the prompt
//! preparer. Nothing here is memoized.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Environment variable holding the model context length
pub const CONTEXT_LENGTH_ENV: &str = "CURRENT_MODEL_CONTEXT_LENGTH";

/// Context length used when no configuration is present
pub const DEFAULT_CONTEXT_LENGTH: usize = 8192;

/// Source of the current model context length
pub trait ContextWindow: Send + Sync {
    fn context_length(&self) -> usize;
}

/// Reads the context length from an environment variable on every call
#[derive(Debug, Clone)]
pub struct EnvContextWindow {
    var: String,
    default: usize,
}

impl EnvContextWindow {
    pub fn new(var: impl Into<String>, default: usize) -> Self {
        Self {
            var: var.into(),
            default,
        }
    }
}

impl Default for EnvContextWindow {
    fn default() -> Self {
        Self::new(CONTEXT_LENGTH_ENV, DEFAULT_CONTEXT_LENGTH)
    }
}

impl ContextWindow for EnvContextWindow {
    fn context_length(&self) -> usize {
        match std::env::var(&self.var) {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => {
                    log::warn!(
                        "Ignoring invalid {}={raw:?}; using {}",
                        self.var,
                        self.default
                    );
                    self.default
                }
            },
            Err(_) => self.default,
        }
    }
}

/// A constant context length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedContextWindow(pub usize);

impl ContextWindow for FixedContextWindow {
    fn context_length(&self) -> usize {
        self.0
    }
}

/// A context length that can be changed while a run is in progress
#[derive(Debug, Clone, Default)]
pub struct SharedContextWindow {
    value: Arc<AtomicUsize>,
}

impl SharedContextWindow {
    pub fn new(context_length: usize) -> Self {
        Self {
            value: Arc::new(AtomicUsize::new(context_length)),
        }
    }

    pub fn set(&self, context_length: usize) {
        self.value.store(context_length, Ordering::SeqCst);
    }
}

impl ContextWindow for SharedContextWindow {
    fn context_length(&self) -> usize {
        self.value.load(Ordering::SeqCst)
    }
}

/// Input/response split of a model context window
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Budget {
    pub context_length: usize,
    /// 80% of the context, rounded down
    pub max_input_tokens: usize,
    /// The remaining 20%
    pub reserved_response_tokens: usize,
}

impl Budget {
    /// Split a context length into input and response budgets
    #[must_use]
    pub const fn for_context_length(context_length: usize) -> Self {
        let max_input_tokens = context_length / 5 * 4 + context_length % 5 * 4 / 5;
        Self {
            context_length,
            max_input_tokens,
            reserved_response_tokens: context_length - max_input_tokens,
        }
    }

    /// Compute the budget from the window's current value
    pub fn current(window: &dyn ContextWindow) -> Self {
        Self::for_context_length(window.context_length())
    }

    /// Tokens available for code once `overhead` prompt tokens are set aside
    #[must_use]
    pub const fn effective_input_tokens(&self, overhead: usize) -> usize {
        self.max_input_tokens.saturating_sub(overhead)
    }
}
