use crate::error::{BatchError, Result};
use codebook_chunker::estimate_tokens;

/// Placeholder replaced by chunk content
pub const CODE_PLACEHOLDER: &str = "{code}";

/// Prompt overhead assumed when the caller gives none
pub const DEFAULT_PROMPT_OVERHEAD: usize = 200;

/// A prompt with a `{code}` substitution point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if !text.contains(CODE_PLACEHOLDER) {
            return Err(BatchError::InvalidTemplate(format!(
                "template has no {CODE_PLACEHOLDER} placeholder"
            )));
        }
        Ok(Self { text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Substitute `code` for every placeholder
    pub fn render(&self, code: &str) -> String {
        self.text.replace(CODE_PLACEHOLDER, code)
    }

    /// Estimated tokens of the template text around the placeholder
    pub fn overhead_tokens(&self) -> usize {
        estimate_tokens(&self.text.replace(CODE_PLACEHOLDER, " "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_required() {
        assert!(matches!(
            PromptTemplate::new("Explain this"),
            Err(BatchError::InvalidTemplate(_))
        ));
    }

    #[test]
    fn renders_code() {
        let template = PromptTemplate::new("Review:\n{code}\nDone.").unwrap();
        assert_eq!(template.render("fn x() {}"), "Review:\nfn x() {}\nDone.");
    }

    #[test]
    fn overhead_excludes_placeholder() {
        let template = PromptTemplate::new("Review: {code}").unwrap();
        assert_eq!(template.overhead_tokens(), 2);
    }
}
