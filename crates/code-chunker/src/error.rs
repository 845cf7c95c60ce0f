use thiserror::Error;

/// Result type for chunker operations
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur during code chunking
///
/// Only [`ChunkerError::EmptyInput`] and [`ChunkerError::InvalidConfig`] ever
/// escape a chunking run. The parser-related variants are raised inside the
/// structural extractor and recovered from by falling back to heuristic
/// extraction for the affected file or language.
#[derive(Error, Debug)]
pub enum ChunkerError {
    /// No grammar is registered for the language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The grammar could not be loaded into a parser
    #[error("Parser initialization failed for {language}: {message}")]
    ParserInit { language: String, message: String },

    /// A single file failed to parse
    #[error("Parse error in {path}: {message}")]
    ParseFailure { path: String, message: String },

    /// The input file set was empty
    #[error("Empty input: no files to chunk")]
    EmptyInput,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ChunkerError {
    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create a parser initialization error
    pub fn parser_init(language: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParserInit {
            language: language.into(),
            message: message.into(),
        }
    }

    /// Create a parse failure for one file
    pub fn parse_failure(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseFailure {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
