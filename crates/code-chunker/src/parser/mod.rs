//! Structure parsers: turn source bytes into a flat outline of classes,
//! functions and statements.
//!
//! Two backends sit behind [`StructureParser`]: a tree-sitter grammar and a
//! line-signature heuristic. [`ParserBackend::for_language`] picks one from the
//! language registry.

mod grammar;
mod heuristic;

pub use grammar::GrammarParser;
pub use heuristic::HeuristicParser;

use crate::error::Result;
use crate::language::Language;
use crate::types::HierarchyLevel;

/// One structural node found by a parser. Lines are 1-indexed, inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub level: HierarchyLevel,
    pub kind: String,
    pub name: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    /// Index of the enclosing node in the same outline; `None` attaches to the file
    pub parent: Option<usize>,
}

/// Parser output: nodes in emission order, parents before children
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    pub nodes: Vec<OutlineNode>,
}

impl Outline {
    pub(crate) fn push(&mut self, node: OutlineNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn count_level(&self, level: HierarchyLevel) -> usize {
        self.nodes.iter().filter(|n| n.level == level).count()
    }
}

/// Single capability shared by all backends
pub trait StructureParser {
    fn parse(&mut self, source: &[u8]) -> Result<Outline>;
}

/// Parser selected for one language
pub enum ParserBackend {
    Grammar(GrammarParser),
    Heuristic(HeuristicParser),
    /// Grammar parser that reports a parse failure for sources containing `marker`
    #[cfg(test)]
    FailingOn {
        marker: &'static str,
        inner: GrammarParser,
    },
}

impl ParserBackend {
    /// Grammar-backed when the language has a grammar that loads, heuristic otherwise.
    pub fn for_language(language: Language, statement_level: bool) -> Self {
        if !language.supports_ast() {
            log::debug!("No grammar for {language}, using heuristic extraction");
            return Self::Heuristic(HeuristicParser::new());
        }
        Self::from_grammar(language, GrammarParser::new(language, statement_level))
    }

    /// Wrap a grammar load result; a failed load puts the language on heuristics.
    pub(crate) fn from_grammar(language: Language, init: Result<GrammarParser>) -> Self {
        match init {
            Ok(parser) => Self::Grammar(parser),
            Err(e) => {
                log::warn!("{e}; {language} files will use heuristic extraction");
                Self::Heuristic(HeuristicParser::new())
            }
        }
    }

    pub const fn is_grammar(&self) -> bool {
        matches!(self, Self::Grammar(_))
    }
}

impl StructureParser for ParserBackend {
    fn parse(&mut self, source: &[u8]) -> Result<Outline> {
        match self {
            Self::Grammar(parser) => parser.parse(source),
            Self::Heuristic(parser) => parser.parse(source),
            #[cfg(test)]
            Self::FailingOn { marker, inner } => {
                let text = String::from_utf8_lossy(source);
                if text.contains(*marker) {
                    return Err(crate::error::ChunkerError::parse_failure(
                        inner.language().as_str(),
                        "parser returned no tree",
                    ));
                }
                inner.parse(source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChunkerError;

    #[test]
    fn selects_grammar_for_supported_languages() {
        assert!(ParserBackend::for_language(Language::Python, true).is_grammar());
        assert!(ParserBackend::for_language(Language::Rust, true).is_grammar());
    }

    #[test]
    fn selects_heuristic_without_grammar() {
        assert!(!ParserBackend::for_language(Language::Kotlin, true).is_grammar());
        assert!(!ParserBackend::for_language(Language::Ruby, true).is_grammar());
    }

    #[test]
    fn failed_grammar_load_selects_heuristic() {
        let init = Err(ChunkerError::parser_init("python", "incompatible grammar version"));
        let mut backend = ParserBackend::from_grammar(Language::Python, init);
        assert!(!backend.is_grammar());

        let outline = backend
            .parse(b"class A:\n    def f(self):\n        return 1\n")
            .unwrap();
        assert_eq!(outline.count_level(HierarchyLevel::Class), 1);
        assert_eq!(outline.count_level(HierarchyLevel::Function), 1);
        assert_eq!(outline.count_level(HierarchyLevel::Statement), 0);
    }
}
