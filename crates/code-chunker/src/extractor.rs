use crate::error::ChunkerError;
use crate::language::Language;
use crate::parser::{HeuristicParser, Outline, ParserBackend, StructureParser};
use crate::types::{ChunkRecord, HierarchyLevel};
use std::collections::HashMap;

/// Language tag for files the registry does not recognize
pub const PLAIN_TEXT: &str = "text";

/// Turns one file into hierarchical records (levels 2-5).
///
/// Holds one parser per language, so a worker reuses grammars across files.
/// Never fails: grammar problems degrade to heuristic extraction and a file
/// with no detectable structure still yields its file record.
pub struct StructuralExtractor {
    statement_level: bool,
    backends: HashMap<Language, ParserBackend>,
}

impl StructuralExtractor {
    pub fn new(statement_level: bool) -> Self {
        Self {
            statement_level,
            backends: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_backend(mut self, language: Language, backend: ParserBackend) -> Self {
        self.backends.insert(language, backend);
        self
    }

    /// Extract records for `path`.
    ///
    /// The file record comes first; other records' parents are indices into
    /// the returned vector. The file record itself has no parent.
    pub fn extract_file(&mut self, path: &str, content: &str) -> Vec<ChunkRecord> {
        let language = Language::from_path(path);
        let tag = language.map_or(PLAIN_TEXT, Language::as_str);
        let line_count = content.matches('\n').count() + 1;

        let mut records = vec![ChunkRecord::new(
            HierarchyLevel::File,
            path,
            tag,
            content,
            (1, line_count),
            "file",
        )];

        let Some(language) = language else {
            return records;
        };
        if content.trim().is_empty() {
            return records;
        }

        let outline = self.outline(language, path, content);
        let lines: Vec<&str> = content.split('\n').collect();
        for node in outline.nodes {
            let start = node.start_line.clamp(1, lines.len());
            let end = node.end_line.clamp(start, lines.len());
            let text = lines[start - 1..end].join("\n");
            records.push(
                ChunkRecord::new(node.level, path, tag, text, (start, end), node.kind)
                    .with_name(node.name)
                    .with_parent(Some(node.parent.map_or(0, |p| p + 1))),
            );
        }

        log::trace!("{path}: {} records", records.len());
        records
    }

    fn outline(&mut self, language: Language, path: &str, content: &str) -> Outline {
        let statement_level = self.statement_level;
        let backend = self
            .backends
            .entry(language)
            .or_insert_with(|| ParserBackend::for_language(language, statement_level));

        match backend.parse(content.as_bytes()) {
            Ok(outline) => outline,
            Err(e) => {
                let e = match e {
                    ChunkerError::ParseFailure { message, .. } => {
                        ChunkerError::parse_failure(path, message)
                    }
                    other => other,
                };
                log::warn!("{e}; falling back to heuristic extraction");
                HeuristicParser::new()
                    .parse(content.as_bytes())
                    .unwrap_or_default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::GrammarParser;

    fn levels(records: &[ChunkRecord], level: HierarchyLevel) -> usize {
        records.iter().filter(|r| r.level() == level).count()
    }

    #[test]
    fn file_record_first_and_parentless() {
        let mut extractor = StructuralExtractor::new(true);
        let records = extractor.extract_file("pkg/app.py", "class A:\n    def f(self):\n        pass\n");
        assert_eq!(records[0].level(), HierarchyLevel::File);
        assert_eq!(records[0].parent(), None);
        assert_eq!(records[0].language(), "python");
        assert_eq!((records[0].start_line(), records[0].end_line()), (1, 4));

        let class = &records[1];
        assert_eq!(class.level(), HierarchyLevel::Class);
        assert_eq!(class.parent(), Some(0));
        assert_eq!(class.content(), "class A:\n    def f(self):\n        pass");

        let method = &records[2];
        assert_eq!(method.level(), HierarchyLevel::Function);
        assert_eq!(method.parent(), Some(1));
        assert_eq!(method.name(), Some("f"));
    }

    #[test]
    fn unknown_extension_is_plain_text() {
        let mut extractor = StructuralExtractor::new(true);
        let records = extractor.extract_file("notes.txt", "def f():\n    pass\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].language(), PLAIN_TEXT);
    }

    #[test]
    fn empty_file_yields_file_record() {
        let mut extractor = StructuralExtractor::new(true);
        let records = extractor.extract_file("empty.rs", "");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tokens(), 0);
        assert_eq!((records[0].start_line(), records[0].end_line()), (1, 1));
    }

    #[test]
    fn heuristic_languages_get_structure() {
        let mut extractor = StructuralExtractor::new(true);
        let source = "class Cart\n  def total\n    1\n  end\nend\n";
        let records = extractor.extract_file("cart.rb", source);
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].node_type(), "class");
        assert_eq!(records[2].parent(), Some(1));
        assert_eq!(records[2].language(), "ruby");
    }

    #[test]
    fn records_lie_within_parents() {
        let mut extractor = StructuralExtractor::new(true);
        let source = "\
fn outer() {
    let x = 1;
    if x > 0 {
        println!(\"{x}\");
    }
}

mod inner {
    pub fn nested() -> u8 { 1 }
}
";
        let records = extractor.extract_file("src/lib.rs", source);
        for record in &records[1..] {
            let parent = &records[record.parent().unwrap()];
            assert!(parent.level() <= record.level());
            assert!(record.is_within(parent));
        }
    }

    #[test]
    fn parse_failure_falls_back_for_that_file_only() {
        let backend = ParserBackend::FailingOn {
            marker: "BROKEN",
            inner: GrammarParser::new(Language::Python, true).unwrap(),
        };
        let mut extractor = StructuralExtractor::new(true).with_backend(Language::Python, backend);

        let healthy = "class A:\n    def f(self):\n        return 1\n";
        let broken = "# BROKEN\nclass B:\n    def g(self):\n        return 2\n";

        let before = extractor.extract_file("a.py", healthy);
        let failed = extractor.extract_file("b.py", broken);
        let after = extractor.extract_file("c.py", healthy);

        assert_eq!(levels(&failed, HierarchyLevel::Class), 1);
        assert_eq!(levels(&failed, HierarchyLevel::Function), 1);
        assert_eq!(levels(&failed, HierarchyLevel::Statement), 0);
        assert_eq!(failed[1].name(), Some("B"));
        assert_eq!(failed[2].parent(), Some(1));

        for records in [&before, &after] {
            assert_eq!(levels(records, HierarchyLevel::Class), 1);
            assert_eq!(levels(records, HierarchyLevel::Statement), 1);
            assert_eq!(records[1].node_type(), "class_definition");
        }
    }

    #[test]
    fn parser_init_failure_keeps_language_on_heuristics() {
        let backend = ParserBackend::from_grammar(
            Language::Python,
            Err(ChunkerError::parser_init("python", "incompatible grammar version")),
        );
        let mut extractor = StructuralExtractor::new(true).with_backend(Language::Python, backend);

        for path in ["a.py", "b.py"] {
            let records = extractor.extract_file(path, "class A:\n    def f(self):\n        return 1\n");
            assert_eq!(levels(&records, HierarchyLevel::Class), 1);
            assert_eq!(levels(&records, HierarchyLevel::Function), 1);
            assert_eq!(levels(&records, HierarchyLevel::Statement), 0);
            assert_eq!(records[1].node_type(), "class");
        }
        assert!(!extractor.backends[&Language::Python].is_grammar());
    }
}
