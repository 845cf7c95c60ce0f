use crate::arena::RecordArena;
use crate::budget::{Budget, ContextWindow};
use crate::config::ChunkerConfig;
use crate::directory::group_by_directory;
use crate::error::{ChunkerError, Result};
use crate::extractor::StructuralExtractor;
use crate::packer::ChunkPacker;
use crate::types::{ChunkRecord, ChunkSummary, PackedChunk};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Codebase chunking pipeline: directory grouping, per-file extraction and
/// packing. Holds no state between runs.
#[derive(Debug, Clone)]
pub struct CodebaseChunker {
    config: ChunkerConfig,
}

impl CodebaseChunker {
    /// Create a chunker, rejecting invalid configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Build the record arena: one directory record per directory, each
    /// followed by its files' records.
    pub fn extract(
        &self,
        base_dir: &Path,
        file_paths: &[String],
        file_contents: &HashMap<String, String>,
    ) -> Result<RecordArena> {
        let mut seen = HashSet::new();
        let files: Vec<&String> = file_paths
            .iter()
            .filter(|p| seen.insert(p.as_str()))
            .collect();
        if files.is_empty() {
            return Err(ChunkerError::EmptyInput);
        }

        let statement_level = self.config.statement_level;
        let blocks: Vec<Vec<ChunkRecord>> = if self.config.parallel {
            files
                .par_iter()
                .map_init(
                    || StructuralExtractor::new(statement_level),
                    |extractor, path| extractor.extract_file(path, content_of(file_contents, path)),
                )
                .collect()
        } else {
            let mut extractor = StructuralExtractor::new(statement_level);
            files
                .iter()
                .map(|path| extractor.extract_file(path, content_of(file_contents, path)))
                .collect()
        };

        let mut by_path: HashMap<&str, Vec<ChunkRecord>> = files
            .iter()
            .map(|p| p.as_str())
            .zip(blocks)
            .collect();

        let unique: Vec<String> = files.iter().map(|p| p.to_string()).collect();
        let mut arena = RecordArena::new();
        for group in group_by_directory(base_dir, &unique) {
            let dir_idx = arena.push(group.to_record());
            for file in &group.files {
                if let Some(block) = by_path.remove(file.as_str()) {
                    arena.extend_file(block, Some(dir_idx));
                }
            }
        }

        log::debug!("Extracted {} records from {} files", arena.len(), files.len());
        Ok(arena)
    }

    /// Pack an arena under `budget`
    pub fn pack(&self, arena: &RecordArena, budget: Budget) -> Result<Vec<PackedChunk>> {
        let max_tokens = budget.effective_input_tokens(self.config.reserved_prompt_tokens);
        if max_tokens == 0 {
            return Err(ChunkerError::invalid_config(format!(
                "reserved_prompt_tokens ({}) leaves no room in max_input_tokens ({})",
                self.config.reserved_prompt_tokens, budget.max_input_tokens
            )));
        }

        let packer = ChunkPacker::new(
            max_tokens,
            self.config.overlap_ratio,
            self.config.file_marker_prefix.clone(),
        );
        Ok(packer.pack(arena.records()))
    }

    /// Hierarchy paths of records too large to share a chunk under `budget`
    pub fn oversized_paths(&self, arena: &RecordArena, budget: Budget) -> Vec<String> {
        let max_tokens = budget.effective_input_tokens(self.config.reserved_prompt_tokens);
        arena
            .iter()
            .enumerate()
            .filter(|(_, record)| record.tokens() > max_tokens)
            .filter_map(|(idx, _)| arena.hierarchy_path(idx))
            .collect()
    }

    /// Extract and pack in one pass
    pub fn chunk(
        &self,
        base_dir: &Path,
        file_paths: &[String],
        file_contents: &HashMap<String, String>,
        budget: Budget,
    ) -> Result<Vec<PackedChunk>> {
        let arena = self.extract(base_dir, file_paths, file_contents)?;
        let chunks = self.pack(&arena, budget)?;
        log::info!(
            "Chunked {} files into {} chunks (max {} input tokens)",
            file_paths.len(),
            chunks.len(),
            budget.max_input_tokens
        );
        Ok(chunks)
    }
}

fn content_of<'a>(file_contents: &'a HashMap<String, String>, path: &str) -> &'a str {
    match file_contents.get(path) {
        Some(content) => content.as_str(),
        None => {
            log::warn!("No content provided for {path}; treating it as empty");
            ""
        }
    }
}

/// Chunk a codebase under the window's current budget.
///
/// Reads nothing from disk: `file_contents` maps each listed path to its text.
/// Identical inputs under an identical budget produce identical output.
pub fn chunk_codebase(
    base_dir: &Path,
    file_paths: &[String],
    file_contents: &HashMap<String, String>,
    window: &dyn ContextWindow,
    config: &ChunkerConfig,
) -> Result<Vec<ChunkSummary>> {
    let budget = Budget::current(window);
    let chunker = CodebaseChunker::new(config.clone())?;
    let chunks = chunker.chunk(base_dir, file_paths, file_contents, budget)?;
    Ok(chunks.into_iter().map(ChunkSummary::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::FixedContextWindow;
    use crate::types::HierarchyLevel;

    fn input(files: &[(&str, &str)]) -> (Vec<String>, HashMap<String, String>) {
        let paths = files.iter().map(|(p, _)| p.to_string()).collect();
        let contents = files
            .iter()
            .map(|(p, c)| (p.to_string(), c.to_string()))
            .collect();
        (paths, contents)
    }

    #[test]
    fn empty_file_set_is_an_error() {
        let result = chunk_codebase(
            Path::new("."),
            &[],
            &HashMap::new(),
            &FixedContextWindow(8192),
            &ChunkerConfig::default(),
        );
        assert!(matches!(result, Err(ChunkerError::EmptyInput)));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ChunkerConfig {
            overlap_ratio: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            CodebaseChunker::new(config),
            Err(ChunkerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn reserved_tokens_must_leave_room() {
        let (paths, contents) = input(&[("a.py", "x = 1\n")]);
        let chunker = CodebaseChunker::new(ChunkerConfig::for_prompts(900)).unwrap();
        let result = chunker.chunk(
            Path::new(""),
            &paths,
            &contents,
            Budget::for_context_length(1000),
        );
        assert!(matches!(result, Err(ChunkerError::InvalidConfig(_))));
    }

    #[test]
    fn arena_links_files_to_directories() {
        let (paths, contents) = input(&[
            ("/repo/src/app.py", "class A:\n    def f(self):\n        return 1\n"),
            ("/repo/README.md", "hello\n"),
        ]);
        let chunker = CodebaseChunker::new(ChunkerConfig::default()).unwrap();
        let arena = chunker
            .extract(Path::new("/repo"), &paths, &contents)
            .unwrap();

        let dirs: Vec<usize> = (0..arena.len())
            .filter(|&i| arena.get(i).unwrap().level() == HierarchyLevel::Directory)
            .collect();
        assert_eq!(dirs.len(), 2);

        for (idx, record) in arena.iter().enumerate() {
            match record.level() {
                HierarchyLevel::Directory => assert_eq!(record.parent(), None),
                _ => {
                    let parent = record.parent().unwrap();
                    assert!(parent < idx);
                    assert!(arena.get(parent).unwrap().level() <= record.level());
                }
            }
        }

        let method = arena
            .iter()
            .position(|r| r.name() == Some("f"))
            .unwrap();
        assert_eq!(
            arena.hierarchy_path(method).unwrap(),
            "/repo/src > /repo/src/app.py:file[1-4] > class_definition:A[1-3] > function_definition:f[2-3]"
        );
    }

    #[test]
    fn oversized_records_reported_by_hierarchy_path() {
        let body = "    total = total + 1\n".repeat(40);
        let source = format!("def big():\n    total = 0\n{body}    return total\n\ndef small():\n    return 1\n");
        let (paths, contents) = input(&[("/repo/app.py", source.as_str())]);
        let chunker = CodebaseChunker::new(ChunkerConfig::for_speed()).unwrap();
        let arena = chunker
            .extract(Path::new("/repo"), &paths, &contents)
            .unwrap();

        let oversized = chunker.oversized_paths(&arena, Budget::for_context_length(250));
        assert_eq!(oversized.len(), 2);
        assert_eq!(oversized[0], "/repo > /repo/app.py:file[1-47]");
        assert_eq!(oversized[1], "/repo > /repo/app.py:file[1-47] > function_definition:big[1-43]");
        assert!(chunker
            .oversized_paths(&arena, Budget::for_context_length(100_000))
            .is_empty());
    }

    #[test]
    fn duplicate_paths_extracted_once() {
        let (mut paths, contents) = input(&[("a.txt", "one two")]);
        paths.push("a.txt".to_string());
        let chunker = CodebaseChunker::new(ChunkerConfig::default()).unwrap();
        let arena = chunker.extract(Path::new(""), &paths, &contents).unwrap();
        // directory + file
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let (paths, contents) = input(&[
            ("src/a.rs", "fn a() {\n    let x = 1;\n}\n"),
            ("src/b.py", "def b():\n    return 2\n"),
            ("lib/c.go", "package c\n\nfunc C() int {\n\treturn 3\n}\n"),
        ]);
        let parallel = CodebaseChunker::new(ChunkerConfig::default()).unwrap();
        let sequential = CodebaseChunker::new(ChunkerConfig {
            parallel: false,
            ..Default::default()
        })
        .unwrap();
        let budget = Budget::for_context_length(8192);
        assert_eq!(
            parallel.chunk(Path::new(""), &paths, &contents, budget).unwrap(),
            sequential.chunk(Path::new(""), &paths, &contents, budget).unwrap()
        );
    }
}
