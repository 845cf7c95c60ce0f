use crate::tokens::estimate_tokens;
use serde::{Deserialize, Serialize};

/// Hierarchy level of an extracted record. Levels strictly narrow in scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum HierarchyLevel {
    Directory = 1,
    File = 2,
    Class = 3,
    Function = 4,
    Statement = 5,
}

impl HierarchyLevel {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::File => "file",
            Self::Class => "class",
            Self::Function => "function",
            Self::Statement => "statement",
        }
    }
}

impl From<HierarchyLevel> for u8 {
    fn from(level: HierarchyLevel) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for HierarchyLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Directory),
            2 => Ok(Self::File),
            3 => Ok(Self::Class),
            4 => Ok(Self::Function),
            5 => Ok(Self::Statement),
            other => Err(format!("hierarchy level out of range: {other}")),
        }
    }
}

/// One semantic unit produced by extraction.
///
/// The token estimate is computed once in the constructor; the content it was
/// computed from is not mutable afterwards. `parent` is an index into the
/// [`RecordArena`](crate::RecordArena) that owns the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkRecord {
    content: String,
    file_path: String,
    language: String,
    level: HierarchyLevel,
    start_line: usize,
    end_line: usize,
    node_type: String,
    name: Option<String>,
    parent: Option<usize>,
    tokens: usize,
}

impl ChunkRecord {
    /// Create a record. Lines are 1-indexed and inclusive.
    #[must_use]
    pub fn new(
        level: HierarchyLevel,
        file_path: impl Into<String>,
        language: impl Into<String>,
        content: impl Into<String>,
        (start_line, end_line): (usize, usize),
        node_type: impl Into<String>,
    ) -> Self {
        let content = content.into();
        let tokens = estimate_tokens(&content);
        Self {
            content,
            file_path: file_path.into(),
            language: language.into(),
            level,
            start_line,
            end_line,
            node_type: node_type.into(),
            name: None,
            parent: None,
            tokens,
        }
    }

    /// Builder: set symbol name
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name;
        self
    }

    /// Builder: set parent index
    #[must_use]
    pub const fn with_parent(mut self, parent: Option<usize>) -> Self {
        self.parent = parent;
        self
    }

    pub(crate) fn rebase_parent(&mut self, offset: usize, fallback: Option<usize>) {
        self.parent = match self.parent {
            Some(idx) => Some(idx + offset),
            None => fallback,
        };
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub const fn level(&self) -> HierarchyLevel {
        self.level
    }

    pub const fn start_line(&self) -> usize {
        self.start_line
    }

    pub const fn end_line(&self) -> usize {
        self.end_line
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Estimated token count, fixed at construction
    pub const fn tokens(&self) -> usize {
        self.tokens
    }

    /// Check if this record's line range lies within `other`'s
    #[must_use]
    pub const fn is_within(&self, other: &ChunkRecord) -> bool {
        other.start_line <= self.start_line && self.end_line <= other.end_line
    }

    /// Build a record from the trailing `lines` lines of this one.
    ///
    /// Used to carry a bounded slice of an indivisible record into the next
    /// packed chunk. Returns `None` when `lines` is zero.
    #[must_use]
    pub fn tail(&self, lines: usize) -> Option<Self> {
        if lines == 0 {
            return None;
        }
        let all: Vec<&str> = self.content.split('\n').collect();
        let keep = lines.min(all.len());
        let text = all[all.len() - keep..].join("\n");
        let start = self.end_line.saturating_sub(keep - 1).max(self.start_line);
        Some(
            Self::new(
                self.level,
                self.file_path.clone(),
                self.language.clone(),
                text,
                (start, self.end_line),
                self.node_type.clone(),
            )
            .with_name(self.name.clone())
            .with_parent(self.parent),
        )
    }

    /// Short label used in hierarchy paths: `node_type[start-end]`
    #[must_use]
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) => format!(
                "{}:{}[{}-{}]",
                self.node_type, name, self.start_line, self.end_line
            ),
            None => format!("{}[{}-{}]", self.node_type, self.start_line, self.end_line),
        }
    }
}

/// A token-bounded window of concatenated records (level 0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedChunk {
    /// Sequential id, starting at 0
    pub id: usize,
    /// Concatenated record content with file-boundary markers
    pub content: String,
    /// Estimated tokens of `content`
    pub token_total: usize,
    /// Files whose records were packed into this chunk, in first-seen order.
    /// Content carried over from the previous chunk does not count.
    pub files: Vec<String>,
    /// Tokens of record content carried over from the previous chunk
    pub carried_tokens: usize,
    /// Number of records (carried and new) in this chunk
    pub record_count: usize,
    /// True when a single record exceeded the budget on its own
    pub oversized: bool,
}

impl PackedChunk {
    /// Serializable summary handed to prompt preparation
    #[must_use]
    pub fn summary(&self) -> ChunkSummary {
        ChunkSummary {
            chunk_id: self.id,
            content: self.content.clone(),
            token_count: self.token_total,
            files: self.files.clone(),
        }
    }
}

/// Output row of [`chunk_codebase`](crate::chunk_codebase)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSummary {
    pub chunk_id: usize,
    pub content: String,
    pub token_count: usize,
    pub files: Vec<String>,
}

impl From<PackedChunk> for ChunkSummary {
    fn from(chunk: PackedChunk) -> Self {
        Self {
            chunk_id: chunk.id,
            content: chunk.content,
            token_count: chunk.token_total,
            files: chunk.files,
        }
    }
}
