//! Greedy streaming bin-packer with overlap carry-over.
//!
//! Records are sorted by `(file_path, start_line)` and appended to a buffer
//! until the next one would exceed the budget. The closed buffer becomes a
//! [`PackedChunk`]; the most recent records that fit in
//! `overlap_ratio * max_tokens` seed the next buffer.

use crate::tokens::estimate_tokens;
use crate::types::{ChunkRecord, HierarchyLevel, PackedChunk};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
struct Entry {
    record: ChunkRecord,
    carried: bool,
}

/// Chunk packer bounded by `max_tokens`
#[derive(Debug, Clone)]
pub struct ChunkPacker {
    max_tokens: usize,
    overlap_ratio: f64,
    marker_prefix: String,
}

impl ChunkPacker {
    pub fn new(max_tokens: usize, overlap_ratio: f64, marker_prefix: impl Into<String>) -> Self {
        Self {
            max_tokens,
            overlap_ratio,
            marker_prefix: marker_prefix.into(),
        }
    }

    pub const fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Token budget for content carried into the next chunk
    pub fn overlap_budget(&self) -> usize {
        (self.overlap_ratio * self.max_tokens as f64).floor() as usize
    }

    /// Pack `records` into ordered chunks
    pub fn pack(&self, records: &[ChunkRecord]) -> Vec<PackedChunk> {
        let mut sorted: Vec<&ChunkRecord> = records.iter().collect();
        sorted.sort_by(|a, b| {
            a.file_path()
                .cmp(b.file_path())
                .then(a.start_line().cmp(&b.start_line()))
        });

        let mut chunks = Vec::new();
        let mut buffer: Vec<Entry> = Vec::new();
        let mut buffer_tokens = 0;

        for record in sorted {
            if buffer.iter().any(|e| !e.carried)
                && buffer_tokens + self.cost_after(&buffer, record) > self.max_tokens
            {
                let seed = self.seed_overlap(&buffer);
                chunks.push(self.close(chunks.len(), std::mem::take(&mut buffer)));
                buffer = seed;
                buffer_tokens = self.measure(&buffer);
            }

            // Oldest carried records go first when overlap and the new record do not fit together
            while !buffer.is_empty()
                && buffer_tokens + self.cost_after(&buffer, record) > self.max_tokens
            {
                buffer.remove(0);
                buffer_tokens = self.measure(&buffer);
            }

            buffer_tokens += self.cost_after(&buffer, record);
            buffer.push(Entry {
                record: record.clone(),
                carried: false,
            });
        }

        if buffer.iter().any(|e| !e.carried) {
            chunks.push(self.close(chunks.len(), buffer));
        }

        chunks
    }

    fn marker(&self, path: &str) -> String {
        format!("{}{}", self.marker_prefix, path)
    }

    fn needs_marker(current: Option<&str>, record: &ChunkRecord) -> bool {
        record.level() != HierarchyLevel::Directory && current != Some(record.file_path())
    }

    fn current_path(entries: &[Entry]) -> Option<&str> {
        entries.last().and_then(|e| match e.record.level() {
            HierarchyLevel::Directory => None,
            _ => Some(e.record.file_path()),
        })
    }

    /// Tokens `record` adds when appended after `entries`, marker included
    fn cost_after(&self, entries: &[Entry], record: &ChunkRecord) -> usize {
        let marker = if Self::needs_marker(Self::current_path(entries), record) {
            estimate_tokens(&self.marker(record.file_path()))
        } else {
            0
        };
        record.tokens() + marker
    }

    /// Token total of a buffer as it would be rendered
    fn measure(&self, entries: &[Entry]) -> usize {
        (0..entries.len())
            .map(|i| self.cost_after(&entries[..i], &entries[i].record))
            .sum()
    }

    /// Most recent records of a closed buffer that fit the overlap budget,
    /// in original order. When the newest record that does not fit is
    /// reached, its trailing lines fill whatever budget remains.
    fn seed_overlap(&self, closed: &[Entry]) -> Vec<Entry> {
        let budget = self.overlap_budget();
        let mut used = 0;
        let mut seed = Vec::new();

        for entry in closed.iter().rev() {
            let tokens = entry.record.tokens();
            if used + tokens <= budget {
                used += tokens;
                seed.push(Entry {
                    record: entry.record.clone(),
                    carried: true,
                });
                continue;
            }

            let remaining = budget - used;
            if remaining > 0 {
                let lines = tail_lines_within(entry.record.content(), remaining);
                if let Some(tail) = entry.record.tail(lines) {
                    seed.push(Entry {
                        record: tail,
                        carried: true,
                    });
                }
            }
            break;
        }

        seed.reverse();
        seed
    }

    fn close(&self, id: usize, entries: Vec<Entry>) -> PackedChunk {
        let mut parts: Vec<String> = Vec::with_capacity(entries.len() * 2);
        let mut files: Vec<String> = Vec::new();
        let mut token_total = 0;
        let mut carried_tokens = 0;
        let mut oversized = false;

        for (i, entry) in entries.iter().enumerate() {
            let record = &entry.record;
            if Self::needs_marker(Self::current_path(&entries[..i]), record) {
                let marker = self.marker(record.file_path());
                token_total += estimate_tokens(&marker);
                parts.push(marker);
            }
            parts.push(record.content().to_string());
            token_total += record.tokens();

            if entry.carried {
                carried_tokens += record.tokens();
                continue;
            }
            if record.level() != HierarchyLevel::Directory
                && !files.iter().any(|f| f == record.file_path())
            {
                files.push(record.file_path().to_string());
            }
            if self.cost_after(&[], record) > self.max_tokens {
                oversized = true;
                log::warn!(
                    "Record {}:{}-{} ({} tokens) exceeds chunk budget of {} tokens; emitting it alone",
                    record.file_path(),
                    record.start_line(),
                    record.end_line(),
                    record.tokens(),
                    self.max_tokens
                );
            }
        }

        log::debug!(
            "Packed chunk {id}: {token_total} tokens, {} records, {} files",
            entries.len(),
            files.len()
        );

        PackedChunk {
            id,
            content: parts.join("\n"),
            token_total,
            files,
            carried_tokens,
            record_count: entries.len(),
            oversized,
        }
    }
}

/// Number of trailing lines of `content` whose tokens fit in `budget`
fn tail_lines_within(content: &str, budget: usize) -> usize {
    let mut used = 0;
    let mut count = 0;
    for line in content.split('\n').rev() {
        let tokens = estimate_tokens(line);
        if used + tokens > budget {
            break;
        }
        used += tokens;
        count += 1;
    }
    count
}

/// Summary statistics over a packing run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackingStats {
    pub chunks: usize,
    pub total_tokens: usize,
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub avg_tokens: f64,
    pub oversized: usize,
    pub carried_tokens: usize,
}

impl PackingStats {
    pub fn from_chunks(chunks: &[PackedChunk]) -> Self {
        if chunks.is_empty() {
            return Self::default();
        }
        let total_tokens: usize = chunks.iter().map(|c| c.token_total).sum();
        Self {
            chunks: chunks.len(),
            total_tokens,
            min_tokens: chunks.iter().map(|c| c.token_total).min().unwrap_or(0),
            max_tokens: chunks.iter().map(|c| c.token_total).max().unwrap_or(0),
            avg_tokens: total_tokens as f64 / chunks.len() as f64,
            oversized: chunks.iter().filter(|c| c.oversized).count(),
            carried_tokens: chunks.iter().map(|c| c.carried_tokens).sum(),
        }
    }
}
