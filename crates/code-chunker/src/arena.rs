use crate::types::ChunkRecord;

/// Flat, append-only store of extracted records.
///
/// Parent links are plain indices into this arena, so records stay acyclic
/// and cheap to clone. Records from one file are appended as a block whose
/// local parent indices are rebased onto the arena.
#[derive(Debug, Default, Clone)]
pub struct RecordArena {
    records: Vec<ChunkRecord>,
}

impl RecordArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single record and return its index
    pub fn push(&mut self, record: ChunkRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    /// Append records extracted from one file.
    ///
    /// Parent indices inside `block` are local to the block. Records without
    /// a parent (the file record) are attached to `root`, typically the
    /// directory record.
    pub fn extend_file(&mut self, block: Vec<ChunkRecord>, root: Option<usize>) {
        let offset = self.records.len();
        for mut record in block {
            record.rebase_parent(offset, root);
            self.records.push(record);
        }
    }

    pub fn get(&self, idx: usize) -> Option<&ChunkRecord> {
        self.records.get(idx)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[ChunkRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ChunkRecord> {
        self.records
    }

    /// Render the chain of ancestors ending at `idx`, outermost first.
    ///
    /// `src > src/app.py:file[1-40] > class_definition:App[3-30] > function_definition:run[10-20]`
    #[must_use]
    pub fn hierarchy_path(&self, idx: usize) -> Option<String> {
        let mut parts = Vec::new();
        let mut cursor = Some(idx);
        // Parents always precede children, so the walk terminates.
        while let Some(i) = cursor {
            let record = self.records.get(i)?;
            parts.push(match record.level() {
                crate::HierarchyLevel::Directory => record.file_path().to_string(),
                crate::HierarchyLevel::File => {
                    format!("{}:{}", record.file_path(), record.label())
                }
                _ => record.label(),
            });
            cursor = record.parent().filter(|&p| p < i);
        }
        parts.reverse();
        Some(parts.join(" > "))
    }
}
