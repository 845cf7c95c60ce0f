use crate::extractor::PLAIN_TEXT;
use crate::types::{ChunkRecord, HierarchyLevel};
use std::collections::BTreeMap;
use std::path::Path;

/// Files sharing one parent directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGroup {
    /// Parent directory as it appears in the input paths
    pub path: String,
    /// Directory relative to the base dir, `.` for the base itself
    pub display: String,
    /// Member files as given, in input order
    pub files: Vec<String>,
    base_dir: String,
}

impl DirectoryGroup {
    /// Plain-text listing used as the directory record's content
    pub fn listing(&self) -> String {
        let mut out = format!("Directory: {}\n\nFiles:\n", self.display);
        for file in &self.files {
            out.push_str("- ");
            out.push_str(&relative_to(Path::new(&self.base_dir), file));
            out.push('\n');
        }
        out
    }

    /// Level-1 record for this directory. It has no line range.
    pub fn to_record(&self) -> ChunkRecord {
        ChunkRecord::new(
            HierarchyLevel::Directory,
            self.path.clone(),
            PLAIN_TEXT,
            self.listing(),
            (0, 0),
            "directory",
        )
        .with_name(Some(self.display.clone()))
    }
}

/// Group `file_paths` by parent directory, ordered by directory path
pub fn group_by_directory(base_dir: &Path, file_paths: &[String]) -> Vec<DirectoryGroup> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for path in file_paths {
        let parent = Path::new(path)
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        groups.entry(parent).or_default().push(path.clone());
    }

    let base = base_dir.to_string_lossy().into_owned();
    groups
        .into_iter()
        .map(|(path, files)| DirectoryGroup {
            display: relative_to(base_dir, &path),
            path,
            files,
            base_dir: base.clone(),
        })
        .collect()
}

/// `path` relative to `base_dir` when it lies under it, verbatim otherwise
pub fn relative_to(base_dir: &Path, path: &str) -> String {
    let rel = match Path::new(path).strip_prefix(base_dir) {
        Ok(rel) => rel.to_string_lossy().into_owned(),
        Err(_) => path.to_string(),
    };
    if rel.is_empty() {
        ".".to_string()
    } else {
        rel
    }
}
