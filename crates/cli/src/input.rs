use anyhow::{Context as AnyhowContext, Result};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Files named on the command line, with their contents
pub(crate) struct Input {
    pub(crate) base_dir: PathBuf,
    pub(crate) paths: Vec<String>,
    pub(crate) contents: HashMap<String, String>,
}

impl Input {
    /// Read every listed file. Invalid UTF-8 is replaced rather than rejected.
    pub(crate) fn read(base_dir: PathBuf, files: &[PathBuf]) -> Result<Self> {
        let mut paths = Vec::with_capacity(files.len());
        let mut contents = HashMap::with_capacity(files.len());
        for file in files {
            let bytes =
                fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
            let key = file.to_string_lossy().into_owned();
            contents.insert(key.clone(), String::from_utf8_lossy(&bytes).into_owned());
            paths.push(key);
        }
        log::debug!("Read {} files", paths.len());
        Ok(Self {
            base_dir,
            paths,
            contents,
        })
    }
}
