//! Snapshot Domain Module
//!
//! One version (old or new) of the source corpus, held fully in memory.

use std::collections::BTreeMap;
use std::path::Path;

/// A source file as loaded: its path and permissively decoded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: String,
    pub text: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Decode `bytes` as UTF-8, replacing invalid sequences.
    pub fn from_bytes(path: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            path: path.into(),
            text: String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Final path component, e.g. `payroll.pli`.
    pub fn name(&self) -> String {
        file_name(&self.path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub files: Vec<SourceFile>,
}

impl Snapshot {
    pub fn new(files: Vec<SourceFile>) -> Self {
        Self { files }
    }

    /// Basename -> file. When two paths share a basename the earlier one
    /// in `files` wins.
    pub fn files_by_name(&self) -> BTreeMap<String, &SourceFile> {
        let mut by_name = BTreeMap::new();
        for file in &self.files {
            by_name.entry(file.name()).or_insert(file);
        }
        by_name
    }

    /// Files hidden by an earlier file with the same basename, each paired
    /// with the file that hides it.
    pub fn shadowed(&self) -> Vec<(&SourceFile, &SourceFile)> {
        let by_name = self.files_by_name();
        self.files
            .iter()
            .filter_map(|file| {
                let kept = by_name.get(&file.name())?;
                (!std::ptr::eq(*kept, file)).then_some((file, *kept))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

pub fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// File name without its extension: `payroll.pli` -> `payroll`.
pub fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| name.to_string())
}
