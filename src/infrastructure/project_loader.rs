use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::domain::snapshot::{Snapshot, SourceFile};
use crate::error::{ImpactError, Result};

/// A file or directory that was skipped while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadWarning {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct LoadedSnapshot {
    pub snapshot: Snapshot,
    pub warnings: Vec<LoadWarning>,
}

pub struct ProjectLoader;

impl ProjectLoader {
    /// Load every source file under `root`, sorted by path.
    ///
    /// Only a missing or non-directory root is an error. Unreadable entries
    /// below it become warnings and contribute nothing. A file whose basename
    /// repeats an earlier path still feeds the graph but is reported, since
    /// change detection only compares the first one.
    pub fn load_folder(root: &Path, config: &AnalysisConfig) -> Result<LoadedSnapshot> {
        if !root.exists() {
            return Err(ImpactError::FolderNotFound {
                path: root.display().to_string(),
            });
        }
        if !root.is_dir() {
            return Err(ImpactError::NotADirectory {
                path: root.display().to_string(),
            });
        }

        let mut paths = Vec::new();
        let mut warnings = Vec::new();
        Self::collect_sources(root, config, &mut paths, &mut warnings);
        paths.sort();

        let mut loaded = Self::load_files(&paths);
        warnings.append(&mut loaded.warnings);
        for (hidden, kept) in loaded.snapshot.shadowed() {
            warn!(path = %hidden.path, kept = %kept.path, "basename already taken; file is not compared");
            warnings.push(LoadWarning {
                path: hidden.path.clone(),
                message: format!("same name as {}; not compared", kept.path),
            });
        }
        loaded.warnings = warnings;

        debug!(
            root = %root.display(),
            files = loaded.snapshot.len(),
            warnings = loaded.warnings.len(),
            "loaded snapshot"
        );
        Ok(loaded)
    }

    /// Read the given files in order, decoding permissively.
    pub fn load_files(paths: &[PathBuf]) -> LoadedSnapshot {
        let mut loaded = LoadedSnapshot::default();
        for path in paths {
            match fs::read(path) {
                Ok(bytes) => loaded
                    .snapshot
                    .files
                    .push(SourceFile::from_bytes(path.display().to_string(), &bytes)),
                Err(e) => Self::skip(&mut loaded.warnings, path, &e),
            }
        }
        loaded
    }

    fn collect_sources(
        dir: &Path,
        config: &AnalysisConfig,
        out: &mut Vec<PathBuf>,
        warnings: &mut Vec<LoadWarning>,
    ) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => return Self::skip(warnings, dir, &e),
        };

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    Self::skip(warnings, dir, &e);
                    continue;
                }
            };

            if path.is_dir() {
                if config.is_skipped_dir(&path) {
                    continue;
                }
                Self::collect_sources(&path, config, out, warnings);
            } else if config.matches_extension(&path) {
                out.push(path);
            }
        }
    }

    fn skip(warnings: &mut Vec<LoadWarning>, path: &Path, e: &std::io::Error) {
        warn!(path = %path.display(), error = %e, "skipping unreadable path");
        warnings.push(LoadWarning {
            path: path.display().to_string(),
            message: e.to_string(),
        });
    }
}
