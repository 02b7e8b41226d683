//! Analysis configuration.
//!
//! Values come from an optional TOML file and are then overridden by CLI
//! flags. Every field has a default, so an empty file is a valid config.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ImpactError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Source file extensions to collect, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Extension appended to a procedure name when it has no owning file.
    pub fallback_extension: String,
    /// Extraction worker count. `None` reserves half the cores.
    pub workers: Option<usize>,
    /// Directory names never descended into.
    pub skip_dirs: Vec<String>,
    /// Seconds one reviewer call may run before it is killed.
    pub review_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["pli".to_string(), "pl1".to_string()],
            fallback_extension: "pli".to_string(),
            workers: None,
            skip_dirs: vec!["target".to_string(), ".git".to_string()],
            review_timeout_secs: 120,
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content).map_err(|message| ImpactError::Config {
            path: path.display().to_string(),
            message,
        })
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
            .unwrap_or(false)
    }

    pub fn is_skipped_dir(&self, dir: &Path) -> bool {
        self.skip_dirs.iter().any(|skip| dir.ends_with(skip))
    }
}
