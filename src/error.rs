//! Error types and exit codes for pli-impact.

use std::process::ExitCode;
use thiserror::Error;

/// Errors that stop an analysis run before any graph is built.
///
/// Per-file problems (unreadable source, failed review) are not errors; they
/// are carried alongside the results as warnings.
#[derive(Error, Debug)]
pub enum ImpactError {
    #[error("Folder not found: {path}")]
    FolderNotFound { path: String },

    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: String, message: String },

    #[error("Export failed: {message}")]
    Export { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImpactError {
    /// Exit codes:
    /// - 1: IO error
    /// - 2: missing or invalid input folder
    /// - 3: bad configuration
    /// - 4: export failure
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io(_) => ExitCode::from(1),
            Self::FolderNotFound { .. } | Self::NotADirectory { .. } => ExitCode::from(2),
            Self::Config { .. } => ExitCode::from(3),
            Self::Export { .. } => ExitCode::from(4),
        }
    }
}

impl From<serde_json::Error> for ImpactError {
    fn from(e: serde_json::Error) -> Self {
        Self::Export {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ImpactError>;
