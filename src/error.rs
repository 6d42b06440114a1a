//! Error types for loading roadmap sources.
//!
//! Classification never fails, so everything here concerns reading files,
//! configuration and the terminal.

use std::path::PathBuf;

/// Main roadmap error type
#[derive(Debug, thiserror::Error)]
pub enum RoadmapError {
    /// A source file or directory could not be read or written
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file exists but is not valid JSON for `Config`
    #[error("invalid config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serialising an export failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A workbook path held no CSV sheets
    #[error("no sheets found in {}", .0.display())]
    EmptyWorkbook(PathBuf),

    /// Terminal setup or drawing failed
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

impl RoadmapError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RoadmapError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for roadmap operations
pub type Result<T> = std::result::Result<T, RoadmapError>;
