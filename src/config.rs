//! Source locations and loading options.
//!
//! Configuration lives in `config.json` inside the data directory (by default
//! `~/.roadmap`). Every setting can be overridden from the command line; a
//! missing file means defaults.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, RoadmapError};
use crate::extract::LoadOptions;

/// Default roadmap workbook: a directory of CSV sheets, one per company.
pub const DEFAULT_ROADMAP: &str = "roadmap";
/// Default tool-request pipeline sheet.
pub const DEFAULT_PIPELINE: &str = "pipeline.csv";

/// Settings read from `config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Candidate roadmap workbooks, tried in order.
    pub roadmap_files: Vec<PathBuf>,
    /// Candidate pipeline sheets, tried in order.
    pub pipeline_files: Vec<PathBuf>,
    pub infer_tool_priority: bool,
}

impl Config {
    pub const FILE_NAME: &'static str = "config.json";

    /// Load `config.json` from the data directory, or defaults if absent.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(Self::FILE_NAME);
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }
        let text = fs::read_to_string(&path).map_err(|e| RoadmapError::io(&path, e))?;
        serde_json::from_str(&text).map_err(|source| RoadmapError::Config { path, source })
    }

    /// Save to the data directory using atomic write (temp file + rename).
    pub fn save(&self, data_dir: &Path) -> Result<PathBuf> {
        let path = data_dir.join(Self::FILE_NAME);
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp).map_err(|e| RoadmapError::io(&tmp, e))?;
        f.write_all(data.as_bytes()).map_err(|e| RoadmapError::io(&tmp, e))?;
        f.flush().map_err(|e| RoadmapError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| RoadmapError::io(&path, e))?;
        Ok(path)
    }

    /// Apply command-line overrides. Non-empty lists replace the configured ones.
    pub fn with_overrides(mut self, roadmap: Vec<PathBuf>, pipeline: Vec<PathBuf>, infer_tool_priority: bool) -> Self {
        if !roadmap.is_empty() {
            self.roadmap_files = roadmap;
        }
        if !pipeline.is_empty() {
            self.pipeline_files = pipeline;
        }
        self.infer_tool_priority |= infer_tool_priority;
        self
    }

    /// Concrete candidate paths, relative ones joined onto the data directory.
    pub fn sources(&self, data_dir: &Path) -> Sources {
        let resolve = |paths: &[PathBuf], default: &str| -> Vec<PathBuf> {
            if paths.is_empty() {
                vec![data_dir.join(default)]
            } else {
                paths
                    .iter()
                    .map(|p| if p.is_absolute() { p.clone() } else { data_dir.join(p) })
                    .collect()
            }
        };
        Sources {
            roadmap_files: resolve(&self.roadmap_files, DEFAULT_ROADMAP),
            pipeline_files: resolve(&self.pipeline_files, DEFAULT_PIPELINE),
            options: LoadOptions {
                infer_priority: self.infer_tool_priority,
            },
        }
    }
}

/// Resolved inputs for one load cycle.
#[derive(Debug, Clone)]
pub struct Sources {
    pub roadmap_files: Vec<PathBuf>,
    pub pipeline_files: Vec<PathBuf>,
    pub options: LoadOptions,
}

/// The data directory: an explicit path, or `$HOME/.roadmap`.
pub fn data_dir(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".roadmap")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            roadmap_files: vec![PathBuf::from("sheets")],
            pipeline_files: vec![PathBuf::from("/abs/pipeline.csv")],
            infer_tool_priority: true,
        };
        let path = config.save(dir.path()).unwrap();
        assert!(path.ends_with(Config::FILE_NAME));
        assert_eq!(Config::load(dir.path()).unwrap(), config);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(Config::FILE_NAME), r#"{"infer_tool_priority": true}"#).unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.infer_tool_priority);
        assert!(config.roadmap_files.is_empty());
    }

    #[test]
    fn test_malformed_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(Config::FILE_NAME), "{not json").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(RoadmapError::Config { .. })));
    }

    #[test]
    fn test_sources_resolve_relative_paths_and_defaults() {
        let base = Path::new("/data");
        let sources = Config::default().sources(base);
        assert_eq!(sources.roadmap_files, [PathBuf::from("/data/roadmap")]);
        assert_eq!(sources.pipeline_files, [PathBuf::from("/data/pipeline.csv")]);
        assert!(!sources.options.infer_priority);

        let config = Config::default().with_overrides(
            vec![PathBuf::from("a"), PathBuf::from("/b")],
            vec![],
            true,
        );
        let sources = config.sources(base);
        assert_eq!(sources.roadmap_files, [PathBuf::from("/data/a"), PathBuf::from("/b")]);
        assert_eq!(sources.pipeline_files, [PathBuf::from("/data/pipeline.csv")]);
        assert!(sources.options.infer_priority);
    }
}
