use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::level_filters::LevelFilter;

use crate::cmd::Commands;

/// Classify and schedule AI adoption work from roadmap and pipeline sheets.
/// Sources default to files under ~/.roadmap or the path passed via --data-dir.
#[derive(Parser)]
#[command(name = "roadmap", version, about = "AI adoption roadmap planner")]
pub struct Cli {
    /// Directory holding config.json and default sources.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Roadmap workbook (CSV file or directory of CSV sheets). May be repeated;
    /// the first readable one wins.
    #[arg(long = "roadmap", global = true)]
    pub roadmap: Vec<PathBuf>,

    /// Tool-request pipeline CSV. May be repeated; the first readable one wins.
    #[arg(long = "pipeline", global = true)]
    pub pipeline: Vec<PathBuf>,

    /// Infer missing tool-request priorities from effort keywords.
    #[arg(long, global = true)]
    pub infer_tool_priority: bool,

    /// More log output (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log level for the verbosity count.
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            _ => LevelFilter::DEBUG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from([
            "roadmap", "list", "--roadmap", "a", "--roadmap", "b", "--pipeline", "p.csv", "-vv",
        ]);
        assert_eq!(cli.roadmap, [PathBuf::from("a"), PathBuf::from("b")]);
        assert_eq!(cli.pipeline, [PathBuf::from("p.csv")]);
        assert_eq!(cli.log_level(), LevelFilter::DEBUG);
        assert!(!cli.infer_tool_priority);
    }
}
