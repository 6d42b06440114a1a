//! # Roadmap - AI Adoption Roadmap Planner
//!
//! A command-line tool that turns loosely structured planning spreadsheets into
//! a prioritised, staged, quarter-by-quarter roadmap, with an optional terminal
//! board for what-if planning.
//!
//! ## Key Features
//!
//! - **Record Extraction**: Sniffs task rows, header rows and column meanings out of
//!   company roadmap sheets and the tool-request pipeline, reporting every skipped row
//! - **Priority Scoring**: Weighted keyword scoring buckets tasks into P0–P3
//! - **Stage Classification**: Maps free-text phase descriptions onto five adoption stages
//! - **Quarter Allocation**: Deterministic placement across Q1 2025 – Q4 2026
//! - **Multiple Interfaces**: CLI listings and exports, plus an interactive board
//!
//! ## Quick Start
//!
//! ```bash
//! # Create ~/.roadmap with a default config
//! roadmap init
//!
//! # Open the board
//! roadmap ui
//!
//! # Print the grid for one company
//! roadmap grid --company Acme
//!
//! # List P0 items due in Q1 2025
//! roadmap list --priority p0 --quarter q1-2025
//!
//! # Try the classifiers on some text
//! roadmap classify --phase "running a pilot" --desc "manual spreadsheet copy paste"
//! ```
//!
//! ## Sources
//!
//! A roadmap workbook is a CSV file or a directory of CSV sheets, one sheet per
//! company. The pipeline is a single CSV export of the tool-request board.
//! Both default to files under `~/.roadmap/`; `config.json` there, or the
//! `--roadmap` / `--pipeline` flags, point elsewhere. Sources are read-only.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod config;
pub mod error;
pub mod export;
pub mod extract;
pub mod fields;
pub mod priority;
pub mod quarter;
pub mod schedule;
pub mod stage;
pub mod store;
pub mod table;
pub mod task;
pub mod tui {
    pub mod board;
    pub mod colors;
    pub mod run;
}

use cli::Cli;
use cmd::*;
use config::Config;
use store::RoadmapStore;

/// Log file used while the board owns the terminal.
const BOARD_LOG: &str = "roadmap.log";

/// Install the fmt subscriber. RUST_LOG wins over the verbosity default.
/// While the board is running, stderr belongs to the terminal UI, so logs go
/// to a file in the data directory instead (or nowhere if it can't be opened).
fn init_logging(level: LevelFilter, board_log: Option<&Path>) {
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match board_log {
        Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).init(),
            Err(_) => builder.with_writer(std::io::sink).init(),
        },
        None => builder.with_writer(std::io::stderr).init(),
    }
}

fn main() {
    let cli = Cli::parse();
    let data_dir = config::data_dir(cli.data_dir.as_deref());

    let board_log = data_dir.join(BOARD_LOG);
    let is_board = matches!(cli.command, Commands::Ui);
    init_logging(cli.log_level(), is_board.then_some(board_log.as_path()));

    // Commands that don't read any sources
    match &cli.command {
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            return;
        }
        Commands::Init => {
            cmd_init(&data_dir);
            return;
        }
        Commands::Classify { phase, desc, benefit } => {
            cmd_classify(phase.clone(), desc.clone(), benefit.clone());
            return;
        }
        _ => {}
    }

    let config = match Config::load(&data_dir) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let sources = config
        .with_overrides(cli.roadmap, cli.pipeline, cli.infer_tool_priority)
        .sources(&data_dir);
    let mut store = RoadmapStore::new(sources);

    match cli.command {
        Commands::Ui => cmd_ui(store),

        Commands::Grid { company, tasks_only, tools_only } =>
            cmd_grid(&mut store, company, tasks_only, tools_only),

        Commands::List { source, company, priority, stage, quarter, sort, limit } =>
            cmd_list(&mut store, source, company, priority, stage, quarter, sort, limit),

        Commands::Companies => cmd_companies(&mut store),

        Commands::Skipped => cmd_skipped(&mut store),

        Commands::Export { format, output, company } =>
            cmd_export(&mut store, format, output, company),

        Commands::Completions { .. } | Commands::Init | Commands::Classify { .. } =>
            unreachable!("handled above"),
    }
}
