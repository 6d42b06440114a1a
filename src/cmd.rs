//! Command implementations for the CLI interface.
//!
//! Each handler reads the dataset from the store, prints to stdout and
//! reports user errors on stderr with exit status 1.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use std::fs;
use std::path::Path;

use chrono::Local;

use crate::config::Config;
use crate::export;
use crate::fields::*;
use crate::priority::{score, tier_for_score};
use crate::quarter::allocate_quarter;
use crate::schedule::{Grid, ItemSource, ScheduledItem};
use crate::stage::classify_stage;
use crate::store::RoadmapStore;
use crate::tui::run::run_board;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the interactive roadmap board.
    Ui,

    /// Print the stage × quarter grid.
    Grid {
        /// Only this company's tasks and the tool requests its stakeholders raised.
        #[arg(long)]
        company: Option<String>,
        /// Leave out tool requests.
        #[arg(long, conflicts_with = "tools_only")]
        tasks_only: bool,
        /// Leave out roadmap tasks.
        #[arg(long)]
        tools_only: bool,
    },

    /// List scheduled items with optional filters.
    List {
        /// Which sources to include.
        #[arg(long, value_enum, default_value_t = SourceFilter::All)]
        source: SourceFilter,
        /// Only this company's tasks and the tool requests its stakeholders raised.
        #[arg(long)]
        company: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, value_enum)]
        stage: Option<Stage>,
        /// Quarter, e.g. q3-2025.
        #[arg(long, value_enum)]
        quarter: Option<Quarter>,
        /// Sort key.
        #[arg(long, value_enum, default_value_t = SortKey::Priority)]
        sort: SortKey,
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List companies with their task counts.
    Companies,

    /// Show rows and cells that were skipped while loading, with reasons.
    Skipped,

    /// Run the classifiers on ad-hoc text.
    Classify {
        /// Phase or status text to classify into a stage.
        #[arg(long)]
        phase: Option<String>,
        /// Task description to score.
        #[arg(long)]
        desc: Option<String>,
        /// Stated benefit to score alongside the description.
        #[arg(long)]
        benefit: Option<String>,
    },

    /// Export scheduled items to CSV or JSON.
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Output file path (default: roadmap.csv or roadmap.json)
        #[arg(long, short)]
        output: Option<String>,
        /// Only this company's tasks and the tool requests its stakeholders raised.
        #[arg(long)]
        company: Option<String>,
    },

    /// Create the data directory and a default config.json.
    Init,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Launch the roadmap board.
pub fn cmd_ui(store: RoadmapStore) {
    if let Err(e) = run_board(store) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

fn company_matches(item: &ScheduledItem, company: Option<&str>) -> bool {
    company.map_or(true, |c| item.belongs_to(c))
}

fn source_matches(item: &ScheduledItem, source: SourceFilter) -> bool {
    match (source, item.source) {
        (SourceFilter::All, _) => true,
        (SourceFilter::Tasks, ItemSource::Task(_)) => true,
        (SourceFilter::Tools, ItemSource::Tool(_)) => true,
        _ => false,
    }
}

/// Warn on stderr when nothing could be loaded at all.
fn report_missing_sources(store: &mut RoadmapStore) {
    let tried = store.sources().clone();
    let ds = store.dataset();
    if ds.roadmap_source.is_none() {
        eprintln!(
            "No roadmap workbook found (tried: {})",
            tried.roadmap_files.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
        );
    }
    if ds.pipeline_source.is_none() {
        eprintln!(
            "No tool-request pipeline found (tried: {})",
            tried.pipeline_files.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
        );
    }
}

/// Print the grid stage by stage, cells sorted by priority.
pub fn cmd_grid(store: &mut RoadmapStore, company: Option<String>, tasks_only: bool, tools_only: bool) {
    report_missing_sources(store);
    let source = if tasks_only {
        SourceFilter::Tasks
    } else if tools_only {
        SourceFilter::Tools
    } else {
        SourceFilter::All
    };
    let grid = store
        .dataset()
        .schedule()
        .filtered(|i| source_matches(i, source) && company_matches(i, company.as_deref()));

    if grid.is_empty() {
        println!("No scheduled items.");
        return;
    }
    print_grid(&grid);
}

fn print_grid(grid: &Grid) {
    for stage in Stage::ALL {
        let row = grid.stage_row(stage);
        let count: usize = row.iter().map(|c| c.len()).sum();
        println!("== {} ({}) ==", stage.label(), count);
        for (quarter, cell) in Quarter::ALL.iter().zip(row) {
            let mut items: Vec<&ScheduledItem> = cell.iter().collect();
            items.sort_by_key(|i| i.priority);
            for item in items {
                println!(
                    "  {:<8} {:<3} {} ({})",
                    quarter.label(),
                    item.priority.label(),
                    item.title,
                    item.owner
                );
            }
        }
    }
    println!("{} item(s)", grid.len());
}

/// List scheduled items as a table.
pub fn cmd_list(
    store: &mut RoadmapStore,
    source: SourceFilter,
    company: Option<String>,
    priority: Option<Priority>,
    stage: Option<Stage>,
    quarter: Option<Quarter>,
    sort: SortKey,
    limit: Option<usize>,
) {
    report_missing_sources(store);
    let grid = store.dataset().schedule();

    let mut filtered: Vec<&ScheduledItem> = grid
        .items()
        .filter(|i| {
            if !source_matches(i, source) || !company_matches(i, company.as_deref()) {
                return false;
            }
            if priority.is_some_and(|p| p != i.priority) {
                return false;
            }
            if stage.is_some_and(|s| s != i.stage) {
                return false;
            }
            if quarter.is_some_and(|q| q != i.quarter) {
                return false;
            }
            true
        })
        .collect();

    sort_items(&mut filtered, sort);

    if let Some(n) = limit {
        filtered.truncate(n);
    }
    print_table(&filtered);
}

/// Stable sort; ties keep grid order.
fn sort_items(items: &mut [&ScheduledItem], sort: SortKey) {
    match sort {
        SortKey::Priority => items.sort_by_key(|i| (i.priority, i.quarter, i.stage)),
        SortKey::Quarter => items.sort_by_key(|i| (i.quarter, i.priority)),
        SortKey::Stage => items.sort_by_key(|i| (i.stage, i.priority)),
        SortKey::Id => items.sort_by_key(|i| (i.source.label(), i.source.number())),
    }
}

/// Print items in a fixed-width table.
pub fn print_table(items: &[&ScheduledItem]) {
    println!(
        "{:<5} {:<4} {:<4} {:<15} {:<8} {:<16} {}",
        "Src", "ID", "Pri", "Stage", "Quarter", "Owner", "Title"
    );
    for i in items {
        println!(
            "{:<5} {:<4} {:<4} {:<15} {:<8} {:<16} {}",
            i.source.label(),
            i.source.number(),
            i.priority.label(),
            i.stage.label(),
            i.quarter.label(),
            truncate(&i.owner, 16),
            i.title
        );
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// List companies and their task counts.
pub fn cmd_companies(store: &mut RoadmapStore) {
    report_missing_sources(store);
    let ds = store.dataset();
    println!("{:<24} {}", "Company", "Tasks");
    for (company, count) in ds.company_counts() {
        println!("{:<24} {}", truncate(company, 24), count);
    }
    println!("Tool requests: {}", ds.tool_requests.len());
}

/// Audit of everything dropped during loading.
pub fn cmd_skipped(store: &mut RoadmapStore) {
    report_missing_sources(store);
    let ds = store.dataset();
    if ds.skipped.is_empty() {
        println!("Nothing skipped.");
        return;
    }
    println!("{:<20} {:<5} {:<5} {}", "Sheet", "Row", "Col", "Reason");
    // 1-based positions to match spreadsheet row and column numbers.
    let pos = |p: Option<usize>| p.map_or("-".to_string(), |n| (n + 1).to_string());
    for s in &ds.skipped {
        println!(
            "{:<20} {:<5} {:<5} {}",
            truncate(&s.sheet, 20),
            pos(s.skip.row),
            pos(s.skip.column),
            s.skip.reason
        );
    }
    println!("{} skipped", ds.skipped.len());
}

/// Run the stage classifier and priority scorer on text from the command line.
pub fn cmd_classify(phase: Option<String>, desc: Option<String>, benefit: Option<String>) {
    if phase.is_none() && desc.is_none() {
        eprintln!("Error: Must specify --phase and/or --desc");
        std::process::exit(1);
    }
    let stage = classify_stage(phase.as_deref());
    if phase.is_some() {
        println!("Stage:     {}", stage.label());
    }
    if let Some(desc) = desc {
        let points = score(&desc, benefit.as_deref());
        let priority = tier_for_score(points);
        println!("Score:     {points}");
        println!("Priority:  {}", priority.label());
        println!(
            "Quarter:   {} (first {} item at this stage)",
            allocate_quarter(priority, stage, 0).label(),
            priority.label()
        );
    }
}

/// Write the scheduled items to a CSV or JSON file.
pub fn cmd_export(store: &mut RoadmapStore, format: ExportFormat, output: Option<String>, company: Option<String>) {
    report_missing_sources(store);
    let output_path = output.unwrap_or_else(|| format!("roadmap.{}", format.extension()));
    let grid = store.dataset().schedule().filtered(|i| company_matches(i, company.as_deref()));
    let rows = export::rows(&grid);

    let content = match format {
        ExportFormat::Csv => export::to_csv(&rows),
        ExportFormat::Json => match export::to_json(&rows, Local::now()) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Failed to serialise export: {e}");
                std::process::exit(1);
            }
        },
    };

    match fs::write(&output_path, content) {
        Ok(_) => println!("Exported {} item(s) to {}", rows.len(), output_path),
        Err(e) => {
            eprintln!("Failed to write {}: {}", output_path, e);
            std::process::exit(1);
        }
    }
}

/// Create the data directory and write a default config if none exists.
pub fn cmd_init(data_dir: &Path) {
    if let Err(e) = fs::create_dir_all(data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }
    let config_path = data_dir.join(Config::FILE_NAME);
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return;
    }
    match Config::default().save(data_dir) {
        Ok(path) => {
            println!("Wrote {}", path.display());
            let sources = Config::default().sources(data_dir);
            for p in sources.roadmap_files.iter().chain(&sources.pipeline_files) {
                println!("  expects {}", p.display());
            }
        }
        Err(e) => {
            eprintln!("Failed to write config: {e}");
            std::process::exit(1);
        }
    }
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(source: ItemSource, owner: &str, priority: Priority, quarter: Quarter) -> ScheduledItem {
        ScheduledItem {
            source,
            title: "t".into(),
            owner: owner.into(),
            stakeholder: None,
            priority,
            stage: Stage::Discovery,
            quarter,
        }
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_filters() {
        let task = item(ItemSource::Task(0), "Acme", Priority::P1, Quarter::Q2Y2025);
        let tool = item(ItemSource::Tool(3), "Finance", Priority::P0, Quarter::Q1Y2025);
        assert!(company_matches(&task, Some("acme")));
        assert!(!company_matches(&task, Some("acm")));
        assert!(!company_matches(&tool, Some("acme")));
        assert!(company_matches(&tool, None));
        assert!(source_matches(&tool, SourceFilter::Tools));
        assert!(!source_matches(&task, SourceFilter::Tools));
        assert!(source_matches(&task, SourceFilter::All));
    }

    #[test]
    fn test_company_filter_keeps_stakeholder_tools() {
        use crate::task::{Task, ToolRequest};

        let task = Task {
            company: "Acme".into(),
            area: "Finance".into(),
            description: "manual copy paste".into(),
            benefit: None,
            priority: Priority::P0,
            stage: Stage::Discovery,
            quarter: Quarter::Q1Y2025,
        };
        let mut ocr = ToolRequest::new(0, "Invoice OCR");
        ocr.department = "Finance".into();
        ocr.stakeholder = Some("Acme Corp - Dana".into());
        let mut unrelated = ToolRequest::new(1, "Chatbot");
        unrelated.stakeholder = Some("Globex - Lee".into());

        let grid = crate::schedule::build_schedule(&[task], &[ocr, unrelated]);
        let acme = grid.filtered(|i| company_matches(i, Some("acme")));
        let mut titles: Vec<&str> = acme.items().map(|i| i.title.as_str()).collect();
        titles.sort();
        assert_eq!(titles, ["Invoice OCR", "manual copy paste"]);
    }

    #[test]
    fn test_sort_items() {
        let a = item(ItemSource::Tool(1), "x", Priority::P2, Quarter::Q1Y2025);
        let b = item(ItemSource::Task(5), "x", Priority::P0, Quarter::Q4Y2025);
        let c = item(ItemSource::Task(2), "x", Priority::P0, Quarter::Q2Y2025);

        let mut items = vec![&a, &b, &c];
        sort_items(&mut items, SortKey::Priority);
        assert_eq!(items.iter().map(|i| i.source).collect::<Vec<_>>(), [c.source, b.source, a.source]);

        sort_items(&mut items, SortKey::Quarter);
        assert_eq!(items[0].source, a.source);

        sort_items(&mut items, SortKey::Id);
        assert_eq!(items.iter().map(|i| i.source).collect::<Vec<_>>(), [c.source, b.source, a.source]);
    }
}
