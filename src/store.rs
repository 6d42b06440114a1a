//! Loaded datasets and the caller-owned cache around them.
//!
//! A `Dataset` is one load cycle: every company's classified tasks, the tool
//! requests and everything that was skipped on the way. `RoadmapStore` holds
//! at most one dataset and reloads only when asked; nothing is written back.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Sources;
use crate::extract::{extract_tasks, load_tool_requests, LoadOptions, Skip};
use crate::fields::{Quarter, QuarterSlot, Stage};
use crate::schedule::{build_schedule, classify_tasks, Grid, ItemSource};
use crate::table::{Table, Workbook};
use crate::task::{Task, ToolRequest};

/// A skip tagged with the sheet it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSkip {
    pub sheet: String,
    pub skip: Skip,
}

/// Everything produced by one load cycle.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Workbook the tasks came from; `None` when no candidate could be read.
    pub roadmap_source: Option<PathBuf>,
    /// Sheet the tool requests came from; `None` when no candidate could be read.
    pub pipeline_source: Option<PathBuf>,
    /// Companies with at least one task, in sheet order.
    pub companies: Vec<String>,
    pub tasks: Vec<Task>,
    pub tool_requests: Vec<ToolRequest>,
    pub skipped: Vec<SheetSkip>,
}

impl Dataset {
    /// Read the first usable roadmap workbook and pipeline sheet.
    ///
    /// Unreadable candidates are logged and passed over; if none works the
    /// corresponding part of the dataset stays empty.
    pub fn load(sources: &Sources) -> Self {
        let workbook = sources.roadmap_files.iter().find_map(|path| open_candidate(path, Workbook::open));
        let pipeline = sources
            .pipeline_files
            .iter()
            .find_map(|path| open_candidate(path, Table::read_csv).map(|t| (path.clone(), t)));

        let mut dataset = Dataset::default();
        if let Some(wb) = &workbook {
            dataset.add_workbook(wb);
        }
        if let Some((path, table)) = &pipeline {
            dataset.add_pipeline(path, table, sources.options);
        }

        info!(
            companies = dataset.companies.len(),
            tasks = dataset.tasks.len(),
            tool_requests = dataset.tool_requests.len(),
            skipped = dataset.skipped.len(),
            "loaded dataset"
        );
        dataset
    }

    /// Extract and classify every sheet of a workbook as one company each.
    pub fn add_workbook(&mut self, workbook: &Workbook) {
        self.roadmap_source = Some(workbook.path.clone());
        for sheet in &workbook.sheets {
            let extraction = extract_tasks(&sheet.table, &sheet.name);
            self.skipped.extend(extraction.skipped.into_iter().map(|skip| SheetSkip {
                sheet: sheet.name.clone(),
                skip,
            }));
            if extraction.records.is_empty() {
                debug!(sheet = %sheet.name, "no tasks on sheet");
                continue;
            }
            self.companies.push(sheet.name.clone());
            self.tasks.extend(classify_tasks(extraction.records));
        }
    }

    /// Load tool requests from a pipeline sheet.
    pub fn add_pipeline(&mut self, path: &Path, table: &Table, options: LoadOptions) {
        self.pipeline_source = Some(path.to_path_buf());
        let sheet = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extraction = load_tool_requests(table, options);
        self.skipped.extend(extraction.skipped.into_iter().map(|skip| SheetSkip {
            sheet: sheet.clone(),
            skip,
        }));
        self.tool_requests = extraction.records;
    }

    /// Grid over every task and tool request.
    pub fn schedule(&self) -> Grid {
        build_schedule(&self.tasks, &self.tool_requests)
    }

    pub fn task(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn tool_request(&self, id: u64) -> Option<&ToolRequest> {
        self.tool_requests.iter().find(|r| r.id == id)
    }

    fn tool_request_mut(&mut self, id: u64) -> Option<&mut ToolRequest> {
        self.tool_requests.iter_mut().find(|r| r.id == id)
    }

    /// Override an item's stage. Classification is not re-run.
    pub fn set_stage(&mut self, source: ItemSource, stage: Stage) -> bool {
        match source {
            ItemSource::Task(i) => self.tasks.get_mut(i).map(|t| t.stage = stage).is_some(),
            ItemSource::Tool(id) => self.tool_request_mut(id).map(|r| r.stage = stage).is_some(),
        }
    }

    /// Override an item's quarter. Classification is not re-run.
    pub fn set_quarter(&mut self, source: ItemSource, quarter: Quarter) -> bool {
        match source {
            ItemSource::Task(i) => self.tasks.get_mut(i).map(|t| t.quarter = quarter).is_some(),
            ItemSource::Tool(id) => self
                .tool_request_mut(id)
                .map(|r| r.target_quarter = QuarterSlot::Assigned(quarter))
                .is_some(),
        }
    }

    /// Number of tasks per company, in sheet order.
    pub fn company_counts(&self) -> Vec<(&str, usize)> {
        self.companies
            .iter()
            .map(|c| (c.as_str(), self.tasks.iter().filter(|t| &t.company == c).count()))
            .collect()
    }
}

fn open_candidate<T>(path: &Path, open: impl Fn(&Path) -> crate::error::Result<T>) -> Option<T> {
    if !path.exists() {
        debug!(path = %path.display(), "source not found");
        return None;
    }
    match open(path) {
        Ok(v) => {
            info!(path = %path.display(), "loaded source");
            Some(v)
        }
        Err(e) => {
            warn!("skipping unreadable source: {e}");
            None
        }
    }
}

/// Holds the current dataset until it is invalidated.
#[derive(Debug)]
pub struct RoadmapStore {
    sources: Sources,
    cached: Option<Dataset>,
}

impl RoadmapStore {
    pub fn new(sources: Sources) -> Self {
        RoadmapStore { sources, cached: None }
    }

    /// Candidate paths this store loads from.
    pub fn sources(&self) -> &Sources {
        &self.sources
    }

    /// The cached dataset, loading it on first use.
    pub fn dataset(&mut self) -> &Dataset {
        self.cached.get_or_insert_with(|| Dataset::load(&self.sources))
    }

    /// Mutable access for in-memory overrides.
    pub fn dataset_mut(&mut self) -> &mut Dataset {
        self.cached.get_or_insert_with(|| Dataset::load(&self.sources))
    }

    /// Drop the cached dataset; the next access reloads.
    pub fn invalidate(&mut self) {
        self.cached = None;
    }

    /// Discard overrides and load again from disk.
    pub fn reload(&mut self) -> &Dataset {
        self.invalidate();
        self.dataset()
    }

    /// The dataset if one is loaded, without loading.
    pub fn cached(&self) -> Option<&Dataset> {
        self.cached.as_ref()
    }
}
