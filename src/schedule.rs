//! Classification and the stage × quarter grid.
//!
//! This is where the pieces compose: task records are scored, staged and
//! given a quarter, tool requests with no target quarter get one, and every
//! item is appended to the grid cell for its (stage, quarter). Cells keep
//! input order; sorting for display is left to the renderer.

use std::collections::BTreeMap;

use tracing::debug;

use crate::fields::*;
use crate::priority::score_priority;
use crate::quarter::{allocate_quarter, resolve_quarter, TierOrdinals};
use crate::stage::resolve_stage;
use crate::task::{Task, TaskRecord, ToolRequest};

/// Classify a batch of task records, one company at a time.
///
/// Quarter ordinals count every task of a tier in input order, including
/// those that keep an explicit quarter.
pub fn classify_tasks(records: Vec<TaskRecord>) -> Vec<Task> {
    let mut ordinals = TierOrdinals::new();
    records
        .into_iter()
        .map(|r| {
            let priority = score_priority(&r.description, r.benefit.as_deref());
            let stage = resolve_stage(r.stage_hint.as_deref(), r.stage_hint.as_deref());
            let ordinal = ordinals.next(priority);
            let quarter = resolve_quarter(r.quarter_hint.as_deref(), priority, stage, ordinal);
            Task {
                company: r.company,
                area: r.area,
                description: r.description,
                benefit: r.benefit,
                priority,
                stage,
                quarter,
            }
        })
        .collect()
}

/// Where a scheduled item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSource {
    /// Index into the task list the grid was built from.
    Task(usize),
    /// Tool request id.
    Tool(u64),
}

impl ItemSource {
    pub fn label(self) -> &'static str {
        match self {
            ItemSource::Task(_) => "Task",
            ItemSource::Tool(_) => "Tool",
        }
    }

    pub fn number(self) -> u64 {
        match self {
            ItemSource::Task(i) => i as u64,
            ItemSource::Tool(id) => id,
        }
    }
}

/// One card on the roadmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledItem {
    pub source: ItemSource,
    pub title: String,
    /// Company for tasks, department for tool requests.
    pub owner: String,
    /// Requesting stakeholder; tool requests only.
    pub stakeholder: Option<String>,
    pub priority: Priority,
    pub stage: Stage,
    pub quarter: Quarter,
}

impl ScheduledItem {
    /// Whether the item shows in `company`'s view: tasks by their company,
    /// tool requests when the stakeholder names the company. Case-insensitive.
    pub fn belongs_to(&self, company: &str) -> bool {
        match self.source {
            ItemSource::Task(_) => self.owner.eq_ignore_ascii_case(company),
            ItemSource::Tool(_) => self
                .stakeholder
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(&company.to_lowercase())),
        }
    }
}

/// Scheduled items keyed by (stage, quarter).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    cells: BTreeMap<(Stage, Quarter), Vec<ScheduledItem>>,
}

impl Grid {
    pub fn push(&mut self, item: ScheduledItem) {
        self.cells.entry((item.stage, item.quarter)).or_default().push(item);
    }

    /// Items in one cell, in insertion order.
    pub fn cell(&self, stage: Stage, quarter: Quarter) -> &[ScheduledItem] {
        self.cells.get(&(stage, quarter)).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The eight cells of a stage row, empty ones included.
    pub fn stage_row(&self, stage: Stage) -> [&[ScheduledItem]; 8] {
        Quarter::ALL.map(|q| self.cell(stage, q))
    }

    /// A copy keeping only the items `keep` accepts. Quarters are not
    /// reallocated.
    pub fn filtered(&self, keep: impl Fn(&ScheduledItem) -> bool) -> Grid {
        let mut grid = Grid::default();
        for item in self.items().filter(|i| keep(i)) {
            grid.push(item.clone());
        }
        grid
    }

    /// All items in cell order.
    pub fn items(&self) -> impl Iterator<Item = &ScheduledItem> {
        self.cells.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Lay classified tasks and tool requests out on the grid.
///
/// Tool requests without a target quarter are allocated from their priority,
/// stage and position among tool requests of the same tier.
pub fn build_schedule(tasks: &[Task], tool_requests: &[ToolRequest]) -> Grid {
    let mut grid = Grid::default();

    for (i, task) in tasks.iter().enumerate() {
        grid.push(ScheduledItem {
            source: ItemSource::Task(i),
            title: task.description.clone(),
            owner: task.company.clone(),
            stakeholder: None,
            priority: task.priority,
            stage: task.stage,
            quarter: task.quarter,
        });
    }

    let mut ordinals = TierOrdinals::new();
    let mut allocated = 0usize;
    for request in tool_requests {
        let ordinal = ordinals.next(request.priority);
        let quarter = match request.target_quarter {
            QuarterSlot::Assigned(q) => q,
            QuarterSlot::NotAssigned => {
                allocated += 1;
                allocate_quarter(request.priority, request.stage, ordinal)
            }
        };
        grid.push(ScheduledItem {
            source: ItemSource::Tool(request.id),
            title: request.name.clone(),
            owner: request.department.clone(),
            stakeholder: request.stakeholder.clone(),
            priority: request.priority,
            stage: request.stage,
            quarter,
        });
    }

    debug!(
        tasks = tasks.len(),
        tool_requests = tool_requests.len(),
        allocated,
        cells = grid.cells.len(),
        "built schedule"
    );
    grid
}
