//! Record extraction from roadmap and tool-request sheets.
//!
//! Neither sheet kind has a fixed layout, so rows and columns are located by
//! sniffing their content. Rows that cannot become entities are not errors:
//! they are returned as `Skip`s next to the records so callers can audit what
//! was dropped and why.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::fields::{Priority, QuarterSlot, is_quarter_placeholder};
use crate::priority::count_priority;
use crate::stage::resolve_stage;
use crate::table::{Cell, Table};
use crate::task::{TaskRecord, ToolRequest, DEFAULT_DEPARTMENT, DEFAULT_PHASE};

/// Task descriptions must be longer than this many characters.
pub const MIN_DESCRIPTION_CHARS: usize = 10;

/// Rows scanned when looking for the pipeline header.
const HEADER_SCAN_ROWS: usize = 10;

/// Why a row or cell did not become a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No row labelled as the task row.
    NoTaskRow,
    /// The sheet has no rows to take a header from.
    NoHeaderRow,
    /// A benefit cell with no task description beside it.
    MissingDescription,
    /// Description of `len` characters after trimming.
    DescriptionTooShort { len: usize },
    MissingName,
    /// Header repeat, section label or marker row.
    Sentinel { marker: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoTaskRow => write!(f, "no task row"),
            SkipReason::NoHeaderRow => write!(f, "no header row"),
            SkipReason::MissingDescription => write!(f, "missing description"),
            SkipReason::DescriptionTooShort { len } => {
                write!(f, "description too short ({len} chars, need more than {MIN_DESCRIPTION_CHARS})")
            }
            SkipReason::MissingName => write!(f, "missing name"),
            SkipReason::Sentinel { marker } => write!(f, "sentinel row ({marker})"),
        }
    }
}

/// A dropped row or cell, by 0-based table position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub row: Option<usize>,
    pub column: Option<usize>,
    pub reason: SkipReason,
}

/// Records accepted from a table plus everything that was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction<T> {
    pub records: Vec<T>,
    pub skipped: Vec<Skip>,
}

impl<T> Default for Extraction<T> {
    fn default() -> Self {
        Extraction {
            records: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> Extraction<T> {
    fn skip(&mut self, row: Option<usize>, column: Option<usize>, reason: SkipReason) {
        debug!(?row, ?column, %reason, "skipped");
        self.skipped.push(Skip { row, column, reason });
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn trimmed(cell: Option<&str>) -> Option<String> {
    cell.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn first_cell_contains(table: &Table, row: usize, needles: &[&str]) -> bool {
    table
        .cell(row, 0)
        .map(|c| c.to_lowercase())
        .map_or(false, |c| needles.iter().any(|n| c.contains(n)))
}

/// Pull task records from a company roadmap sheet.
///
/// The first row whose first cell mentions "task" holds the tasks, read in
/// (description, benefit) column pairs from column 1. Rows labelled
/// "stage"/"phase" or "quarter"/"timeline" supply per-column hints.
pub fn extract_tasks(table: &Table, company: &str) -> Extraction<TaskRecord> {
    let mut out = Extraction::default();

    let Some(task_row) = (0..table.len()).find(|&r| first_cell_contains(table, r, &["task"])) else {
        out.skip(None, None, SkipReason::NoTaskRow);
        return out;
    };
    let stage_row = (0..table.len())
        .find(|&r| r != task_row && first_cell_contains(table, r, &["stage", "phase"]));
    let quarter_row = (0..table.len())
        .find(|&r| r != task_row && first_cell_contains(table, r, &["quarter", "timeline"]));

    let width = table.rows[task_row].len();
    for col in (1..width).step_by(2) {
        let description = table.cell(task_row, col).map(str::trim);
        let benefit = trimmed(table.cell(task_row, col + 1));

        let description = match description {
            Some(d) if !d.is_empty() => d,
            _ => {
                if benefit.is_some() {
                    out.skip(Some(task_row), Some(col), SkipReason::MissingDescription);
                }
                continue;
            }
        };
        let len = description.chars().count();
        if len <= MIN_DESCRIPTION_CHARS {
            out.skip(Some(task_row), Some(col), SkipReason::DescriptionTooShort { len });
            continue;
        }

        out.records.push(TaskRecord {
            company: company.to_string(),
            area: format!("Area #{}", col / 2 + 1),
            description: description.to_string(),
            benefit,
            stage_hint: stage_row.and_then(|r| trimmed(table.cell(r, col))),
            quarter_hint: quarter_row.and_then(|r| trimmed(table.cell(r, col))),
        });
    }

    debug!(company, tasks = out.records.len(), skipped = out.skipped.len(), "extracted tasks");
    out
}

/// Semantic fields of a tool-request row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolField {
    Name,
    Department,
    Stakeholder,
    Tool,
    Budget,
    TargetQuarter,
    Priority,
    Phase,
    Status,
    Stage,
    Notes,
    ReviewedBy,
    Score,
}

/// Header patterns in priority order. Each column takes the first rule whose
/// pattern it contains and whose field is still unassigned.
pub const COLUMN_RULES: &[(&str, ToolField)] = &[
    ("department", ToolField::Department),
    ("dept", ToolField::Department),
    ("team", ToolField::Department),
    ("stakeholder", ToolField::Stakeholder),
    ("requested by", ToolField::Stakeholder),
    ("requester", ToolField::Stakeholder),
    ("owner", ToolField::Stakeholder),
    ("reviewed", ToolField::ReviewedBy),
    ("reviewer", ToolField::ReviewedBy),
    ("target quarter", ToolField::TargetQuarter),
    ("quarter", ToolField::TargetQuarter),
    ("timeline", ToolField::TargetQuarter),
    ("priority", ToolField::Priority),
    ("phase", ToolField::Phase),
    ("stage", ToolField::Stage),
    ("status", ToolField::Status),
    ("budget", ToolField::Budget),
    ("cost", ToolField::Budget),
    ("score", ToolField::Score),
    ("notes", ToolField::Notes),
    ("comment", ToolField::Notes),
    ("tool", ToolField::Tool),
    ("vendor", ToolField::Tool),
    ("software", ToolField::Tool),
    ("name", ToolField::Name),
    ("request", ToolField::Name),
    ("title", ToolField::Name),
];

/// Resolved column index per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: HashMap<ToolField, usize>,
}

impl ColumnMap {
    /// Apply `COLUMN_RULES` to a header row.
    ///
    /// When no header maps to Name, the first unmapped column is used.
    pub fn from_headers(headers: &[Cell]) -> Self {
        let mut map = ColumnMap::default();
        for (col, header) in headers.iter().enumerate() {
            let Some(header) = header else { continue };
            if let Some(field) = match_header(header, |f| map.columns.contains_key(&f)) {
                map.columns.insert(field, col);
            }
        }
        if !map.columns.contains_key(&ToolField::Name) {
            let taken: Vec<usize> = map.columns.values().copied().collect();
            let fallback = (0..headers.len().max(1)).find(|c| !taken.contains(c)).unwrap_or(0);
            map.columns.insert(ToolField::Name, fallback);
        }
        map
    }

    pub fn get(&self, field: ToolField) -> Option<usize> {
        self.columns.get(&field).copied()
    }
}

/// First rule matching `header` whose field `is_taken` rejects.
fn match_header(header: &str, is_taken: impl Fn(ToolField) -> bool) -> Option<ToolField> {
    let header = header.trim().to_lowercase();
    COLUMN_RULES
        .iter()
        .find(|(pattern, field)| header.contains(pattern) && !is_taken(*field))
        .map(|(_, field)| *field)
}

/// How a sentinel marker is matched against a lower-cased name.
#[derive(Debug, Clone, Copy)]
pub enum SentinelRule {
    Exact(&'static str),
    /// A bare section heading: the word, its plural, or the word followed
    /// by a colon (`Department: Finance`).
    SectionLabel(&'static str),
    Contains(&'static str),
}

/// Names that mark header repeats, section labels and marker rows.
pub const SENTINELS: &[SentinelRule] = &[
    SentinelRule::Exact("name"),
    SentinelRule::Contains("subitems"),
    SentinelRule::SectionLabel("department"),
    SentinelRule::Contains("📥"),
];

/// The marker a name matches, if it is a sentinel. `header` is the text of
/// the name column's header, whose literal repeats are also sentinels.
pub fn sentinel_marker(name: &str, header: Option<&str>) -> Option<String> {
    let lower = name.trim().to_lowercase();
    if let Some(h) = header {
        if lower == h.trim().to_lowercase() {
            return Some(h.trim().to_string());
        }
    }
    SENTINELS.iter().find_map(|rule| match *rule {
        SentinelRule::Exact(m) if lower == m => Some(m.to_string()),
        SentinelRule::SectionLabel(m) if is_section_label(&lower, m) => Some(m.to_string()),
        SentinelRule::Contains(m) if lower.contains(m) => Some(m.to_string()),
        _ => None,
    })
}

fn is_section_label(lower: &str, word: &str) -> bool {
    match lower.strip_prefix(word) {
        Some(rest) => rest.is_empty() || rest == "s" || rest.trim_start().starts_with(':'),
        None => false,
    }
}

/// Options for loading the pipeline sheet.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Infer a missing priority from effort keywords instead of defaulting to P2.
    pub infer_priority: bool,
}

/// Locate the header row: the row among the first few with the most cells
/// matching a column rule, needing at least two. Falls back to row 0.
pub fn find_header_row(table: &Table) -> usize {
    let mut best = (0, 0);
    for r in 0..table.len().min(HEADER_SCAN_ROWS) {
        let hits = table.rows[r]
            .iter()
            .flatten()
            .filter(|h| match_header(h, |_| false).is_some())
            .count();
        if hits >= 2 && hits > best.1 {
            best = (r, hits);
        }
    }
    best.0
}

/// Load tool requests from a pipeline sheet.
///
/// Blank rows are ignored; rows without a name or with a sentinel name are
/// skipped. Survivors get sequential ids from 0.
pub fn load_tool_requests(table: &Table, options: LoadOptions) -> Extraction<ToolRequest> {
    let mut out = Extraction::default();
    if table.is_empty() {
        out.skip(None, None, SkipReason::NoHeaderRow);
        return out;
    }

    let header_row = find_header_row(table);
    let columns = ColumnMap::from_headers(&table.rows[header_row]);
    let name_col = columns.get(ToolField::Name).unwrap_or(0);
    let name_header = table.cell(header_row, name_col);

    for r in header_row + 1..table.len() {
        if table.rows[r].iter().all(Option::is_none) {
            continue;
        }
        let field = |f: ToolField| columns.get(f).and_then(|c| trimmed(table.cell(r, c)));

        let Some(name) = field(ToolField::Name) else {
            out.skip(Some(r), Some(name_col), SkipReason::MissingName);
            continue;
        };
        if let Some(marker) = sentinel_marker(&name, name_header) {
            out.skip(Some(r), Some(name_col), SkipReason::Sentinel { marker });
            continue;
        }

        let mut request = ToolRequest::new(out.records.len() as u64, name);
        request.department = field(ToolField::Department).unwrap_or_else(|| DEFAULT_DEPARTMENT.to_string());
        request.stakeholder = field(ToolField::Stakeholder);
        request.tool = field(ToolField::Tool);
        request.budget = field(ToolField::Budget);
        request.status = field(ToolField::Status);
        request.notes = field(ToolField::Notes);
        request.reviewed_by = field(ToolField::ReviewedBy);
        request.score = field(ToolField::Score);
        request.phase = field(ToolField::Phase)
            .or_else(|| request.status.clone())
            .unwrap_or_else(|| DEFAULT_PHASE.to_string());

        request.priority = match field(ToolField::Priority).as_deref().and_then(Priority::parse) {
            Some(p) => p,
            None if options.infer_priority => {
                let text = format!("{} {}", request.name, request.notes.as_deref().unwrap_or_default());
                count_priority(&text)
            }
            None => Priority::P2,
        };
        request.stage = resolve_stage(field(ToolField::Stage).as_deref(), Some(request.phase.as_str()));

        let raw_quarter = field(ToolField::TargetQuarter);
        request.target_quarter = QuarterSlot::parse(raw_quarter.as_deref());
        if let (Some(raw), QuarterSlot::NotAssigned) = (&raw_quarter, request.target_quarter) {
            if !is_quarter_placeholder(raw) {
                debug!(row = r, value = %raw, "unrecognised target quarter, leaving unassigned");
            }
        }

        out.records.push(request);
    }

    debug!(
        header_row,
        requests = out.records.len(),
        skipped = out.skipped.len(),
        "loaded tool requests"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Quarter, Stage};

    fn roadmap(rows: &[&[&str]]) -> Table {
        Table::from_rows(rows.iter().map(|r| r.iter().copied()))
    }

    #[test]
    fn test_description_length_boundary() {
        let t = roadmap(&[&["Tasks", "0123456789", "", "0123456789A", ""]]);
        let ex = extract_tasks(&t, "Acme");
        assert_eq!(ex.records.len(), 1);
        assert_eq!(ex.records[0].description, "0123456789A");
        assert_eq!(
            ex.skipped,
            vec![Skip {
                row: Some(0),
                column: Some(1),
                reason: SkipReason::DescriptionTooShort { len: 10 }
            }]
        );
    }

    #[test]
    fn test_length_is_measured_after_trimming() {
        let t = roadmap(&[&["Task list", "   short one   "]]);
        let ex = extract_tasks(&t, "Acme");
        assert!(ex.records.is_empty());
        assert_eq!(ex.skipped[0].reason, SkipReason::DescriptionTooShort { len: 9 });
    }

    #[test]
    fn test_pairs_and_areas() {
        let t = roadmap(&[
            &["Company overview", "ignored row", "", "", "", "", ""],
            &["Key TASKS", "Reconcile vendor invoices", "AI matching", "", "", "Month-end close checklist", ""],
        ]);
        let ex = extract_tasks(&t, "Acme");
        assert_eq!(ex.records.len(), 2);
        assert_eq!(ex.records[0].area, "Area #1");
        assert_eq!(ex.records[0].benefit.as_deref(), Some("AI matching"));
        assert_eq!(ex.records[1].area, "Area #3");
        assert_eq!(ex.records[1].benefit, None);
        assert_eq!(ex.records[1].company, "Acme");
        assert!(ex.skipped.is_empty());
    }

    #[test]
    fn test_orphan_benefit_is_reported() {
        let t = roadmap(&[&["Tasks", "", "Saves time"]]);
        let ex = extract_tasks(&t, "Acme");
        assert!(ex.records.is_empty());
        assert_eq!(ex.skipped[0].reason, SkipReason::MissingDescription);
    }

    #[test]
    fn test_no_task_row_yields_nothing() {
        let t = roadmap(&[&["Overview", "Reconcile vendor invoices"]]);
        let ex = extract_tasks(&t, "Acme");
        assert!(ex.is_empty());
        assert_eq!(ex.skipped[0].reason, SkipReason::NoTaskRow);
    }

    #[test]
    fn test_hint_rows_align_with_columns() {
        let t = roadmap(&[
            &["Tasks", "Reconcile vendor invoices", "", "Build board pack deck", ""],
            &["Phase", "Pilot running", "", "", ""],
            &["Target quarter", "", "", "Q2 2026", ""],
        ]);
        let ex = extract_tasks(&t, "Acme");
        assert_eq!(ex.records[0].stage_hint.as_deref(), Some("Pilot running"));
        assert_eq!(ex.records[0].quarter_hint, None);
        assert_eq!(ex.records[1].stage_hint, None);
        assert_eq!(ex.records[1].quarter_hint.as_deref(), Some("Q2 2026"));
    }

    #[test]
    fn test_column_rules_first_unassigned_wins() {
        let headers: Vec<Cell> = ["Name", "Department", "Stakeholder", "Tool Name", "Status", "Target Quarter", "Priority", "Reviewed By", "Team"]
            .iter()
            .map(|s| Some(s.to_string()))
            .collect();
        let map = ColumnMap::from_headers(&headers);
        assert_eq!(map.get(ToolField::Name), Some(0));
        assert_eq!(map.get(ToolField::Department), Some(1));
        assert_eq!(map.get(ToolField::Stakeholder), Some(2));
        assert_eq!(map.get(ToolField::Tool), Some(3));
        assert_eq!(map.get(ToolField::Status), Some(4));
        assert_eq!(map.get(ToolField::TargetQuarter), Some(5));
        assert_eq!(map.get(ToolField::Priority), Some(6));
        assert_eq!(map.get(ToolField::ReviewedBy), Some(7));
        // Department is already taken, and "team" matches nothing else.
        assert!(!map.columns.values().any(|&c| c == 8));
        assert_eq!(map.get(ToolField::Phase), None);
    }

    #[test]
    fn test_name_falls_back_to_first_unmapped_column() {
        let headers: Vec<Cell> = vec![Some("Department".into()), None, Some("Priority".into())];
        let map = ColumnMap::from_headers(&headers);
        assert_eq!(map.get(ToolField::Name), Some(1));
    }

    #[test]
    fn test_sentinel_markers() {
        assert_eq!(sentinel_marker("Name", None).as_deref(), Some("name"));
        assert_eq!(sentinel_marker("📥 Incoming requests", None).as_deref(), Some("📥"));
        assert_eq!(sentinel_marker("Subitems", None).as_deref(), Some("subitems"));
        assert_eq!(sentinel_marker("Department: Finance", None).as_deref(), Some("department"));
        assert_eq!(sentinel_marker("Departments", None).as_deref(), Some("department"));
        assert_eq!(sentinel_marker("  DEPARTMENT  ", None).as_deref(), Some("department"));
        assert_eq!(sentinel_marker("Department budget dashboard", None), None);
        assert_eq!(sentinel_marker("Departmental wiki search", None), None);
        assert_eq!(sentinel_marker("Request", Some("Request")).as_deref(), Some("Request"));
        assert_eq!(sentinel_marker("Rename vendor records", None), None);
    }

    fn pipeline() -> Table {
        roadmap(&[
            &["AI Tool Request Pipeline", "", "", "", "", ""],
            &["Name", "Department", "Stakeholder", "Status", "Target Quarter", "Priority"],
            &["📥 New requests", "", "", "", "", ""],
            &["Invoice OCR", "Finance", "Dana", "Pilot with AP team", "Q2 2025", "P0"],
            &["Name", "Department", "Stakeholder", "Status", "Target Quarter", "Priority"],
            &["", "", "", "", "", ""],
            &["", "Ops", "Lee", "", "", ""],
            &["Contract search", "", "", "", "Not Assigned Yet", ""],
            &["Meeting notes bot", "Sales", "", "Vendor comparison", "sometime", "p1 - high"],
        ])
    }

    #[test]
    fn test_load_tool_requests_filters_and_defaults() {
        let ex = load_tool_requests(&pipeline(), LoadOptions::default());
        let names: Vec<&str> = ex.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Invoice OCR", "Contract search", "Meeting notes bot"]);
        let ids: Vec<u64> = ex.records.iter().map(|r| r.id).collect();
        assert_eq!(ids, [0, 1, 2]);

        let ocr = &ex.records[0];
        assert_eq!(ocr.department, "Finance");
        assert_eq!(ocr.stakeholder.as_deref(), Some("Dana"));
        assert_eq!(ocr.phase, "Pilot with AP team");
        assert_eq!(ocr.stage, Stage::Piloting);
        assert_eq!(ocr.priority, Priority::P0);
        assert_eq!(ocr.target_quarter, QuarterSlot::Assigned(Quarter::Q2Y2025));

        let contract = &ex.records[1];
        assert_eq!(contract.department, "Not Assigned");
        assert_eq!(contract.phase, "Discovery");
        assert_eq!(contract.stage, Stage::Discovery);
        assert_eq!(contract.priority, Priority::P2);
        assert_eq!(contract.target_quarter, QuarterSlot::NotAssigned);

        let bot = &ex.records[2];
        assert_eq!(bot.priority, Priority::P1);
        assert_eq!(bot.stage, Stage::BuildVsBuy);
        assert_eq!(bot.target_quarter, QuarterSlot::NotAssigned);
    }

    #[test]
    fn test_load_tool_requests_skip_counts() {
        let ex = load_tool_requests(&pipeline(), LoadOptions::default());
        let reasons: Vec<&SkipReason> = ex.skipped.iter().map(|s| &s.reason).collect();
        assert_eq!(
            reasons,
            [
                &SkipReason::Sentinel { marker: "📥".into() },
                &SkipReason::Sentinel { marker: "Name".into() },
                &SkipReason::MissingName,
            ]
        );
        assert_eq!(ex.skipped[2].row, Some(6));
    }

    #[test]
    fn test_header_sniffing() {
        assert_eq!(find_header_row(&pipeline()), 1);
        let t = roadmap(&[&["just", "data"]]);
        assert_eq!(find_header_row(&t), 0);
    }

    #[test]
    fn test_inferred_priority_when_enabled() {
        let t = roadmap(&[
            &["Name", "Notes", "Priority"],
            &["Spreadsheet cleanup", "manual copy paste every week", ""],
            &["Slack digest", "", ""],
        ]);
        let ex = load_tool_requests(&t, LoadOptions { infer_priority: true });
        assert_eq!(ex.records[0].priority, Priority::P0);
        assert_eq!(ex.records[1].priority, Priority::P2);

        let ex = load_tool_requests(&t, LoadOptions::default());
        assert_eq!(ex.records[0].priority, Priority::P2);
    }

    #[test]
    fn test_department_requests_are_not_section_labels() {
        let t = roadmap(&[
            &["Name", "Department"],
            &["Department: Finance", ""],
            &["Department budget dashboard", "Finance"],
        ]);
        let ex = load_tool_requests(&t, LoadOptions::default());
        let names: Vec<&str> = ex.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Department budget dashboard"]);
        assert_eq!(ex.skipped.len(), 1);
        assert_eq!(ex.skipped[0].reason, SkipReason::Sentinel { marker: "department".into() });
    }

    #[test]
    fn test_explicit_stage_column_wins() {
        let t = roadmap(&[
            &["Name", "Stage", "Status"],
            &["Forecast model", "Implementation", "intake"],
        ]);
        let ex = load_tool_requests(&t, LoadOptions::default());
        assert_eq!(ex.records[0].stage, Stage::Implementation);
        assert_eq!(ex.records[0].phase, "intake");
    }

    #[test]
    fn test_empty_table() {
        let ex = load_tool_requests(&Table::default(), LoadOptions::default());
        assert!(ex.is_empty());
        assert_eq!(ex.skipped[0].reason, SkipReason::NoHeaderRow);
    }
}
