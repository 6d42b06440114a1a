//! CSV and JSON export of scheduled items.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::Result;
use crate::fields::{Priority, Quarter, Stage};
use crate::schedule::{Grid, ScheduledItem};

/// Flat, serialisable view of one scheduled item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    pub source: &'static str,
    pub id: u64,
    pub title: String,
    pub owner: String,
    pub priority: Priority,
    pub stage: Stage,
    pub quarter: Quarter,
}

impl From<&ScheduledItem> for ExportRow {
    fn from(item: &ScheduledItem) -> Self {
        ExportRow {
            source: item.source.label(),
            id: item.source.number(),
            title: item.title.clone(),
            owner: item.owner.clone(),
            priority: item.priority,
            stage: item.stage,
            quarter: item.quarter,
        }
    }
}

/// Rows in grid order: stage-major, then quarter, then insertion.
pub fn rows(grid: &Grid) -> Vec<ExportRow> {
    grid.items().map(ExportRow::from).collect()
}

/// Quote a field when it holds a comma, quote or newline; quotes are doubled.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub const CSV_HEADER: &str = "Source,ID,Title,Owner,Priority,Stage,Quarter";

pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut out = String::new();
    out.push_str(CSV_HEADER);
    out.push('\n');
    for r in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{},{}\n",
            r.source,
            r.id,
            escape_csv(&r.title),
            escape_csv(&r.owner),
            r.priority.label(),
            r.stage.label(),
            r.quarter.label(),
        ));
    }
    out
}

#[derive(Serialize)]
struct JsonExport<'a> {
    generated_at: String,
    items: &'a [ExportRow],
}

pub fn to_json(rows: &[ExportRow], generated_at: DateTime<Local>) -> Result<String> {
    let doc = JsonExport {
        generated_at: generated_at.to_rfc3339(),
        items: rows,
    };
    Ok(serde_json::to_string_pretty(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::QuarterSlot;
    use crate::schedule::build_schedule;
    use crate::task::{Task, ToolRequest};

    fn grid() -> Grid {
        let task = Task {
            company: "Acme, Inc".into(),
            area: "Area #1".into(),
            description: "Reconcile \"vendor\" invoices".into(),
            benefit: None,
            priority: Priority::P1,
            stage: Stage::Piloting,
            quarter: Quarter::Q3Y2025,
        };
        let mut tool = ToolRequest::new(4, "Invoice OCR");
        tool.department = "Finance".into();
        tool.priority = Priority::P0;
        tool.target_quarter = QuarterSlot::Assigned(Quarter::Q1Y2025);
        build_schedule(&[task], &[tool])
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_csv_rows_in_grid_order() {
        let csv = to_csv(&rows(&grid()));
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "Tool,4,Invoice OCR,Finance,P0,Discovery,Q1 2025");
        assert_eq!(
            lines[2],
            "Task,0,\"Reconcile \"\"vendor\"\" invoices\",\"Acme, Inc\",P1,Piloting,Q3 2025"
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_json_export() {
        let now = Local::now();
        let json = to_json(&rows(&grid()), now).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["generated_at"], now.to_rfc3339());
        let items = value["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["source"], "Tool");
        assert_eq!(items[0]["quarter"], "Q1 2025");
        assert_eq!(items[1]["stage"], "Piloting");
        assert_eq!(items[1]["priority"], "P1");
    }
}
