//! Tabular row sources.
//!
//! Roadmap and pipeline sheets arrive as CSV exports. A `Table` is an ordered
//! list of rows, each an ordered list of optional cells with stable column
//! indices. A `Workbook` groups sheets: a single CSV file is a one-sheet
//! workbook named after its file stem, a directory holds one sheet per CSV file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, RoadmapError};

/// One cell; blank cells are `None`.
pub type Cell = Option<String>;

/// Rows of cells, as read from a sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table from literal rows; empty strings become blank cells.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: AsRef<str>,
    {
        Table {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|c| to_cell(c.as_ref())).collect())
                .collect(),
        }
    }

    /// Parse CSV text. Quoted fields may contain commas, doubled quotes and
    /// line breaks.
    pub fn from_csv_str(text: &str) -> Self {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let rows = parse_csv_records(text)
            .into_iter()
            .map(|fields| fields.iter().map(|f| to_cell(f)).collect())
            .collect();
        Table { rows }
    }

    pub fn read_csv(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| RoadmapError::io(path, e))?;
        Ok(Table::from_csv_str(&text))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text at (row, col), `None` when blank or out of range.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col)?.as_deref()
    }
}

fn to_cell(s: &str) -> Cell {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// A named table from a workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub table: Table,
}

/// A set of sheets read from one path.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub path: PathBuf,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Open a CSV file or a directory of CSV files.
    ///
    /// Directory entries are read in file-name order. A path with no CSV
    /// sheets is an error.
    pub fn open(path: &Path) -> Result<Self> {
        let mut files = Vec::new();
        if path.is_dir() {
            for entry in fs::read_dir(path).map_err(|e| RoadmapError::io(path, e))? {
                let entry = entry.map_err(|e| RoadmapError::io(path, e))?;
                let p = entry.path();
                if p.is_file() && is_csv(&p) {
                    files.push(p);
                }
            }
            files.sort();
        } else {
            files.push(path.to_path_buf());
        }

        let mut sheets = Vec::new();
        for file in files {
            let name = sheet_name(&file);
            let table = Table::read_csv(&file)?;
            debug!(sheet = %name, rows = table.len(), "read sheet");
            sheets.push(Sheet { name, table });
        }

        if sheets.is_empty() {
            return Err(RoadmapError::EmptyWorkbook(path.to_path_buf()));
        }
        Ok(Workbook {
            path: path.to_path_buf(),
            sheets,
        })
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case("csv"))
}

/// Sheet label for a file: its stem, trimmed.
fn sheet_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().trim().to_string())
        .unwrap_or_default()
}

/// Split CSV text into records of fields.
fn parse_csv_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current_field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    // Escaped quote
                    current_field.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current_field));
            }
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                fields.push(std::mem::take(&mut current_field));
                records.push(std::mem::take(&mut fields));
            }
            _ => current_field.push(ch),
        }
    }

    // Last record without a trailing newline
    if !current_field.is_empty() || !fields.is_empty() {
        fields.push(current_field);
        records.push(fields);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_fields() {
        let t = Table::from_csv_str("a,\"b, c\",\"say \"\"hi\"\"\"\n,\"two\nlines\",x\r\n");
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(0, 1), Some("b, c"));
        assert_eq!(t.cell(0, 2), Some("say \"hi\""));
        assert_eq!(t.cell(1, 0), None);
        assert_eq!(t.cell(1, 1), Some("two\nlines"));
        assert_eq!(t.cell(1, 2), Some("x"));
    }

    #[test]
    fn test_blank_cells_and_bounds() {
        let t = Table::from_csv_str("x,  ,y\nlast");
        assert_eq!(t.cell(0, 1), None);
        assert_eq!(t.cell(0, 9), None);
        assert_eq!(t.cell(5, 0), None);
        assert_eq!(t.cell(1, 0), Some("last"));
        assert_eq!(t.cell(0, 2), Some("y"));
    }

    #[test]
    fn test_bom_is_stripped() {
        let t = Table::from_csv_str("\u{feff}Name,Dept\n");
        assert_eq!(t.cell(0, 0), Some("Name"));
    }

    #[test]
    fn test_workbook_directory_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b_corp.csv"), "Tasks,x\n").unwrap();
        fs::write(dir.path().join(" Acme .csv"), "Tasks,y\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let wb = Workbook::open(dir.path()).unwrap();
        let names: Vec<&str> = wb.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Acme", "b_corp"]);
    }

    #[test]
    fn test_workbook_empty_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Workbook::open(dir.path()),
            Err(RoadmapError::EmptyWorkbook(_))
        ));
    }

    #[test]
    fn test_workbook_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.csv");
        assert!(matches!(Workbook::open(&missing), Err(RoadmapError::Io { .. })));
    }
}
