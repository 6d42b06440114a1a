//! Closed vocabularies for roadmap items.
//!
//! This module defines the fixed sets every classified item draws from: the four
//! priority tiers, the five pipeline stages and the eight quarters of the
//! 2025–2026 horizon, plus the CLI enums used for sorting, filtering and export.
//! Labels are reproduced exactly because downstream renderers and exports key
//! on them.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Priority tier, P0 highest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    P0,
    P1,
    P2,
    P3,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::P0, Priority::P1, Priority::P2, Priority::P3];

    pub fn label(self) -> &'static str {
        match self {
            Priority::P0 => "P0",
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
        }
    }

    /// Recognise a tier written in a sheet cell.
    ///
    /// Accepts the bare label in any case and prefixed forms such as
    /// `"P1 - High"` or `"p0: urgent"`.
    pub fn parse(s: &str) -> Option<Priority> {
        let s = s.trim().to_uppercase();
        let mut chars = s.chars();
        if chars.next() != Some('P') {
            return None;
        }
        let tier = match chars.next()? {
            '0' => Priority::P0,
            '1' => Priority::P1,
            '2' => Priority::P2,
            '3' => Priority::P3,
            _ => return None,
        };
        // "P10" is not a tier.
        match chars.next() {
            Some(c) if c.is_ascii_alphanumeric() => None,
            _ => Some(tier),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pipeline stage an item progresses through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    #[serde(rename = "Discovery")]
    Discovery,
    #[serde(rename = "Build vs Buy")]
    BuildVsBuy,
    #[serde(rename = "Initial Demo")]
    InitialDemo,
    #[serde(rename = "Piloting")]
    Piloting,
    #[serde(rename = "Implementation")]
    Implementation,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Discovery,
        Stage::BuildVsBuy,
        Stage::InitialDemo,
        Stage::Piloting,
        Stage::Implementation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Discovery => "Discovery",
            Stage::BuildVsBuy => "Build vs Buy",
            Stage::InitialDemo => "Initial Demo",
            Stage::Piloting => "Piloting",
            Stage::Implementation => "Implementation",
        }
    }

    /// Recognise an exact canonical label, ignoring case and surrounding space.
    pub fn from_label(s: &str) -> Option<Stage> {
        let s = s.trim();
        Stage::ALL.into_iter().find(|stage| stage.label().eq_ignore_ascii_case(s))
    }

    /// Stages where work has not yet moved past evaluation.
    pub fn is_early(self) -> bool {
        matches!(self, Stage::Discovery | Stage::BuildVsBuy)
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Stage> {
        Stage::ALL.get(self.index() + 1).copied()
    }

    pub fn prev(self) -> Option<Stage> {
        self.index().checked_sub(1).map(|i| Stage::ALL[i])
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One of the eight calendar quarters of the scheduling horizon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Quarter {
    #[serde(rename = "Q1 2025")]
    #[value(name = "q1-2025")]
    Q1Y2025,
    #[serde(rename = "Q2 2025")]
    #[value(name = "q2-2025")]
    Q2Y2025,
    #[serde(rename = "Q3 2025")]
    #[value(name = "q3-2025")]
    Q3Y2025,
    #[serde(rename = "Q4 2025")]
    #[value(name = "q4-2025")]
    Q4Y2025,
    #[serde(rename = "Q1 2026")]
    #[value(name = "q1-2026")]
    Q1Y2026,
    #[serde(rename = "Q2 2026")]
    #[value(name = "q2-2026")]
    Q2Y2026,
    #[serde(rename = "Q3 2026")]
    #[value(name = "q3-2026")]
    Q3Y2026,
    #[serde(rename = "Q4 2026")]
    #[value(name = "q4-2026")]
    Q4Y2026,
}

/// First calendar year of the horizon.
pub const FIRST_YEAR: i32 = 2025;

impl Quarter {
    pub const ALL: [Quarter; 8] = [
        Quarter::Q1Y2025,
        Quarter::Q2Y2025,
        Quarter::Q3Y2025,
        Quarter::Q4Y2025,
        Quarter::Q1Y2026,
        Quarter::Q2Y2026,
        Quarter::Q3Y2026,
        Quarter::Q4Y2026,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Quarter::Q1Y2025 => "Q1 2025",
            Quarter::Q2Y2025 => "Q2 2025",
            Quarter::Q3Y2025 => "Q3 2025",
            Quarter::Q4Y2025 => "Q4 2025",
            Quarter::Q1Y2026 => "Q1 2026",
            Quarter::Q2Y2026 => "Q2 2026",
            Quarter::Q3Y2026 => "Q3 2026",
            Quarter::Q4Y2026 => "Q4 2026",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Quarter> {
        Quarter::ALL.get(i).copied()
    }

    pub fn year(self) -> i32 {
        FIRST_YEAR + (self.index() / 4) as i32
    }

    /// Quarter of the year, 1 to 4.
    pub fn number(self) -> u32 {
        (self.index() % 4) as u32 + 1
    }

    pub fn from_parts(year: i32, number: u32) -> Option<Quarter> {
        if !(1..=4).contains(&number) || year < FIRST_YEAR {
            return None;
        }
        let offset = (year - FIRST_YEAR) as usize * 4 + (number as usize - 1);
        Quarter::from_index(offset)
    }

    /// Parse a quarter written in a sheet cell.
    ///
    /// Accepts `Q1 2025`, `Q1-2025`, `Q1/2025` and `2025 Q1` in any case.
    /// Quarters outside the horizon are not recognised.
    pub fn parse(s: &str) -> Option<Quarter> {
        let upper = s.trim().to_uppercase();
        let parts: Vec<&str> = upper
            .split(|c: char| c.is_whitespace() || c == '-' || c == '/' || c == '_')
            .filter(|p| !p.is_empty())
            .collect();
        let (q, y) = match parts.as_slice() {
            [q, y] if q.starts_with('Q') => (*q, *y),
            [y, q] if q.starts_with('Q') => (*q, *y),
            _ => return None,
        };
        let number: u32 = q[1..].parse().ok()?;
        let year: i32 = y.parse().ok()?;
        Quarter::from_parts(year, number)
    }

    /// The horizon quarter a calendar date falls in, if any.
    pub fn containing(date: NaiveDate) -> Option<Quarter> {
        Quarter::from_parts(date.year(), date.month0() / 3 + 1)
    }

    pub fn next(self) -> Option<Quarter> {
        Quarter::from_index(self.index() + 1)
    }

    pub fn prev(self) -> Option<Quarter> {
        self.index().checked_sub(1).and_then(Quarter::from_index)
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label used when a tool request has no target quarter.
pub const NOT_ASSIGNED: &str = "Not Assigned";

/// Cell values that mean "no quarter yet".
const QUARTER_PLACEHOLDERS: [&str; 7] = [
    "not assigned yet",
    "not assigned",
    "unassigned",
    "tbd",
    "tba",
    "n/a",
    "-",
];

/// A tool request's target quarter, which may still be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuarterSlot {
    Assigned(Quarter),
    #[default]
    NotAssigned,
}

impl QuarterSlot {
    /// Normalise a raw sheet value. Placeholders, blanks and anything that is
    /// not a horizon quarter become `NotAssigned`.
    pub fn parse(raw: Option<&str>) -> QuarterSlot {
        match raw.map(str::trim) {
            None | Some("") => QuarterSlot::NotAssigned,
            Some(s) if is_quarter_placeholder(s) => QuarterSlot::NotAssigned,
            Some(s) => Quarter::parse(s).map_or(QuarterSlot::NotAssigned, QuarterSlot::Assigned),
        }
    }

    pub fn quarter(self) -> Option<Quarter> {
        match self {
            QuarterSlot::Assigned(q) => Some(q),
            QuarterSlot::NotAssigned => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            QuarterSlot::Assigned(q) => q.label(),
            QuarterSlot::NotAssigned => NOT_ASSIGNED,
        }
    }
}

impl fmt::Display for QuarterSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// True for the strings sheets use in place of a quarter.
pub fn is_quarter_placeholder(s: &str) -> bool {
    let s = s.trim().to_lowercase();
    QUARTER_PLACEHOLDERS.contains(&s.as_str())
}

impl Serialize for QuarterSlot {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for QuarterSlot {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        if s == NOT_ASSIGNED {
            return Ok(QuarterSlot::NotAssigned);
        }
        Quarter::parse(&s)
            .map(QuarterSlot::Assigned)
            .ok_or_else(|| de::Error::custom(format!("unrecognised quarter \"{s}\"")))
    }
}

/// Available sorting options for item lists.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SortKey {
    Priority,
    Quarter,
    Stage,
    Id,
}

/// Which entity kind a listing covers.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SourceFilter {
    Tasks,
    Tools,
    All,
}

/// Output format for `export`.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parse() {
        assert_eq!(Priority::parse("P0"), Some(Priority::P0));
        assert_eq!(Priority::parse(" p3 "), Some(Priority::P3));
        assert_eq!(Priority::parse("P1 - High"), Some(Priority::P1));
        assert_eq!(Priority::parse("P2:"), Some(Priority::P2));
        assert_eq!(Priority::parse("P10"), None);
        assert_eq!(Priority::parse("P4"), None);
        assert_eq!(Priority::parse("High"), None);
        assert_eq!(Priority::parse(""), None);
    }

    #[test]
    fn test_stage_labels_round_trip_through_from_label() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_label(stage.label()), Some(stage));
        }
        assert_eq!(Stage::from_label("build VS buy"), Some(Stage::BuildVsBuy));
        assert_eq!(Stage::from_label("pilot"), None);
        assert_eq!(Stage::Discovery.prev(), None);
        assert_eq!(Stage::Piloting.next(), Some(Stage::Implementation));
        assert_eq!(Stage::Implementation.next(), None);
    }

    #[test]
    fn test_quarter_parse_forms() {
        assert_eq!(Quarter::parse("Q1 2025"), Some(Quarter::Q1Y2025));
        assert_eq!(Quarter::parse("q3-2026"), Some(Quarter::Q3Y2026));
        assert_eq!(Quarter::parse("2025 Q4"), Some(Quarter::Q4Y2025));
        assert_eq!(Quarter::parse("Q2/2026"), Some(Quarter::Q2Y2026));
        assert_eq!(Quarter::parse("Q1 2027"), None);
        assert_eq!(Quarter::parse("Q4 2024"), None);
        assert_eq!(Quarter::parse("Q5 2025"), None);
        assert_eq!(Quarter::parse("Not Assigned Yet"), None);
    }

    #[test]
    fn test_quarter_labels_and_parts() {
        let labels: Vec<&str> = Quarter::ALL.iter().map(|q| q.label()).collect();
        assert_eq!(
            labels,
            ["Q1 2025", "Q2 2025", "Q3 2025", "Q4 2025", "Q1 2026", "Q2 2026", "Q3 2026", "Q4 2026"]
        );
        assert_eq!(Quarter::Q3Y2026.year(), 2026);
        assert_eq!(Quarter::Q3Y2026.number(), 3);
        assert_eq!(Quarter::Q4Y2026.next(), None);
        assert_eq!(Quarter::Q1Y2026.prev(), Some(Quarter::Q4Y2025));
    }

    #[test]
    fn test_quarter_containing_date() {
        let d = NaiveDate::from_ymd_opt(2025, 5, 14).unwrap();
        assert_eq!(Quarter::containing(d), Some(Quarter::Q2Y2025));
        let d = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        assert_eq!(Quarter::containing(d), Some(Quarter::Q4Y2026));
        let d = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        assert_eq!(Quarter::containing(d), None);
    }

    #[test]
    fn test_quarter_slot_parse_placeholders() {
        assert_eq!(QuarterSlot::parse(Some("Not Assigned Yet")), QuarterSlot::NotAssigned);
        assert_eq!(QuarterSlot::parse(Some("TBD")), QuarterSlot::NotAssigned);
        assert_eq!(QuarterSlot::parse(None), QuarterSlot::NotAssigned);
        assert_eq!(QuarterSlot::parse(Some("sometime")), QuarterSlot::NotAssigned);
        assert_eq!(
            QuarterSlot::parse(Some("Q2 2026")),
            QuarterSlot::Assigned(Quarter::Q2Y2026)
        );
    }

    #[test]
    fn test_serde_labels() {
        assert_eq!(serde_json::to_string(&Stage::BuildVsBuy).unwrap(), "\"Build vs Buy\"");
        assert_eq!(serde_json::to_string(&Quarter::Q1Y2026).unwrap(), "\"Q1 2026\"");
        assert_eq!(serde_json::to_string(&Priority::P1).unwrap(), "\"P1\"");
        assert_eq!(
            serde_json::to_string(&QuarterSlot::NotAssigned).unwrap(),
            "\"Not Assigned\""
        );
        assert_eq!(
            serde_json::to_string(&QuarterSlot::Assigned(Quarter::Q2Y2025)).unwrap(),
            "\"Q2 2025\""
        );
        let slot: QuarterSlot = serde_json::from_str("\"Not Assigned\"").unwrap();
        assert_eq!(slot, QuarterSlot::NotAssigned);
    }
}
