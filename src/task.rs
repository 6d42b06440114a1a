//! Roadmap entities and related functionality.
//!
//! This module defines the items the roadmap schedules: tasks pulled from a
//! company's roadmap sheet and requests pulled from the tool-request pipeline.
//! A `TaskRecord` is what extraction produces; classification turns it into a
//! `Task` with every field populated.

use serde::{Deserialize, Serialize};

use crate::fields::*;

/// Default department for tool requests that name none.
pub const DEFAULT_DEPARTMENT: &str = NOT_ASSIGNED;
/// Default phase text for tool requests that carry none.
pub const DEFAULT_PHASE: &str = "Discovery";

/// A task extracted from a roadmap sheet, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub company: String,
    pub area: String,
    pub description: String,
    pub benefit: Option<String>,
    /// Raw text from a stage/phase row aligned with the task's column.
    pub stage_hint: Option<String>,
    /// Raw text from a quarter/timeline row aligned with the task's column.
    pub quarter_hint: Option<String>,
}

/// A classified roadmap task.
///
/// Priority, stage and quarter are always set; the board may override stage
/// and quarter in memory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub company: String,
    pub area: String,
    pub description: String,
    pub benefit: Option<String>,
    pub priority: Priority,
    pub stage: Stage,
    pub quarter: Quarter,
}

/// A request from the tool-request pipeline sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolRequest {
    /// Load-order sequence number, stable for one load cycle.
    pub id: u64,
    pub name: String,
    pub department: String,
    pub stakeholder: Option<String>,
    pub tool: Option<String>,
    pub budget: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub score: Option<String>,
    /// Free-text status the stage was classified from.
    pub phase: String,
    pub priority: Priority,
    pub stage: Stage,
    pub target_quarter: QuarterSlot,
}

impl ToolRequest {
    /// A request with every optional field at its default.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        ToolRequest {
            id,
            name: name.into(),
            department: DEFAULT_DEPARTMENT.to_string(),
            stakeholder: None,
            tool: None,
            budget: None,
            status: None,
            notes: None,
            reviewed_by: None,
            score: None,
            phase: DEFAULT_PHASE.to_string(),
            priority: Priority::P2,
            stage: Stage::Discovery,
            target_quarter: QuarterSlot::NotAssigned,
        }
    }
}
