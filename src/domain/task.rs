//! Task domain model
//!
//! Tasks are the immutable input of a layout run: a day range with a
//! category, a priority and optional assignee, milestone and dependency
//! metadata. End days are inclusive.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::id::TaskId;

/// A unit of work placed on the calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Display name (used as the bar label)
    pub name: String,

    /// Optional longer description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Category label (e.g. `PROPOSAL`, `ADMIN`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,

    /// Priority, higher is more important
    #[serde(default)]
    pub priority: i32,

    /// Person responsible for the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,

    /// First day of the task
    pub start: NaiveDate,

    /// Last day of the task (inclusive)
    pub end: NaiveDate,

    /// Whether the task marks a milestone
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub milestone: bool,

    /// Tasks that must finish before this one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<TaskId>,
}

impl Task {
    /// Creates a task spanning `start..=end` with default metadata
    pub fn new(id: TaskId, name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            category: String::new(),
            priority: 0,
            assignee: None,
            start,
            end,
            milestone: false,
            dependencies: Vec::new(),
        }
    }

    /// Sets the category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the priority
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the assignee
    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assignee = Some(assignee.into());
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Marks the task as a milestone
    pub fn as_milestone(mut self) -> Self {
        self.milestone = true;
        self
    }

    /// Adds a dependency on another task
    pub fn depending_on(mut self, task_id: TaskId) -> Self {
        if !self.dependencies.contains(&task_id) {
            self.dependencies.push(task_id);
        }
        self
    }

    /// Returns true if the end day precedes the start day
    pub fn is_degenerate(&self) -> bool {
        self.end < self.start
    }

    /// End day used for layout; degenerate tasks collapse onto their start day
    pub fn effective_end(&self) -> NaiveDate {
        self.end.max(self.start)
    }

    /// Whole days between start and effective end (0 for single-day tasks)
    pub fn duration_days(&self) -> i64 {
        (self.effective_end() - self.start).num_days()
    }

    /// Number of calendar days the task covers, counting both ends
    pub fn inclusive_days(&self) -> i64 {
        self.duration_days() + 1
    }

    /// Exclusive end of the day range the task occupies in a row
    ///
    /// Rows are packed on `[start, occupied_until)`. A zero-duration task
    /// still occupies its own day cell.
    pub fn occupied_until(&self) -> NaiveDate {
        let floor = self
            .start
            .checked_add_days(Days::new(1))
            .unwrap_or(self.start);
        self.effective_end().max(floor)
    }

    /// Returns the assignee if it is set and non-blank
    pub fn assignee_name(&self) -> Option<&str> {
        self.assignee
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Returns true if both tasks have the same non-blank assignee
    pub fn shares_assignee(&self, other: &Task) -> bool {
        match (self.assignee_name(), other.assignee_name()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Returns true if both tasks have the same non-blank category
    pub fn shares_category(&self, other: &Task) -> bool {
        let category = self.category.trim();
        !category.is_empty() && category == other.category.trim()
    }

    /// Returns true if the tasks' effective day ranges intersect (inclusive)
    pub fn overlaps(&self, other: &Task) -> bool {
        self.start <= other.effective_end() && other.start <= self.effective_end()
    }
}
