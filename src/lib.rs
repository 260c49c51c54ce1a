//! planner-layout - Task layout for day-grid calendars
//!
//! Takes time-bounded tasks (start and end day, category, priority,
//! assignee, milestone flag, dependencies) and produces positioned bars that
//! do not overlap, together with conflict classifications, priority scores
//! and quality metrics. The `planner` binary wraps the engine with task-file
//! loading and configuration discovery.

pub mod cli;
pub mod domain;
pub mod layout;
pub mod storage;

pub use domain::{DependencyGraph, Task, TaskId};
pub use layout::{layout, LayoutConfig, LayoutEngine, LayoutResult};
