//! # Layout Engine
//!
//! Turns tasks into positioned, non-overlapping bars for a day-grid
//! calendar. The engine is pure: no I/O, no clock, no shared state.
//!
//! ## Stages
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Overlap grouping | [`overlap`] | Groups and overlapping pairs |
//! | Row assignment | [`rows`] | Row per task, overflow list |
//! | Conflict classification | [`conflict`] | Categorized conflicts |
//! | Priority scoring | [`priority`] | Score, tier and style per task |
//! | Stacking selection | [`stacking`] | Stacking action per task |
//! | Month splitting | [`month`] | Per-month segments |
//! | Positioning | [`position`] | Coordinates, collision resolution |
//! | Orchestration | [`engine`] | Bars, statistics, recommendations |
//!
//! ## Key Types
//!
//! - [`LayoutConfig`] - User configuration, resolved once per run
//! - [`LayoutEngine`] - Runs the pipeline
//! - [`LayoutResult`] - Bars, groups, conflicts, scores and statistics

pub mod config;
pub mod conflict;
pub mod engine;
pub mod month;
pub mod overlap;
pub mod position;
pub mod priority;
pub mod rows;
pub mod stacking;

pub use config::{Alignment, LayoutConfig, ResolvedConfig, ScoringTable};
pub use conflict::{
    CategorizedConflict, ConflictCategory, ConflictClassifier, ConflictRule, ConflictSummary,
    Level, Resolution, RuleInput, Urgency,
};
pub use engine::{layout, GroupSummary, LayoutEngine, LayoutResult, LayoutStatistics};
pub use month::Segment;
pub use overlap::{Group, Overlap, OverlapType, Severity};
pub use position::{PositionedBar, MAX_RESOLUTION_PASSES};
pub use priority::{PriorityFactor, PriorityScore, Tier, VisualStyle};
pub use rows::{RowAssignment, RowPlan};
pub use stacking::{
    StackingAction, StackingInput, StackingRule, StackingSelector, StackingType, CASCADE_OFFSET,
};
