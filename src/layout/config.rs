//! Layout configuration
//!
//! [`LayoutConfig`] is the user-facing, partially specified configuration
//! (every field optional in TOML). [`LayoutConfig::resolve`] turns it into a
//! [`ResolvedConfig`] once per run: derived dimensions are filled in,
//! invalid values fall back to defaults and the calendar window defaults to
//! the task extent. Every stage reads the resolved value by reference.
//!
//! | Field | Default |
//! |-------|---------|
//! | `day_width` | 20 |
//! | `day_height` | 60 |
//! | `max_rows_per_day` | 5 |
//! | `row_height` | `day_height / max_rows_per_day` |
//! | `task_spacing` | `row_height * 0.15` |
//! | `base_task_height` | `row_height * 0.7` |
//! | `min_task_height` | `row_height * 0.4` |
//! | `max_task_height` | `row_height - task_spacing` |
//! | `min_task_width` | `day_width * 0.5` |
//! | `max_task_width` | `day_width * 31` |
//! | `month_boundary_gap` | `day_width * 0.1` |
//! | `collision_buffer` | 0.5 |
//! | `grid_snap` | 0 (disabled) |
//! | `overlap_threshold` | 0 |
//! | `near_deadline_days` | 7 |

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::Task;

pub const DEFAULT_DAY_WIDTH: f64 = 20.0;
pub const DEFAULT_DAY_HEIGHT: f64 = 60.0;
pub const DEFAULT_MAX_ROWS: usize = 5;
pub const DEFAULT_COLLISION_BUFFER: f64 = 0.5;
pub const DEFAULT_NEAR_DEADLINE_DAYS: i64 = 7;

/// Vertical alignment of a group's rows inside the day cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    #[default]
    Top,
    Center,
    Bottom,
    Justify,
    Auto,
}

/// Score cutoffs for prominence tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            critical: 15.0,
            high: 10.0,
            medium: 6.0,
            low: 3.0,
        }
    }
}

/// Cutoffs that map conflict scores to impact, risk, urgency and complexity levels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelThresholds {
    pub impact_high: f64,
    pub impact_medium: f64,
    pub risk_high: f64,
    pub risk_medium: f64,
    pub urgency_urgent: f64,
    pub urgency_high: f64,
    pub urgency_medium: f64,
    pub complexity_high: f64,
    pub complexity_medium: f64,
}

impl Default for LevelThresholds {
    fn default() -> Self {
        Self {
            impact_high: 10.0,
            impact_medium: 6.0,
            risk_high: 8.0,
            risk_medium: 5.0,
            urgency_urgent: 8.0,
            urgency_high: 5.0,
            urgency_medium: 3.0,
            complexity_high: 6.0,
            complexity_medium: 3.0,
        }
    }
}

/// Weight of each priority factor in the overall score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FactorWeights {
    pub conflict_severity: f64,
    pub task_importance: f64,
    pub timeline_urgency: f64,
    pub resource_contention: f64,
    pub dependency_criticality: f64,
    pub milestone_status: f64,
    pub assignee_load: f64,
    pub category_weight: f64,
    pub deadline_proximity: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            conflict_severity: 0.25,
            task_importance: 0.20,
            timeline_urgency: 0.15,
            resource_contention: 0.10,
            dependency_criticality: 0.10,
            milestone_status: 0.10,
            assignee_load: 0.05,
            category_weight: 0.03,
            deadline_proximity: 0.02,
        }
    }
}

/// Scoring thresholds and weights used by the scorer and the classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringTable {
    /// Added to milestone tasks whose priority is at least `milestone_bonus_priority`
    pub milestone_bonus: f64,
    pub milestone_bonus_priority: i32,
    pub tiers: TierThresholds,
    pub levels: LevelThresholds,
    pub weights: FactorWeights,
}

impl Default for ScoringTable {
    fn default() -> Self {
        Self {
            milestone_bonus: 6.0,
            milestone_bonus_priority: 3,
            tiers: TierThresholds::default(),
            levels: LevelThresholds::default(),
            weights: FactorWeights::default(),
        }
    }
}

/// User-supplied layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// First visible day (defaults to the earliest task start)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_start: Option<NaiveDate>,

    /// Last visible day (defaults to the latest task end)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calendar_end: Option<NaiveDate>,

    /// Day treated as "today" by urgency and deadline factors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_date: Option<NaiveDate>,

    pub day_width: f64,
    pub day_height: f64,
    pub max_rows_per_day: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_height: Option<f64>,

    /// Minimum overlap fraction for a pair to be classified as a conflict
    pub overlap_threshold: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_boundary_gap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_spacing: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_task_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_task_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_task_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_task_height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_task_height: Option<f64>,

    /// Intersections up to this many points are not collisions
    pub collision_buffer: f64,

    /// Coordinate grid in points, 0 disables snapping
    pub grid_snap: f64,

    pub alignment: Alignment,
    pub near_deadline_days: i64,

    /// Categories whose bars get the tall content treatment
    pub important_categories: Vec<String>,

    /// Category label to importance value
    pub category_importance: BTreeMap<String, f64>,

    pub scoring: ScoringTable,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            calendar_start: None,
            calendar_end: None,
            reference_date: None,
            day_width: DEFAULT_DAY_WIDTH,
            day_height: DEFAULT_DAY_HEIGHT,
            max_rows_per_day: DEFAULT_MAX_ROWS,
            row_height: None,
            overlap_threshold: 0.0,
            month_boundary_gap: None,
            task_spacing: None,
            base_task_height: None,
            min_task_width: None,
            max_task_width: None,
            min_task_height: None,
            max_task_height: None,
            collision_buffer: DEFAULT_COLLISION_BUFFER,
            grid_snap: 0.0,
            alignment: Alignment::Top,
            near_deadline_days: DEFAULT_NEAR_DEADLINE_DAYS,
            important_categories: vec!["DISSERTATION".to_string(), "PROPOSAL".to_string()],
            category_importance: BTreeMap::new(),
            scoring: ScoringTable::default(),
        }
    }
}

/// Fully resolved configuration for one layout run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub calendar_start: NaiveDate,
    pub calendar_end: NaiveDate,
    pub reference_date: NaiveDate,
    pub day_width: f64,
    pub day_height: f64,
    pub row_height: f64,
    pub max_rows_per_day: usize,
    pub overlap_threshold: f64,
    pub month_boundary_gap: f64,
    pub task_spacing: f64,
    pub base_task_height: f64,
    pub min_task_width: f64,
    pub max_task_width: f64,
    pub min_task_height: f64,
    pub max_task_height: f64,
    pub collision_buffer: f64,
    pub grid_snap: f64,
    pub alignment: Alignment,
    pub near_deadline_days: i64,
    pub important_categories: Vec<String>,
    pub category_importance: BTreeMap<String, f64>,
    pub scoring: ScoringTable,
}

/// Accepts strictly positive finite dimensions
fn dimension(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => default,
    }
}

/// Accepts zero or positive finite tolerances
fn tolerance(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => v,
        _ => default,
    }
}

impl LayoutConfig {
    /// Resolves derived values and fallbacks against the task set
    pub fn resolve(&self, tasks: &[Task]) -> ResolvedConfig {
        let extent_start = tasks.iter().map(|t| t.start).min();
        let extent_end = tasks.iter().map(Task::effective_end).max();

        let calendar_start = self
            .calendar_start
            .or(extent_start)
            .or(self.reference_date)
            .unwrap_or_default();
        let calendar_end = self
            .calendar_end
            .or(extent_end)
            .unwrap_or(calendar_start)
            .max(calendar_start);
        let reference_date = self.reference_date.unwrap_or(calendar_start);

        let day_width = dimension(Some(self.day_width), DEFAULT_DAY_WIDTH);
        let day_height = dimension(Some(self.day_height), DEFAULT_DAY_HEIGHT);
        let max_rows_per_day = if self.max_rows_per_day == 0 {
            DEFAULT_MAX_ROWS
        } else {
            self.max_rows_per_day
        };

        let row_height = dimension(self.row_height, day_height / max_rows_per_day as f64);
        let task_spacing = tolerance(self.task_spacing, row_height * 0.15);
        let base_task_height = dimension(self.base_task_height, row_height * 0.7);
        let min_task_height = dimension(self.min_task_height, row_height * 0.4);
        let max_task_height = dimension(
            self.max_task_height,
            (row_height - task_spacing).max(min_task_height),
        )
        .max(min_task_height);
        let min_task_width = dimension(self.min_task_width, day_width * 0.5);
        let max_task_width = dimension(self.max_task_width, day_width * 31.0).max(min_task_width);

        let defaults = ScoringTable::default();
        let mut scoring = self.scoring.clone();
        if !(scoring.milestone_bonus.is_finite() && scoring.milestone_bonus >= 0.0) {
            scoring.milestone_bonus = defaults.milestone_bonus;
        }

        ResolvedConfig {
            calendar_start,
            calendar_end,
            reference_date,
            day_width,
            day_height,
            row_height,
            max_rows_per_day,
            overlap_threshold: tolerance(Some(self.overlap_threshold), 0.0),
            month_boundary_gap: tolerance(self.month_boundary_gap, day_width * 0.1),
            task_spacing,
            base_task_height,
            min_task_width,
            max_task_width,
            min_task_height,
            max_task_height,
            collision_buffer: tolerance(Some(self.collision_buffer), DEFAULT_COLLISION_BUFFER),
            grid_snap: tolerance(Some(self.grid_snap), 0.0),
            alignment: self.alignment,
            near_deadline_days: self.near_deadline_days.max(0),
            important_categories: self.important_categories.clone(),
            category_importance: self.category_importance.clone(),
            scoring,
        }
    }
}

impl ResolvedConfig {
    /// Number of days from the calendar start to `date` (negative before it)
    pub fn day_offset(&self, date: NaiveDate) -> i64 {
        (date - self.calendar_start).num_days()
    }

    /// Horizontal position of the left edge of `date`'s cell
    pub fn x_for(&self, date: NaiveDate) -> f64 {
        self.day_offset(date) as f64 * self.day_width
    }

    /// Number of days in the visible window, counting both ends
    pub fn window_days(&self) -> i64 {
        self.day_offset(self.calendar_end) + 1
    }

    /// Days from the reference date to `date` (negative in the past)
    pub fn days_from_reference(&self, date: NaiveDate) -> i64 {
        (date - self.reference_date).num_days()
    }

    /// Returns true if `end` falls before the near-deadline horizon
    pub fn is_near_deadline(&self, end: NaiveDate) -> bool {
        self.days_from_reference(end) < self.near_deadline_days
    }

    /// Importance from the category table, if the category is listed
    pub fn category_importance(&self, category: &str) -> Option<f64> {
        self.category_importance.get(category.trim()).copied()
    }

    /// Returns true if bars in this category get the tall content treatment
    pub fn is_important_category(&self, category: &str) -> bool {
        let category = category.trim();
        !category.is_empty() && self.important_categories.iter().any(|c| c == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskId;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn task(id: &str, start: NaiveDate, end: NaiveDate) -> Task {
        Task::new(TaskId::new(id).unwrap(), id, start, end)
    }

    #[test]
    fn default_dimensions() {
        let resolved = LayoutConfig::default().resolve(&[]);
        assert_eq!(resolved.day_width, 20.0);
        assert_eq!(resolved.row_height, 12.0);
        assert!((resolved.task_spacing - 1.8).abs() < 1e-9);
        assert!((resolved.base_task_height - 8.4).abs() < 1e-9);
        assert!((resolved.min_task_height - 4.8).abs() < 1e-9);
        assert!((resolved.max_task_height - 10.2).abs() < 1e-9);
        assert_eq!(resolved.min_task_width, 10.0);
        assert_eq!(resolved.max_task_width, 620.0);
        assert_eq!(resolved.month_boundary_gap, 2.0);
    }

    #[test]
    fn calendar_defaults_to_task_extent() {
        let tasks = [
            task("A", date(1, 5), date(1, 12)),
            task("B", date(1, 8), date(2, 2)),
            task("C", date(3, 1), date(2, 20)),
        ];
        let resolved = LayoutConfig::default().resolve(&tasks);
        assert_eq!(resolved.calendar_start, date(1, 5));
        assert_eq!(resolved.calendar_end, date(3, 1));
        assert_eq!(resolved.reference_date, date(1, 5));
        assert_eq!(resolved.window_days(), 57);
    }

    #[test]
    fn explicit_window_wins() {
        let config = LayoutConfig {
            calendar_start: Some(date(1, 1)),
            calendar_end: Some(date(1, 31)),
            reference_date: Some(date(1, 10)),
            ..LayoutConfig::default()
        };
        let resolved = config.resolve(&[task("A", date(2, 5), date(2, 6))]);
        assert_eq!(resolved.calendar_start, date(1, 1));
        assert_eq!(resolved.calendar_end, date(1, 31));
        assert_eq!(resolved.reference_date, date(1, 10));
    }

    #[test]
    fn invalid_dimensions_fall_back() {
        let config = LayoutConfig {
            day_width: -5.0,
            day_height: 0.0,
            max_rows_per_day: 0,
            collision_buffer: f64::NAN,
            grid_snap: -1.0,
            overlap_threshold: -0.5,
            task_spacing: Some(-1.0),
            ..LayoutConfig::default()
        };
        let resolved = config.resolve(&[]);
        assert_eq!(resolved.day_width, DEFAULT_DAY_WIDTH);
        assert_eq!(resolved.day_height, DEFAULT_DAY_HEIGHT);
        assert_eq!(resolved.max_rows_per_day, DEFAULT_MAX_ROWS);
        assert_eq!(resolved.collision_buffer, DEFAULT_COLLISION_BUFFER);
        assert_eq!(resolved.grid_snap, 0.0);
        assert_eq!(resolved.overlap_threshold, 0.0);
        assert!((resolved.task_spacing - 1.8).abs() < 1e-9);
    }

    #[test]
    fn zero_tolerances_are_kept() {
        let config = LayoutConfig {
            collision_buffer: 0.0,
            month_boundary_gap: Some(0.0),
            ..LayoutConfig::default()
        };
        let resolved = config.resolve(&[]);
        assert_eq!(resolved.collision_buffer, 0.0);
        assert_eq!(resolved.month_boundary_gap, 0.0);
    }

    #[test]
    fn max_bounds_never_below_min() {
        let config = LayoutConfig {
            min_task_width: Some(50.0),
            max_task_width: Some(10.0),
            min_task_height: Some(20.0),
            ..LayoutConfig::default()
        };
        let resolved = config.resolve(&[]);
        assert_eq!(resolved.max_task_width, 50.0);
        assert_eq!(resolved.max_task_height, 20.0);
    }

    #[test]
    fn x_mapping() {
        let resolved = LayoutConfig::default().resolve(&[task("A", date(1, 5), date(1, 9))]);
        assert_eq!(resolved.x_for(date(1, 5)), 0.0);
        assert_eq!(resolved.x_for(date(1, 8)), 60.0);
    }

    #[test]
    fn parse_partial_toml() {
        let toml = r#"
day_width = 30.0
alignment = "center"
calendar_start = "2024-01-01"

[category_importance]
PROPOSAL = 2.0

[scoring.tiers]
critical = 20.0
"#;
        let config: LayoutConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.day_width, 30.0);
        assert_eq!(config.day_height, DEFAULT_DAY_HEIGHT);
        assert_eq!(config.alignment, Alignment::Center);
        assert_eq!(config.calendar_start, Some(date(1, 1)));
        assert_eq!(config.scoring.tiers.critical, 20.0);
        assert_eq!(config.scoring.tiers.high, 10.0);

        let resolved = config.resolve(&[]);
        assert_eq!(resolved.category_importance("PROPOSAL"), Some(2.0));
        assert_eq!(resolved.category_importance("ADMIN"), None);
    }

    #[test]
    fn toml_roundtrip_of_defaults() {
        let config = LayoutConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: LayoutConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn important_categories() {
        let resolved = LayoutConfig::default().resolve(&[]);
        assert!(resolved.is_important_category("PROPOSAL"));
        assert!(!resolved.is_important_category("ADMIN"));
        assert!(!resolved.is_important_category(""));
    }
}
