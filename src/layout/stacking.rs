//! Stacking actions
//!
//! Every task gets one stacking action that shapes how its bars are drawn.
//! Rules are tried in ascending priority order and the first match wins;
//! rules with equal priority keep their listed order. A task matching no
//! rule gets the default action.
//!
//! | Priority | Rule | Kind | Height | Z | Avoids collisions |
//! |----------|------|------|--------|---|-------------------|
//! | 1 | `critical` | Layered | 1.0 | 10 | yes |
//! | 2 | `high-priority` | Vertical | 0.9 | 8 | yes |
//! | 3 | `milestone` | Floating | 1.0 | 9 | yes |
//! | 4 | `long-task` | Horizontal | 1.0 | 5 | no |
//! | 5 | `short-task` | Vertical | 1.0 | 3 | no |
//! | 6 | `conflicted` | Cascading | 0.8 | 7 | yes |
//! | 7 | `overflow` | Minimized | 0.5 | 1 | no |
//! | - | `default` | Vertical | 1.0 | 2 | no |
//!
//! Height is a factor on the tier height; the result stays inside the
//! configured task height bounds. Cascading bars shift by
//! [`CASCADE_OFFSET`]. X stays on the day grid, so the horizontal offset is
//! reported on the bar but never moves it.

use std::fmt;

use serde::Serialize;

use super::config::ResolvedConfig;
use super::priority::Tier;
use crate::domain::Task;

/// Shift applied to cascading bars, in points
pub const CASCADE_OFFSET: f64 = 5.0;

/// How a bar is stacked against its neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StackingType {
    Vertical,
    Horizontal,
    Layered,
    Cascading,
    Floating,
    Minimized,
}

impl StackingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackingType::Vertical => "vertical",
            StackingType::Horizontal => "horizontal",
            StackingType::Layered => "layered",
            StackingType::Cascading => "cascading",
            StackingType::Floating => "floating",
            StackingType::Minimized => "minimized",
        }
    }
}

impl fmt::Display for StackingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The drawing decision for one task
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackingAction {
    /// Name of the rule that produced it
    pub rule: String,

    pub kind: StackingType,
    pub height_scale: f64,
    pub vertical_offset: f64,
    pub horizontal_offset: f64,
    pub z_index: i32,
    pub collision_avoidance: bool,
}

impl Default for StackingAction {
    fn default() -> Self {
        Self {
            rule: "default".to_string(),
            kind: StackingType::Vertical,
            height_scale: 1.0,
            vertical_offset: 0.0,
            horizontal_offset: 0.0,
            z_index: 2,
            collision_avoidance: false,
        }
    }
}

/// Everything a stacking condition may inspect
#[derive(Debug, Clone, Copy)]
pub struct StackingInput<'a> {
    pub task: &'a Task,
    pub tier: Tier,

    /// Conflicts involving the task
    pub conflicts: usize,

    /// The task did not fit under the row cap
    pub row_overflow: bool,

    pub config: &'a ResolvedConfig,
}

pub type StackingCondition = fn(&StackingInput<'_>) -> bool;

/// One entry of the stacking table
#[derive(Clone)]
pub struct StackingRule {
    pub name: String,
    pub priority: u32,
    pub condition: StackingCondition,
    pub kind: StackingType,
    pub height_scale: f64,
    pub vertical_offset: f64,
    pub horizontal_offset: f64,
    pub z_index: i32,
    pub collision_avoidance: bool,
}

impl fmt::Debug for StackingRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackingRule")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("kind", &self.kind)
            .field("z_index", &self.z_index)
            .finish_non_exhaustive()
    }
}

impl StackingRule {
    /// A rule with full height, no offset and no collision avoidance
    pub fn new(
        name: impl Into<String>,
        priority: u32,
        condition: StackingCondition,
        kind: StackingType,
        z_index: i32,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            condition,
            kind,
            height_scale: 1.0,
            vertical_offset: 0.0,
            horizontal_offset: 0.0,
            z_index,
            collision_avoidance: false,
        }
    }

    pub fn with_height_scale(mut self, scale: f64) -> Self {
        self.height_scale = scale;
        self
    }

    pub fn with_offset(mut self, vertical: f64, horizontal: f64) -> Self {
        self.vertical_offset = vertical;
        self.horizontal_offset = horizontal;
        self
    }

    pub fn avoiding_collisions(mut self) -> Self {
        self.collision_avoidance = true;
        self
    }

    pub fn matches(&self, input: &StackingInput<'_>) -> bool {
        (self.condition)(input)
    }

    pub fn action(&self) -> StackingAction {
        StackingAction {
            rule: self.name.clone(),
            kind: self.kind,
            height_scale: self.height_scale,
            vertical_offset: self.vertical_offset,
            horizontal_offset: self.horizontal_offset,
            z_index: self.z_index,
            collision_avoidance: self.collision_avoidance,
        }
    }
}

fn default_rules() -> Vec<StackingRule> {
    vec![
        StackingRule::new(
            "critical",
            1,
            |i| i.tier == Tier::Critical,
            StackingType::Layered,
            10,
        )
        .avoiding_collisions(),
        StackingRule::new(
            "high-priority",
            2,
            |i| i.tier == Tier::High,
            StackingType::Vertical,
            8,
        )
        .with_height_scale(0.9)
        .avoiding_collisions(),
        StackingRule::new(
            "milestone",
            3,
            |i| i.task.milestone,
            StackingType::Floating,
            9,
        )
        .avoiding_collisions(),
        StackingRule::new(
            "long-task",
            4,
            |i| i.task.duration_days() > 7,
            StackingType::Horizontal,
            5,
        ),
        StackingRule::new(
            "short-task",
            5,
            |i| i.task.duration_days() <= 1,
            StackingType::Vertical,
            3,
        ),
        StackingRule::new(
            "conflicted",
            6,
            |i| i.conflicts > 0,
            StackingType::Cascading,
            7,
        )
        .with_height_scale(0.8)
        .with_offset(CASCADE_OFFSET, CASCADE_OFFSET)
        .avoiding_collisions(),
        StackingRule::new(
            "overflow",
            7,
            |i| i.row_overflow,
            StackingType::Minimized,
            1,
        )
        .with_height_scale(0.5),
    ]
}

/// Rule table that picks a stacking action per task
#[derive(Debug, Clone)]
pub struct StackingSelector {
    rules: Vec<StackingRule>,
}

impl Default for StackingSelector {
    fn default() -> Self {
        Self::from_rules(default_rules())
    }
}

impl StackingSelector {
    /// Creates a selector with the default rule table
    pub fn new() -> Self {
        Self::default()
    }

    fn from_rules(mut rules: Vec<StackingRule>) -> Self {
        rules.sort_by_key(|r| r.priority);
        Self { rules }
    }

    /// Adds a rule, keeping the table in priority order
    pub fn with_rule(mut self, rule: StackingRule) -> Self {
        // After existing rules of the same priority
        let at = self.rules.partition_point(|r| r.priority <= rule.priority);
        self.rules.insert(at, rule);
        self
    }

    pub fn rules(&self) -> &[StackingRule] {
        &self.rules
    }

    /// First matching rule's action, or the default action
    pub fn select(&self, input: &StackingInput<'_>) -> StackingAction {
        self.rules
            .iter()
            .find(|rule| rule.matches(input))
            .map(StackingRule::action)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskId;
    use crate::layout::config::LayoutConfig;
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn task(id: &str, start: NaiveDate, end: NaiveDate) -> Task {
        Task::new(TaskId::new(id).unwrap(), id, start, end)
    }

    fn select(
        selector: &StackingSelector,
        task: &Task,
        tier: Tier,
        conflicts: usize,
        row_overflow: bool,
    ) -> StackingAction {
        let config = LayoutConfig::default().resolve(std::slice::from_ref(task));
        selector.select(&StackingInput {
            task,
            tier,
            conflicts,
            row_overflow,
            config: &config,
        })
    }

    #[test]
    fn table_is_in_priority_order() {
        let selector = StackingSelector::new();
        let names: Vec<_> = selector.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "critical",
                "high-priority",
                "milestone",
                "long-task",
                "short-task",
                "conflicted",
                "overflow"
            ]
        );
    }

    #[test]
    fn lowest_priority_number_matches_first() {
        let selector = StackingSelector::new();
        let milestone = task("M", date(1, 1), date(1, 1)).as_milestone();

        // Critical beats milestone and short-task
        let action = select(&selector, &milestone, Tier::Critical, 2, true);
        assert_eq!(action.kind, StackingType::Layered);
        assert_eq!(action.z_index, 10);

        // Milestone beats short-task
        let action = select(&selector, &milestone, Tier::Low, 0, false);
        assert_eq!(action.kind, StackingType::Floating);
        assert_eq!(action.rule, "milestone");
    }

    #[test]
    fn duration_rules_outrank_conflicts() {
        let selector = StackingSelector::new();

        let long = task("L", date(1, 1), date(1, 12));
        let action = select(&selector, &long, Tier::Medium, 3, false);
        assert_eq!(action.kind, StackingType::Horizontal);

        let medium = task("C", date(1, 1), date(1, 4));
        let action = select(&selector, &medium, Tier::Medium, 3, true);
        assert_eq!(action.kind, StackingType::Cascading);
        assert_eq!(action.vertical_offset, CASCADE_OFFSET);
        assert_eq!(action.horizontal_offset, CASCADE_OFFSET);
        assert_eq!(action.height_scale, 0.8);
        assert!(action.collision_avoidance);
    }

    #[test]
    fn overflow_and_default() {
        let selector = StackingSelector::new();
        let medium = task("O", date(1, 1), date(1, 4));

        let action = select(&selector, &medium, Tier::Low, 0, true);
        assert_eq!(action.kind, StackingType::Minimized);
        assert_eq!(action.height_scale, 0.5);

        let action = select(&selector, &medium, Tier::Low, 0, false);
        assert_eq!(action, StackingAction::default());
    }

    #[test]
    fn added_rule_takes_its_priority_slot() {
        let selector = StackingSelector::new()
            .with_rule(StackingRule::new(
                "pinned",
                0,
                |i| i.task.category == "PINNED",
                StackingType::Floating,
                20,
            ))
            .with_rule(StackingRule::new(
                "late-critical",
                1,
                |_| true,
                StackingType::Horizontal,
                0,
            ));
        assert_eq!(selector.rules()[0].name, "pinned");
        // Equal priority keeps the built-in rule ahead
        assert_eq!(selector.rules()[1].name, "critical");
        assert_eq!(selector.rules()[2].name, "late-critical");

        let pinned = task("P", date(1, 1), date(1, 4)).with_category("PINNED");
        let action = select(&selector, &pinned, Tier::Critical, 0, false);
        assert_eq!(action.rule, "pinned");

        let critical = task("X", date(1, 1), date(1, 4));
        let action = select(&selector, &critical, Tier::Critical, 0, false);
        assert_eq!(action.rule, "critical");

        let plain = task("Y", date(1, 1), date(1, 4));
        let action = select(&selector, &plain, Tier::Low, 0, false);
        assert_eq!(action.rule, "late-critical");
    }
}
