//! Conflict classification
//!
//! Every overlapping pair is matched against an ordered rule table. The
//! matching rule with the highest priority value decides the category and
//! severity; on a tie the rule listed first wins. Pairs matching no rule
//! become a generic schedule conflict carrying the overlap's own severity.
//!
//! | Priority | Rule | Category | Severity |
//! |----------|------|----------|----------|
//! | 1 | `identical-schedule` | Schedule | Critical |
//! | 2 | `high-priority` | Priority | High |
//! | 3 | `same-assignee` | Assignee | High |
//! | 4 | `same-category` | Category | Medium |
//! | 5 | `milestone` | Milestone | High |
//! | 6 | `near-deadline` | Deadline | High |
//! | 7 | `significant-overlap` | Timeline | Medium |
//! | 8 | `dependency-chain` | Dependency | Critical |
//!
//! Impact, risk, urgency and complexity are additive scores mapped to levels
//! through the thresholds in [`LevelThresholds`].

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::debug;

use super::config::{LevelThresholds, ResolvedConfig};
use super::overlap::{Overlap, OverlapType, Severity};
use crate::domain::{DependencyGraph, Task, TaskId};

/// What kind of contention a conflict represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictCategory {
    Schedule,
    Resource,
    Dependency,
    Priority,
    Category,
    Assignee,
    Timeline,
    Workload,
    Deadline,
    Milestone,
}

impl ConflictCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictCategory::Schedule => "schedule",
            ConflictCategory::Resource => "resource",
            ConflictCategory::Dependency => "dependency",
            ConflictCategory::Priority => "priority",
            ConflictCategory::Category => "category",
            ConflictCategory::Assignee => "assignee",
            ConflictCategory::Timeline => "timeline",
            ConflictCategory::Workload => "workload",
            ConflictCategory::Deadline => "deadline",
            ConflictCategory::Milestone => "milestone",
        }
    }

    fn root_cause(&self) -> &'static str {
        match self {
            ConflictCategory::Schedule => "Tasks scheduled for the same time period",
            ConflictCategory::Resource => "Tasks competing for the same resources",
            ConflictCategory::Dependency => "Tasks linked by a dependency run at the same time",
            ConflictCategory::Priority => "Both tasks have high priority",
            ConflictCategory::Category => "Tasks in the same category compete for attention",
            ConflictCategory::Assignee => "Same person assigned to overlapping tasks",
            ConflictCategory::Timeline => "Tasks have significant timeline overlap",
            ConflictCategory::Workload => "Tasks create excessive workload for the assignee",
            ConflictCategory::Deadline => "Tasks have conflicting deadlines",
            ConflictCategory::Milestone => "A milestone overlaps other work",
        }
    }
}

impl fmt::Display for ConflictCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-step level used for impact, risk, complexity and effort
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    #[default]
    Low,
    Medium,
    High,
}

impl Level {
    fn from_score(score: f64, high: f64, medium: f64) -> Self {
        if score >= high {
            Level::High
        } else if score >= medium {
            Level::Medium
        } else {
            Level::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How soon a conflict needs attention
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    #[default]
    Low,
    Medium,
    High,
    Urgent,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A suggested way to resolve a conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub strategy: String,
    pub description: String,
    pub actions: Vec<String>,

    /// Lower ranks are preferred
    pub rank: u8,

    pub effort: Level,
    pub impact: Level,
}

impl Resolution {
    fn new(
        strategy: &str,
        description: &str,
        actions: &[&str],
        rank: u8,
        effort: Level,
        impact: Level,
    ) -> Self {
        Self {
            strategy: strategy.to_string(),
            description: description.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
            rank,
            effort,
            impact,
        }
    }

    fn primary_for(category: ConflictCategory) -> Self {
        match category {
            ConflictCategory::Schedule => Self::new(
                "Reschedule Tasks",
                "Adjust start or end days to remove the overlap",
                &[
                    "Move one task to a different time slot",
                    "Extend the timeline to fit both tasks",
                    "Consider making one task a subtask",
                ],
                1,
                Level::Medium,
                Level::High,
            ),
            ConflictCategory::Assignee
            | ConflictCategory::Resource
            | ConflictCategory::Workload => Self::new(
                "Reassign Tasks",
                "Assign the tasks to different people",
                &[
                    "Find an alternative assignee for one task",
                    "Split the work among several people",
                    "Rebalance the workload",
                ],
                1,
                Level::High,
                Level::High,
            ),
            ConflictCategory::Priority => Self::new(
                "Priority Adjustment",
                "Adjust task priorities to settle the conflict",
                &[
                    "Lower the priority of one task",
                    "Escalate the priority decision",
                    "Review task dependencies",
                ],
                2,
                Level::Low,
                Level::Medium,
            ),
            ConflictCategory::Dependency => Self::new(
                "Dependency Review",
                "Review and adjust the dependency between the tasks",
                &[
                    "Sequence the dependent task after its dependency",
                    "Remove dependencies that are not needed",
                    "Break the work into smaller steps",
                ],
                1,
                Level::High,
                Level::High,
            ),
            ConflictCategory::Deadline | ConflictCategory::Milestone => Self::new(
                "Deadline Review",
                "Confirm which deadline takes precedence",
                &[
                    "Finish the earlier deadline first",
                    "Negotiate a later date for one task",
                    "Reduce the scope of one task",
                ],
                2,
                Level::Medium,
                Level::High,
            ),
            ConflictCategory::Category | ConflictCategory::Timeline => Self::new(
                "Generic Resolution",
                "Apply the standard conflict resolution approach",
                &[
                    "Review task requirements",
                    "Adjust schedules",
                    "Escalate if necessary",
                ],
                3,
                Level::Medium,
                Level::Medium,
            ),
        }
    }

    fn alternatives_for(category: ConflictCategory) -> Vec<Self> {
        let mut alternatives = Vec::with_capacity(3);
        if category != ConflictCategory::Dependency {
            alternatives.push(Self::new(
                "Task Merging",
                "Combine the overlapping tasks into one task",
                &["Merge task requirements", "Combine timelines", "Update dependencies"],
                2,
                Level::High,
                Level::High,
            ));
        }
        alternatives.push(Self::new(
            "Timeline Extension",
            "Extend the timeline to fit both tasks",
            &["Adjust deadlines", "Update dependencies", "Communicate changes"],
            3,
            Level::Medium,
            Level::Medium,
        ));
        alternatives.push(Self::new(
            "Resource Addition",
            "Add resources to handle both tasks",
            &["Bring in additional people", "Reallocate resources", "Outsource work"],
            4,
            Level::High,
            Level::Low,
        ));
        alternatives
    }
}

/// Everything a rule predicate may inspect
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub first: &'a Task,
    pub second: &'a Task,
    pub overlap: &'a Overlap,
    pub graph: &'a DependencyGraph,
    pub config: &'a ResolvedConfig,
}

impl RuleInput<'_> {
    /// Returns true if a dependency edge joins the two tasks
    pub fn linked(&self) -> bool {
        self.graph.linked(&self.first.id, &self.second.id)
    }

    fn either(&self, f: impl Fn(&Task) -> bool) -> bool {
        f(self.first) || f(self.second)
    }
}

pub type RulePredicate = fn(&RuleInput<'_>) -> bool;

/// One entry of the classification table
#[derive(Clone)]
pub struct ConflictRule {
    pub name: String,
    pub priority: u32,
    pub predicate: RulePredicate,
    pub category: ConflictCategory,
    pub severity: Severity,
}

impl fmt::Debug for ConflictRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConflictRule")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("category", &self.category)
            .field("severity", &self.severity)
            .finish_non_exhaustive()
    }
}

impl ConflictRule {
    pub fn new(
        name: impl Into<String>,
        priority: u32,
        predicate: RulePredicate,
        category: ConflictCategory,
        severity: Severity,
    ) -> Self {
        Self {
            name: name.into(),
            priority,
            predicate,
            category,
            severity,
        }
    }

    pub fn matches(&self, input: &RuleInput<'_>) -> bool {
        (self.predicate)(input)
    }
}

fn default_rules() -> Vec<ConflictRule> {
    vec![
        ConflictRule::new(
            "identical-schedule",
            1,
            |i| i.overlap.kind == OverlapType::Identical,
            ConflictCategory::Schedule,
            Severity::Critical,
        ),
        ConflictRule::new(
            "high-priority",
            2,
            |i| i.first.priority >= 3 && i.second.priority >= 3,
            ConflictCategory::Priority,
            Severity::High,
        ),
        ConflictRule::new(
            "same-assignee",
            3,
            |i| i.first.shares_assignee(i.second),
            ConflictCategory::Assignee,
            Severity::High,
        ),
        ConflictRule::new(
            "same-category",
            4,
            |i| i.first.shares_category(i.second),
            ConflictCategory::Category,
            Severity::Medium,
        ),
        ConflictRule::new(
            "milestone",
            5,
            |i| i.either(|t| t.milestone),
            ConflictCategory::Milestone,
            Severity::High,
        ),
        ConflictRule::new(
            "near-deadline",
            6,
            |i| {
                i.either(|t| i.config.is_near_deadline(t.effective_end()))
                    && i.either(|t| t.priority >= 2)
            },
            ConflictCategory::Deadline,
            Severity::High,
        ),
        ConflictRule::new(
            "significant-overlap",
            7,
            |i| i.overlap.fraction >= 0.7,
            ConflictCategory::Timeline,
            Severity::Medium,
        ),
        ConflictRule::new(
            "dependency-chain",
            8,
            |i| i.linked(),
            ConflictCategory::Dependency,
            Severity::Critical,
        ),
    ]
}

/// A classified overlap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedConflict {
    pub overlap: Overlap,
    pub category: ConflictCategory,

    /// Name of the matching rule, `generic-schedule` when none matched
    pub rule: String,

    pub severity: Severity,
    pub subcategory: String,
    pub root_cause: String,
    pub impact: Level,
    pub risk: Level,
    pub urgency: Urgency,
    pub complexity: Level,
    pub resolution: Resolution,
    pub alternatives: Vec<Resolution>,
}

impl CategorizedConflict {
    pub fn involves(&self, task_id: &TaskId) -> bool {
        self.overlap.involves(task_id)
    }
}

fn severity_weight(severity: Severity) -> i64 {
    match severity {
        Severity::Critical => 5,
        Severity::High => 4,
        Severity::Medium => 3,
        Severity::Low => 2,
        Severity::None => 1,
    }
}

fn subcategory(overlap: &Overlap) -> &'static str {
    match overlap.kind {
        OverlapType::Identical => "Identical schedules",
        OverlapType::Nested => "Nested tasks",
        OverlapType::Complete => "Complete overlap",
        OverlapType::Partial if overlap.fraction >= 0.8 => "High overlap",
        OverlapType::Partial if overlap.fraction >= 0.5 => "Medium overlap",
        OverlapType::Partial => "Low overlap",
        OverlapType::Adjacent => "Adjacent tasks",
    }
}

fn assess_impact(input: &RuleInput<'_>, levels: &LevelThresholds) -> Level {
    let (a, b) = (input.first, input.second);
    let mut score = severity_weight(input.overlap.severity);
    score += i64::from(a.priority) + i64::from(b.priority);
    score += match input.overlap.span_days {
        d if d > 7 => 2,
        d if d > 3 => 1,
        _ => 0,
    };
    if a.shares_assignee(b) {
        score += 3;
    }
    if a.shares_category(b) {
        score += 1;
    }
    if input.either(|t| t.milestone) {
        score += 2;
    }
    Level::from_score(score as f64, levels.impact_high, levels.impact_medium)
}

fn assess_risk(input: &RuleInput<'_>, levels: &LevelThresholds) -> Level {
    let mut score = severity_weight(input.overlap.severity);
    if input.either(|t| input.config.is_near_deadline(t.effective_end())) {
        score += 3;
    }
    if input.either(|t| t.priority >= 4) {
        score += 2;
    }
    if input.either(|t| t.milestone) {
        score += 2;
    }
    if input.either(|t| !t.dependencies.is_empty()) {
        score += 1;
    }
    Level::from_score(score as f64, levels.risk_high, levels.risk_medium)
}

fn assess_urgency(input: &RuleInput<'_>, levels: &LevelThresholds) -> Urgency {
    let (a, b) = (input.first, input.second);
    let mut score = severity_weight(input.overlap.severity);
    score += match input.config.days_from_reference(a.start.min(b.start)) {
        d if d <= 3 => 3,
        d if d <= 7 => 2,
        d if d <= 14 => 1,
        _ => 0,
    };
    score += i64::from(a.priority) + i64::from(b.priority);

    let score = score as f64;
    if score >= levels.urgency_urgent {
        Urgency::Urgent
    } else if score >= levels.urgency_high {
        Urgency::High
    } else if score >= levels.urgency_medium {
        Urgency::Medium
    } else {
        Urgency::Low
    }
}

fn assess_complexity(input: &RuleInput<'_>, levels: &LevelThresholds) -> Level {
    let (a, b) = (input.first, input.second);
    let mut score: i64 = match input.overlap.kind {
        OverlapType::Identical => 3,
        OverlapType::Nested | OverlapType::Complete => 2,
        OverlapType::Partial | OverlapType::Adjacent => 1,
    };
    score += (a.dependencies.len() + b.dependencies.len()) as i64;
    if a.shares_assignee(b) {
        score += 2;
    }
    if a.shares_category(b) {
        score += 1;
    }
    Level::from_score(score as f64, levels.complexity_high, levels.complexity_medium)
}

/// Rule table that turns overlaps into categorized conflicts
#[derive(Debug, Clone)]
pub struct ConflictClassifier {
    rules: Vec<ConflictRule>,
}

impl Default for ConflictClassifier {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl ConflictClassifier {
    /// Creates a classifier with the default rule table
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule to the table
    pub fn with_rule(mut self, rule: ConflictRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[ConflictRule] {
        &self.rules
    }

    /// Highest-priority matching rule, first listed on ties
    fn best_rule(&self, input: &RuleInput<'_>) -> Option<&ConflictRule> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(input))
            .fold(None, |best: Option<&ConflictRule>, rule| match best {
                Some(b) if b.priority >= rule.priority => Some(b),
                _ => Some(rule),
            })
    }

    /// Classifies one overlap between two tasks of `tasks`
    pub fn classify(
        &self,
        overlap: &Overlap,
        tasks: &[Task],
        graph: &DependencyGraph,
        config: &ResolvedConfig,
    ) -> CategorizedConflict {
        let input = RuleInput {
            first: &tasks[overlap.first_index],
            second: &tasks[overlap.second_index],
            overlap,
            graph,
            config,
        };

        let (category, rule, severity) = match self.best_rule(&input) {
            Some(rule) => (rule.category, rule.name.clone(), rule.severity),
            None => (
                ConflictCategory::Schedule,
                "generic-schedule".to_string(),
                overlap.severity,
            ),
        };

        let levels = &config.scoring.levels;
        CategorizedConflict {
            overlap: overlap.clone(),
            category,
            rule,
            severity,
            subcategory: subcategory(overlap).to_string(),
            root_cause: category.root_cause().to_string(),
            impact: assess_impact(&input, levels),
            risk: assess_risk(&input, levels),
            urgency: assess_urgency(&input, levels),
            complexity: assess_complexity(&input, levels),
            resolution: Resolution::primary_for(category),
            alternatives: Resolution::alternatives_for(category),
        }
    }

    /// Classifies every overlap at or above the configured threshold
    pub fn classify_all(
        &self,
        overlaps: &[Overlap],
        tasks: &[Task],
        graph: &DependencyGraph,
        config: &ResolvedConfig,
    ) -> Vec<CategorizedConflict> {
        let conflicts: Vec<_> = overlaps
            .iter()
            .filter(|o| o.fraction >= config.overlap_threshold)
            .map(|o| self.classify(o, tasks, graph, config))
            .collect();
        debug!(
            overlaps = overlaps.len(),
            conflicts = conflicts.len(),
            "Classified conflicts"
        );
        conflicts
    }
}

/// Conflict counts by category and severity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConflictSummary {
    pub total: usize,
    pub by_category: BTreeMap<ConflictCategory, usize>,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_risk: BTreeMap<Level, usize>,
}

impl ConflictSummary {
    pub fn from_conflicts(conflicts: &[CategorizedConflict]) -> Self {
        let mut summary = Self {
            total: conflicts.len(),
            ..Self::default()
        };
        for conflict in conflicts {
            *summary.by_category.entry(conflict.category).or_default() += 1;
            *summary.by_severity.entry(conflict.severity).or_default() += 1;
            *summary.by_risk.entry(conflict.risk).or_default() += 1;
        }
        summary
    }

    /// One-line overall risk statement
    pub fn risk_assessment(&self) -> String {
        let count = |level| self.by_risk.get(&level).copied().unwrap_or(0);
        match (count(Level::High), count(Level::Medium), count(Level::Low)) {
            (high, _, _) if high > 0 => {
                format!("High risk: {high} conflicts require immediate attention")
            }
            (_, medium, _) if medium > 0 => {
                format!("Medium risk: {medium} conflicts need resolution")
            }
            (_, _, low) if low > 0 => {
                format!("Low risk: {low} conflicts can be handled during planning")
            }
            _ => "No risk: no conflicts detected".to_string(),
        }
    }
}
