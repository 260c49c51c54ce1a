//! Priority scoring
//!
//! Each task gets a weighted multi-factor score that decides its prominence
//! tier, and through the tier its visual style, bar height and stacking
//! order.
//!
//! | Factor | Default weight |
//! |--------|----------------|
//! | Conflict severity | 0.25 |
//! | Task importance | 0.20 |
//! | Timeline urgency | 0.15 |
//! | Resource contention | 0.10 |
//! | Dependency criticality | 0.10 |
//! | Milestone status | 0.10 |
//! | Assignee load | 0.05 |
//! | Category weight | 0.03 |
//! | Deadline proximity | 0.02 |
//!
//! The overall score is the weighted mean of the factors. Milestones with a
//! high enough priority get a flat bonus on top.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::config::{FactorWeights, ResolvedConfig, TierThresholds};
use super::conflict::{CategorizedConflict, ConflictCategory, Level};
use super::overlap::Severity;
use crate::domain::{Task, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityFactor {
    ConflictSeverity,
    TaskImportance,
    TimelineUrgency,
    ResourceContention,
    DependencyCriticality,
    MilestoneStatus,
    AssigneeLoad,
    CategoryWeight,
    DeadlineProximity,
}

impl PriorityFactor {
    pub const ALL: [PriorityFactor; 9] = [
        PriorityFactor::ConflictSeverity,
        PriorityFactor::TaskImportance,
        PriorityFactor::TimelineUrgency,
        PriorityFactor::ResourceContention,
        PriorityFactor::DependencyCriticality,
        PriorityFactor::MilestoneStatus,
        PriorityFactor::AssigneeLoad,
        PriorityFactor::CategoryWeight,
        PriorityFactor::DeadlineProximity,
    ];

    pub fn weight(&self, weights: &FactorWeights) -> f64 {
        match self {
            PriorityFactor::ConflictSeverity => weights.conflict_severity,
            PriorityFactor::TaskImportance => weights.task_importance,
            PriorityFactor::TimelineUrgency => weights.timeline_urgency,
            PriorityFactor::ResourceContention => weights.resource_contention,
            PriorityFactor::DependencyCriticality => weights.dependency_criticality,
            PriorityFactor::MilestoneStatus => weights.milestone_status,
            PriorityFactor::AssigneeLoad => weights.assignee_load,
            PriorityFactor::CategoryWeight => weights.category_weight,
            PriorityFactor::DeadlineProximity => weights.deadline_proximity,
        }
    }
}

/// Visual prominence of a bar
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl Tier {
    pub fn from_score(score: f64, tiers: &TierThresholds) -> Self {
        if score >= tiers.critical {
            Tier::Critical
        } else if score >= tiers.high {
            Tier::High
        } else if score >= tiers.medium {
            Tier::Medium
        } else if score >= tiers.low {
            Tier::Low
        } else {
            Tier::Minimal
        }
    }

    /// Bar height multiplier
    pub fn height_multiplier(&self) -> f64 {
        match self {
            Tier::Critical => 1.5,
            Tier::High => 1.3,
            Tier::Medium => 1.0,
            Tier::Low => 0.8,
            Tier::Minimal => 0.6,
        }
    }

    pub fn style(&self) -> VisualStyle {
        let base = VisualStyle {
            border_color: String::new(),
            fill_color: String::new(),
            border_width: 1.0,
            opacity: 1.0,
            font_weight: "normal".to_string(),
            z_index: 1,
            highlight: false,
            pulse: false,
            glow: false,
            blink: false,
        };
        match self {
            Tier::Critical => VisualStyle {
                border_color: "red".to_string(),
                fill_color: "red!20".to_string(),
                border_width: 3.0,
                font_weight: "bold".to_string(),
                z_index: 10,
                highlight: true,
                blink: true,
                glow: true,
                ..base
            },
            Tier::High => VisualStyle {
                border_color: "orange".to_string(),
                fill_color: "orange!15".to_string(),
                border_width: 2.0,
                font_weight: "bold".to_string(),
                z_index: 8,
                highlight: true,
                pulse: true,
                ..base
            },
            Tier::Medium => VisualStyle {
                border_color: "yellow".to_string(),
                fill_color: "yellow!10".to_string(),
                border_width: 1.5,
                font_weight: "semibold".to_string(),
                z_index: 6,
                highlight: true,
                ..base
            },
            Tier::Low => VisualStyle {
                border_color: "blue".to_string(),
                fill_color: "blue!5".to_string(),
                border_width: 1.0,
                z_index: 4,
                ..base
            },
            Tier::Minimal => VisualStyle {
                border_color: "gray".to_string(),
                fill_color: "gray!5".to_string(),
                border_width: 0.5,
                opacity: 0.7,
                z_index: 2,
                ..base
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Critical => "critical",
            Tier::High => "high",
            Tier::Medium => "medium",
            Tier::Low => "low",
            Tier::Minimal => "minimal",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drawing attributes derived from the tier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualStyle {
    pub border_color: String,
    pub fill_color: String,
    /// Points
    pub border_width: f64,
    pub opacity: f64,
    pub font_weight: String,
    pub z_index: i32,
    pub highlight: bool,
    pub pulse: bool,
    pub glow: bool,
    pub blink: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactorScore {
    pub factor: PriorityFactor,
    pub value: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityScore {
    pub task: TaskId,
    pub score: f64,

    /// 1 for the highest score
    pub rank: usize,

    pub tier: Tier,
    pub factors: Vec<FactorScore>,
    pub style: VisualStyle,
}

/// Inputs to scoring one task besides the task itself
#[derive(Debug, Clone)]
pub struct PriorityContext<'a> {
    pub config: &'a ResolvedConfig,

    /// Conflicts involving the task
    pub conflicts: Vec<&'a CategorizedConflict>,

    /// Number of tasks sharing the task's assignee, including itself
    pub assignee_workload: usize,

    /// Number of tasks that depend on the task
    pub dependents: usize,
}

/// Step function over a day count: the first threshold `d` with `days <= d` wins
fn by_days(days: i64, steps: &[(i64, f64)]) -> f64 {
    steps
        .iter()
        .find(|(limit, _)| days <= *limit)
        .map(|(_, value)| *value)
        .unwrap_or(0.0)
}

fn conflict_severity(task: &Task, ctx: &PriorityContext<'_>) -> f64 {
    let mut score = f64::from(task.priority) * 0.2;
    for conflict in &ctx.conflicts {
        score += match conflict.severity {
            Severity::Critical => 10.0,
            Severity::High => 7.0,
            Severity::Medium => 4.0,
            Severity::Low => 2.0,
            Severity::None => 0.0,
        };
        score += match conflict.impact {
            Level::High => 3.0,
            Level::Medium => 1.5,
            Level::Low => 0.0,
        };
        score += match conflict.risk {
            Level::High => 5.0,
            Level::Medium => 2.0,
            Level::Low => 0.5,
        };
    }
    score
}

fn task_importance(task: &Task, ctx: &PriorityContext<'_>) -> f64 {
    let mut score = f64::from(task.priority) * 2.0;
    score += ctx
        .config
        .category_importance(&task.category)
        .map(|v| v * 3.0)
        .unwrap_or(1.0);
    if task.milestone {
        score += 10.0;
    }
    score += match task.duration_days() {
        d if d > 30 => 3.0,
        d if d > 7 => 2.0,
        d if d > 1 => 1.0,
        _ => 0.0,
    };
    score
}

fn timeline_urgency(task: &Task, ctx: &PriorityContext<'_>) -> f64 {
    let until_start = ctx.config.days_from_reference(task.start);
    let until_end = ctx.config.days_from_reference(task.effective_end());
    by_days(until_start, &[(0, 10.0), (1, 8.0), (3, 6.0), (7, 4.0), (14, 2.0)])
        + by_days(until_end, &[(0, 15.0), (1, 12.0), (3, 8.0), (7, 5.0), (14, 3.0)])
}

fn resource_contention(task: &Task, ctx: &PriorityContext<'_>) -> f64 {
    let mut score = 0.0;
    if task.assignee_name().is_some() {
        score += ctx.assignee_workload as f64 * 0.5;
    }
    for conflict in &ctx.conflicts {
        score += match conflict.category {
            ConflictCategory::Assignee => 5.0,
            ConflictCategory::Resource => 3.0,
            _ => 0.0,
        };
    }
    score
}

fn dependency_criticality(task: &Task, ctx: &PriorityContext<'_>) -> f64 {
    let links = ctx
        .conflicts
        .iter()
        .filter(|c| c.category == ConflictCategory::Dependency)
        .count();
    task.dependencies.len() as f64 + ctx.dependents as f64 * 3.0 + links as f64 * 8.0
}

fn milestone_status(task: &Task, ctx: &PriorityContext<'_>) -> f64 {
    if !task.milestone {
        return 0.0;
    }
    let mut score = 15.0;
    if task.priority >= 4 {
        score += 5.0;
    }
    let until_end = ctx.config.days_from_reference(task.effective_end());
    score + by_days(until_end, &[(7, 10.0), (30, 5.0)])
}

fn assignee_load(task: &Task, ctx: &PriorityContext<'_>) -> f64 {
    if task.assignee_name().is_none() {
        return 0.0;
    }
    2.0 + match ctx.assignee_workload {
        3..=6 => 3.0,
        w if w > 6 => 1.0,
        _ => 0.0,
    }
}

fn category_weight(task: &Task, ctx: &PriorityContext<'_>) -> f64 {
    ctx.config.category_importance(&task.category).unwrap_or(0.5)
}

fn deadline_proximity(task: &Task, ctx: &PriorityContext<'_>) -> f64 {
    let until_end = ctx.config.days_from_reference(task.effective_end());
    by_days(
        until_end,
        &[(0, 15.0), (1, 12.0), (3, 8.0), (7, 5.0), (14, 3.0), (30, 1.0)],
    )
}

fn factor_value(factor: PriorityFactor, task: &Task, ctx: &PriorityContext<'_>) -> f64 {
    match factor {
        PriorityFactor::ConflictSeverity => conflict_severity(task, ctx),
        PriorityFactor::TaskImportance => task_importance(task, ctx),
        PriorityFactor::TimelineUrgency => timeline_urgency(task, ctx),
        PriorityFactor::ResourceContention => resource_contention(task, ctx),
        PriorityFactor::DependencyCriticality => dependency_criticality(task, ctx),
        PriorityFactor::MilestoneStatus => milestone_status(task, ctx),
        PriorityFactor::AssigneeLoad => assignee_load(task, ctx),
        PriorityFactor::CategoryWeight => category_weight(task, ctx),
        PriorityFactor::DeadlineProximity => deadline_proximity(task, ctx),
    }
}

/// Scores one task. The returned rank is 0 until [`rank_scores`] runs.
pub fn score_task(task: &Task, ctx: &PriorityContext<'_>) -> PriorityScore {
    let scoring = &ctx.config.scoring;

    let factors: Vec<FactorScore> = PriorityFactor::ALL
        .iter()
        .map(|&factor| {
            let value = factor_value(factor, task, ctx);
            let weight = factor.weight(&scoring.weights).max(0.0);
            FactorScore {
                factor,
                value,
                weight,
                contribution: value * weight,
            }
        })
        .collect();

    let total_weight: f64 = factors.iter().map(|f| f.weight).sum();
    let weighted: f64 = factors.iter().map(|f| f.contribution).sum();
    let mut score = if total_weight > 0.0 {
        weighted / total_weight
    } else {
        0.0
    };

    if task.milestone && task.priority >= scoring.milestone_bonus_priority {
        score += scoring.milestone_bonus;
    }

    let tier = Tier::from_score(score, &scoring.tiers);
    PriorityScore {
        task: task.id.clone(),
        score,
        rank: 0,
        tier,
        factors,
        style: tier.style(),
    }
}

/// Builds the per-task contexts and scores every task, in input order
pub fn score_tasks(
    tasks: &[Task],
    conflicts: &[CategorizedConflict],
    dependents: impl Fn(&TaskId) -> usize,
    config: &ResolvedConfig,
) -> Vec<PriorityScore> {
    let mut workloads: BTreeMap<&str, usize> = BTreeMap::new();
    for task in tasks {
        if let Some(name) = task.assignee_name() {
            *workloads.entry(name).or_default() += 1;
        }
    }

    let mut scores: Vec<PriorityScore> = tasks
        .iter()
        .map(|task| {
            let ctx = PriorityContext {
                config,
                conflicts: conflicts.iter().filter(|c| c.involves(&task.id)).collect(),
                assignee_workload: task
                    .assignee_name()
                    .and_then(|name| workloads.get(name).copied())
                    .unwrap_or(0),
                dependents: dependents(&task.id),
            };
            score_task(task, &ctx)
        })
        .collect();

    rank_scores(&mut scores);
    scores
}

/// Assigns ranks by descending score, input order breaking ties
pub fn rank_scores(scores: &mut [PriorityScore]) {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].score.total_cmp(&scores[a].score).then(a.cmp(&b)));
    for (rank, index) in order.into_iter().enumerate() {
        scores[index].rank = rank + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::config::LayoutConfig;
    use chrono::NaiveDate;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn task(id: &str, start: NaiveDate, end: NaiveDate) -> Task {
        Task::new(TaskId::new(id).unwrap(), id, start, end)
    }

    fn context(config: &ResolvedConfig) -> PriorityContext<'_> {
        PriorityContext {
            config,
            conflicts: vec![],
            assignee_workload: 0,
            dependents: 0,
        }
    }

    fn factor(score: &PriorityScore, factor: PriorityFactor) -> f64 {
        score
            .factors
            .iter()
            .find(|f| f.factor == factor)
            .map(|f| f.value)
            .unwrap()
    }

    #[test]
    fn default_weights_sum_to_one() {
        let weights = FactorWeights::default();
        let total: f64 = PriorityFactor::ALL.iter().map(|f| f.weight(&weights)).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn tier_cutoffs() {
        let tiers = TierThresholds::default();
        assert_eq!(Tier::from_score(15.0, &tiers), Tier::Critical);
        assert_eq!(Tier::from_score(14.9, &tiers), Tier::High);
        assert_eq!(Tier::from_score(6.0, &tiers), Tier::Medium);
        assert_eq!(Tier::from_score(3.0, &tiers), Tier::Low);
        assert_eq!(Tier::from_score(2.9, &tiers), Tier::Minimal);
    }

    #[test]
    fn styles_follow_tier() {
        let critical = Tier::Critical.style();
        assert_eq!(critical.border_color, "red");
        assert_eq!(critical.z_index, 10);
        assert!(critical.blink && critical.glow && critical.highlight);

        let minimal = Tier::Minimal.style();
        assert_eq!(minimal.opacity, 0.7);
        assert_eq!(minimal.border_width, 0.5);
        assert!(!minimal.highlight);
    }

    #[test]
    fn high_priority_milestone_is_prominent() {
        let t = task("M", date(3, 1), date(3, 1)).with_priority(3).as_milestone();
        let config = LayoutConfig::default().resolve(std::slice::from_ref(&t));
        let score = score_task(&t, &context(&config));
        assert!(score.tier >= Tier::High, "tier was {}", score.tier);
        assert_eq!(factor(&score, PriorityFactor::MilestoneStatus), 25.0);
    }

    #[test]
    fn factor_values() {
        let t = task("T", date(1, 10), date(1, 25))
            .with_priority(2)
            .with_assignee("dee")
            .with_category("PROPOSAL");
        let config = LayoutConfig {
            reference_date: Some(date(1, 8)),
            category_importance: [("PROPOSAL".to_string(), 2.0)].into_iter().collect(),
            ..LayoutConfig::default()
        }
        .resolve(std::slice::from_ref(&t));
        let ctx = PriorityContext {
            assignee_workload: 4,
            dependents: 2,
            ..context(&config)
        };
        let score = score_task(&t, &ctx);

        assert!((factor(&score, PriorityFactor::ConflictSeverity) - 0.4).abs() < 1e-9);
        // 4 + 6 + 2 (15 days)
        assert_eq!(factor(&score, PriorityFactor::TaskImportance), 12.0);
        // starts in 2 days, ends in 17
        assert_eq!(factor(&score, PriorityFactor::TimelineUrgency), 6.0);
        assert_eq!(factor(&score, PriorityFactor::ResourceContention), 2.0);
        assert_eq!(factor(&score, PriorityFactor::DependencyCriticality), 6.0);
        assert_eq!(factor(&score, PriorityFactor::AssigneeLoad), 5.0);
        assert_eq!(factor(&score, PriorityFactor::CategoryWeight), 2.0);
        assert_eq!(factor(&score, PriorityFactor::DeadlineProximity), 1.0);
    }

    #[test]
    fn raising_priority_never_lowers_score() {
        let config = LayoutConfig::default().resolve(&[]);
        let mut last = f64::MIN;
        for p in -2..8 {
            let t = task("T", date(1, 1), date(1, 5)).with_priority(p).as_milestone();
            let score = score_task(&t, &context(&config)).score;
            assert!(score >= last);
            last = score;
        }
    }

    #[test]
    fn ranks_are_descending() {
        let config = LayoutConfig::default().resolve(&[]);
        let tasks = [
            task("A", date(1, 1), date(1, 5)),
            task("B", date(1, 1), date(1, 5)).with_priority(5),
            task("C", date(1, 1), date(1, 5)),
        ];
        let scores = score_tasks(&tasks, &[], |_| 0, &config);
        assert_eq!(scores[1].rank, 1);
        assert_eq!(scores[0].rank, 2);
        assert_eq!(scores[2].rank, 3);
    }
}
