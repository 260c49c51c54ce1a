//! Layout orchestration
//!
//! Runs the stages in order and reports on the result:
//!
//! 1. Resolve configuration against the task set
//! 2. Detect overlaps and group tasks
//! 3. Assign rows per group
//! 4. Classify overlapping pairs
//! 5. Score every task and pick its stacking action
//! 6. Split at month boundaries and position each segment
//! 7. Resolve residual collisions
//! 8. Compute statistics and recommendations
//!
//! The run is a pure function of the tasks and the configuration.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use super::config::{LayoutConfig, ResolvedConfig};
use super::conflict::{CategorizedConflict, ConflictClassifier};
use super::month::{continuity, density, split_task};
use super::overlap::{analyze, Severity};
use super::position::{alignment_offset, place_bar, resolve_collisions, BarInput, PositionedBar};
use super::priority::{score_tasks, PriorityScore, Tier};
use super::rows::{assign_rows, RowPlan};
use super::stacking::{StackingInput, StackingSelector};
use crate::domain::{DependencyGraph, Task, TaskId};

/// One overlap group as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupSummary {
    pub id: usize,
    pub tasks: Vec<TaskId>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: usize,
    pub overflow: Vec<TaskId>,
}

/// Aggregate counts and quality scores of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayoutStatistics {
    pub total_tasks: usize,
    pub groups: usize,
    pub bars: usize,
    pub conflicts: usize,
    pub critical_conflicts: usize,

    /// Bar pairs still colliding after resolution
    pub collisions: usize,

    /// Tasks beyond the row cap
    pub overflow: usize,

    pub month_splits: usize,
    pub degenerate_tasks: usize,
    pub clipped_tasks: usize,
    pub max_rows_used: usize,

    pub space_efficiency: f64,
    pub visual_quality: f64,
    pub visual_balance: f64,
    pub continuity: f64,
    pub density: f64,
}

/// Everything a layout run produces
#[derive(Debug, Clone, Serialize)]
pub struct LayoutResult {
    pub bars: Vec<PositionedBar>,
    pub groups: Vec<GroupSummary>,
    pub conflicts: Vec<CategorizedConflict>,

    /// In input order; `rank` gives the ordering by score
    pub scores: Vec<PriorityScore>,

    pub statistics: LayoutStatistics,
    pub recommendations: Vec<String>,
}

impl LayoutResult {
    fn empty() -> Self {
        Self {
            bars: Vec::new(),
            groups: Vec::new(),
            conflicts: Vec::new(),
            scores: Vec::new(),
            statistics: LayoutStatistics {
                visual_quality: 1.0,
                visual_balance: 1.0,
                continuity: 1.0,
                ..LayoutStatistics::default()
            },
            recommendations: Vec::new(),
        }
    }

    /// Hex blake3 digest of the bars and conflicts
    pub fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(&(&self.bars, &self.conflicts)).unwrap_or_default();
        blake3::hash(&bytes).to_hex().to_string()
    }

    /// Scores sorted by rank, highest first
    pub fn ranked_scores(&self) -> Vec<&PriorityScore> {
        let mut ranked: Vec<&PriorityScore> = self.scores.iter().collect();
        ranked.sort_by_key(|s| s.rank);
        ranked
    }
}

/// A threshold check and the advice it produces
struct Recommendation {
    applies: fn(&LayoutStatistics) -> bool,
    text: fn(&LayoutStatistics, &ResolvedConfig) -> String,
}

/// Evaluated in order
const RECOMMENDATIONS: &[Recommendation] = &[
    Recommendation {
        applies: |s| s.space_efficiency < 0.7,
        text: |s, _| {
            format!(
                "Only {:.0}% of the day cell height is used; consider a smaller day_height",
                s.space_efficiency * 100.0
            )
        },
    },
    Recommendation {
        applies: |s| s.collisions > 0,
        text: |s, _| {
            format!(
                "{} bar collisions remain; increase day_height or reduce task_spacing",
                s.collisions
            )
        },
    },
    Recommendation {
        applies: |s| s.overflow > 0,
        text: |s, c| {
            format!(
                "{} tasks exceed the limit of {} rows per day; raise max_rows_per_day",
                s.overflow, c.max_rows_per_day
            )
        },
    },
    Recommendation {
        applies: |s| s.visual_quality < 0.8,
        text: |s, _| {
            format!(
                "Visual quality is {:.2}; resolve collisions and overflow to improve readability",
                s.visual_quality
            )
        },
    },
    Recommendation {
        applies: |s| s.visual_balance < 0.7,
        text: |s, _| {
            format!(
                "Task load is unevenly spread across groups (balance {:.2}); consider redistributing tasks",
                s.visual_balance
            )
        },
    },
    Recommendation {
        applies: |s| s.degenerate_tasks > 0,
        text: |s, _| {
            format!(
                "{} tasks end before they start and were drawn as single-day bars",
                s.degenerate_tasks
            )
        },
    },
    Recommendation {
        applies: |s| s.clipped_tasks > 0,
        text: |s, _| {
            format!(
                "{} tasks fall outside the calendar window and were not drawn",
                s.clipped_tasks
            )
        },
    },
    Recommendation {
        applies: |s| s.critical_conflicts > 0,
        text: |s, _| format!("{} critical conflicts need resolution", s.critical_conflicts),
    },
    Recommendation {
        applies: |s| s.continuity < 1.0,
        text: |s, _| {
            format!(
                "Continuity is {:.2}; some month-spanning tasks have colliding segments",
                s.continuity
            )
        },
    },
    Recommendation {
        applies: |s| s.density > 0.8,
        text: |s, _| {
            format!(
                "Layout density is {:.0}%; consider wider days or a shorter calendar window",
                s.density * 100.0
            )
        },
    },
];

fn recommendations(stats: &LayoutStatistics, config: &ResolvedConfig) -> Vec<String> {
    RECOMMENDATIONS
        .iter()
        .filter(|r| (r.applies)(stats))
        .map(|r| (r.text)(stats, config))
        .collect()
}

/// 1 minus the coefficient of variation of per-group bar area
fn visual_balance(bars: &[PositionedBar], groups: usize) -> f64 {
    if groups <= 1 {
        return 1.0;
    }
    let mut weights = vec![0.0; groups];
    for bar in bars {
        if let Some(w) = weights.get_mut(bar.group) {
            *w += bar.area();
        }
    }
    let n = weights.len() as f64;
    let mean = weights.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return 1.0;
    }
    let variance = weights.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / n;
    (1.0 - variance.sqrt() / mean).clamp(0.0, 1.0)
}

/// Placement of one task: group, row and overflow flag
#[derive(Debug, Clone, Copy)]
struct Slot {
    group: usize,
    row: usize,
    overflow: bool,
}

/// The layout pipeline with its configuration and rule tables
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    config: LayoutConfig,
    classifier: ConflictClassifier,
    stacking: StackingSelector,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            classifier: ConflictClassifier::default(),
            stacking: StackingSelector::default(),
        }
    }

    /// Replaces the conflict rule table
    pub fn with_classifier(mut self, classifier: ConflictClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replaces the stacking rule table
    pub fn with_stacking(mut self, stacking: StackingSelector) -> Self {
        self.stacking = stacking;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lays out `tasks`
    pub fn run(&self, tasks: &[Task]) -> LayoutResult {
        if tasks.is_empty() {
            debug!("No tasks to lay out");
            return LayoutResult::empty();
        }

        let config = self.config.resolve(tasks);
        debug!(
            tasks = tasks.len(),
            calendar_start = %config.calendar_start,
            calendar_end = %config.calendar_end,
            "Resolved layout configuration"
        );

        let mut degenerate = 0;
        for task in tasks.iter().filter(|t| t.is_degenerate()) {
            warn!(task = %task.id, start = %task.start, end = %task.end, "Task ends before it starts; drawing it on its start day");
            degenerate += 1;
        }

        let analysis = analyze(tasks);
        debug!(
            groups = analysis.groups.len(),
            overlaps = analysis.overlaps.len(),
            "Grouped overlapping tasks"
        );

        let plans: Vec<RowPlan> = analysis
            .groups
            .iter()
            .map(|group| assign_rows(group, tasks, config.max_rows_per_day))
            .collect();

        let mut slots: Vec<Option<Slot>> = vec![None; tasks.len()];
        for (group, plan) in analysis.groups.iter().zip(&plans) {
            for a in &plan.assignments {
                slots[a.index] = Some(Slot {
                    group: group.id,
                    row: a.row,
                    overflow: a.overflow,
                });
            }
        }

        let graph = DependencyGraph::from_tasks(tasks);
        let conflicts = self
            .classifier
            .classify_all(&analysis.overlaps, tasks, &graph, &config);

        let scores = score_tasks(tasks, &conflicts, |id| graph.dependents_count(id), &config);
        debug!(scored = scores.len(), "Scored tasks");

        let actions: Vec<_> = tasks
            .iter()
            .zip(&scores)
            .zip(&slots)
            .map(|((task, score), slot)| {
                self.stacking.select(&StackingInput {
                    task,
                    tier: score.tier,
                    conflicts: conflicts.iter().filter(|c| c.involves(&task.id)).count(),
                    row_overflow: slot.is_some_and(|s| s.overflow),
                    config: &config,
                })
            })
            .collect();

        let mut bars = Vec::new();
        let mut bar_task: Vec<usize> = Vec::new();
        let mut split_tasks = Vec::new();
        let mut clipped = 0;

        for (group, plan) in analysis.groups.iter().zip(&plans) {
            let has_critical = group
                .members
                .iter()
                .any(|&i| scores[i].tier == Tier::Critical);

            for &index in &group.members {
                let task = &tasks[index];
                let Some(slot) = slots[index] else {
                    continue;
                };

                let pieces = split_task(task, &config);
                if pieces.clipped {
                    debug!(task = %task.id, "Task outside calendar window");
                    clipped += 1;
                    continue;
                }
                if pieces.split {
                    split_tasks.push(index);
                }

                let offset = alignment_offset(
                    config.alignment,
                    slot.row,
                    plan.row_count,
                    has_critical,
                    &config,
                );
                for segment in &pieces.segments {
                    bars.push(place_bar(
                        BarInput {
                            task,
                            segment,
                            score: &scores[index],
                            stacking: &actions[index],
                            row: slot.row,
                            group: slot.group,
                            row_overflow: slot.overflow,
                            offset,
                        },
                        &config,
                    ));
                    bar_task.push(index);
                }
            }
        }

        let report = resolve_collisions(&mut bars, &config);
        debug!(
            bars = bars.len(),
            passes = report.passes,
            displacements = report.displacements,
            remaining = report.remaining.len(),
            "Resolved collisions"
        );

        let split_colliding = split_tasks
            .iter()
            .filter(|&&index| {
                report
                    .remaining
                    .iter()
                    .any(|&(a, b)| bar_task[a] == index || bar_task[b] == index)
            })
            .count();

        let overflow: usize = plans.iter().map(|p| p.overflow.len()).sum();
        let collisions = report.remaining.len();
        let total = tasks.len() as f64;
        let used_height = bars.iter().map(PositionedBar::bottom).fold(0.0, f64::max);
        let bar_area: f64 = bars.iter().map(PositionedBar::area).sum();

        let statistics = LayoutStatistics {
            total_tasks: tasks.len(),
            groups: analysis.groups.len(),
            bars: bars.len(),
            conflicts: conflicts.len(),
            critical_conflicts: conflicts
                .iter()
                .filter(|c| c.severity == Severity::Critical)
                .count(),
            collisions,
            overflow,
            month_splits: split_tasks.len(),
            degenerate_tasks: degenerate,
            clipped_tasks: clipped,
            max_rows_used: plans.iter().map(|p| p.row_count).max().unwrap_or(0),
            space_efficiency: (used_height / config.day_height).clamp(0.0, 1.0),
            visual_quality: (1.0 - collisions as f64 / total - overflow as f64 / total)
                .clamp(0.0, 1.0),
            visual_balance: visual_balance(&bars, analysis.groups.len()),
            continuity: continuity(split_tasks.len(), split_colliding),
            density: density(bar_area, &config),
        };

        let groups = analysis
            .groups
            .iter()
            .zip(&plans)
            .map(|(group, plan)| GroupSummary {
                id: group.id,
                tasks: group.members.iter().map(|&i| tasks[i].id.clone()).collect(),
                start: group.start,
                end: group.end,
                rows: plan.row_count,
                overflow: plan.overflow.clone(),
            })
            .collect();

        let recommendations = recommendations(&statistics, &config);
        debug!(
            recommendations = recommendations.len(),
            "Computed layout statistics"
        );

        LayoutResult {
            bars,
            groups,
            conflicts,
            scores,
            statistics,
            recommendations,
        }
    }
}

/// Lays out `tasks` with `config` and the default rule table
pub fn layout(tasks: &[Task], config: &LayoutConfig) -> LayoutResult {
    LayoutEngine::new(config.clone()).run(tasks)
}
