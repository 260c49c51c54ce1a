//! Layout commands (layout, conflicts, scores, check)
//!
//! Each command loads the task file, resolves the configuration and runs the
//! engine once. Text output is a set of aligned tables; JSON output is the
//! serialized result.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::output::{Column, Output, Table};
use crate::domain::{DependencyGraph, Task};
use crate::layout::{ConflictSummary, LayoutEngine, LayoutResult};
use crate::storage::{load_tasks, write_report, Config};

/// Layout result plus its fingerprint, as written to reports
#[derive(Serialize)]
struct Report<'a> {
    fingerprint: String,
    #[serde(flatten)]
    result: &'a LayoutResult,
}

const BAR_COLUMNS: &[Column] = &[
    Column::left("TASK", 16),
    Column::right("SEG", 3),
    Column::left("START", 10),
    Column::left("END", 10),
    Column::right("X", 8),
    Column::right("Y", 8),
    Column::right("WIDTH", 8),
    Column::right("HEIGHT", 6),
    Column::right("ROW", 3),
    Column::left("TIER", 8),
    Column::left("STACK", 10),
    Column::left("FLAGS", 8),
];

const CONFLICT_COLUMNS: &[Column] = &[
    Column::left("FIRST", 16),
    Column::left("SECOND", 16),
    Column::left("TYPE", 9),
    Column::right("DAYS", 5),
    Column::left("CATEGORY", 10),
    Column::left("SEVERITY", 9),
    Column::left("RESOLUTION", 20),
];

const SCORE_COLUMNS: &[Column] = &[
    Column::right("RANK", 4),
    Column::left("TASK", 24),
    Column::right("SCORE", 7),
    Column::left("TIER", 8),
];

fn run_engine(output: &Output, file: &Path, config: Option<&Path>) -> Result<LayoutResult> {
    let config = Config::load(config)?;
    output.verbose_ctx("config", &format!("Using {}", config.source.describe()));

    let tasks = load_tasks(file)?;
    output.verbose_ctx("tasks", &format!("Loaded {} tasks", tasks.len()));

    Ok(LayoutEngine::new(config.layout).run(&tasks))
}

/// Lay out tasks and print bars, statistics and recommendations
pub fn layout(
    output: &Output,
    file: &Path,
    config: Option<&Path>,
    report_path: Option<&Path>,
) -> Result<()> {
    let result = run_engine(output, file, config)?;
    let report = Report {
        fingerprint: result.fingerprint(),
        result: &result,
    };

    if let Some(path) = report_path {
        write_report(path, &report)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        output.verbose_ctx("layout", &format!("Wrote report to {}", path.display()));
    }

    if output.is_json() {
        output.data(&report);
        return Ok(());
    }

    if result.bars.is_empty() {
        output.line("No tasks to lay out.");
    } else {
        let mut table = Table::new(BAR_COLUMNS);
        for bar in &result.bars {
            table.row([
                bar.task.to_string(),
                bar.segment.to_string(),
                bar.start.to_string(),
                bar.end.to_string(),
                format!("{:.2}", bar.x),
                format!("{:.2}", bar.y),
                format!("{:.2}", bar.width),
                format!("{:.2}", bar.height),
                bar.row.to_string(),
                bar.tier.to_string(),
                bar.stacking.kind.to_string(),
                (if bar.row_overflow { "overflow" } else { "" }).to_string(),
            ]);
        }
        output.table("Bars", &table);
    }

    let stats = &result.statistics;
    output.section("Statistics");
    output.field("Tasks", stats.total_tasks);
    output.field("Groups", stats.groups);
    output.field(
        "Conflicts",
        format!("{} ({} critical)", stats.conflicts, stats.critical_conflicts),
    );
    output.field("Collisions", stats.collisions);
    output.field("Overflow", stats.overflow);
    output.field("Month splits", stats.month_splits);
    output.field("Max rows used", stats.max_rows_used);
    output.field("Space efficiency", format!("{:.2}", stats.space_efficiency));
    output.field("Visual quality", format!("{:.2}", stats.visual_quality));
    output.field("Visual balance", format!("{:.2}", stats.visual_balance));
    output.field("Continuity", format!("{:.2}", stats.continuity));
    output.field("Density", format!("{:.2}", stats.density));

    if !result.recommendations.is_empty() {
        output.section("Recommendations");
        output.bullets(&result.recommendations);
    }

    Ok(())
}

/// Show classified conflicts
pub fn conflicts(output: &Output, file: &Path, config: Option<&Path>) -> Result<()> {
    let result = run_engine(output, file, config)?;
    let summary = ConflictSummary::from_conflicts(&result.conflicts);

    if output.is_json() {
        output.data(&serde_json::json!({
            "summary": summary,
            "risk": summary.risk_assessment(),
            "conflicts": result.conflicts,
        }));
        return Ok(());
    }

    if result.conflicts.is_empty() {
        output.line("No conflicts.");
        return Ok(());
    }

    let mut table = Table::new(CONFLICT_COLUMNS);
    for conflict in &result.conflicts {
        table.row([
            conflict.overlap.first.to_string(),
            conflict.overlap.second.to_string(),
            conflict.overlap.kind.to_string(),
            conflict.overlap.shared_days.to_string(),
            conflict.category.to_string(),
            conflict.severity.to_string(),
            conflict.resolution.strategy.clone(),
        ]);
    }
    output.table("Conflicts", &table);
    output.line("");
    output.line(summary.risk_assessment());

    Ok(())
}

/// Show priority scores, highest first
pub fn scores(output: &Output, file: &Path, config: Option<&Path>) -> Result<()> {
    let result = run_engine(output, file, config)?;
    let ranked = result.ranked_scores();

    if output.is_json() {
        output.data(&ranked);
        return Ok(());
    }

    if ranked.is_empty() {
        output.line("No tasks to score.");
        return Ok(());
    }

    let mut table = Table::new(SCORE_COLUMNS);
    for score in &ranked {
        table.row([
            score.rank.to_string(),
            score.task.to_string(),
            format!("{:.2}", score.score),
            score.tier.to_string(),
        ]);
    }
    output.table("Scores", &table);

    if output.is_verbose() {
        for score in &ranked {
            output.section(&format!("Factors for {}", score.task));
            for factor in &score.factors {
                output.field(
                    &format!("{:?}", factor.factor),
                    format!("{:>6.2} x {:.2}", factor.value, factor.weight),
                );
            }
        }
    }

    Ok(())
}

/// One problem found by `check`
#[derive(Debug, Serialize)]
struct Issue {
    task: String,
    message: String,
}

fn find_issues(tasks: &[Task]) -> Vec<Issue> {
    let graph = DependencyGraph::from_tasks(tasks);
    let mut issues: Vec<Issue> = graph
        .validate()
        .into_iter()
        .map(|err| Issue {
            task: issue_task(&err),
            message: err.to_string(),
        })
        .collect();

    issues.extend(tasks.iter().filter(|t| t.is_degenerate()).map(|t| Issue {
        task: t.id.to_string(),
        message: format!("Task {} ends ({}) before it starts ({})", t.id, t.end, t.start),
    }));

    issues
}

fn issue_task(err: &crate::domain::GraphError) -> String {
    use crate::domain::GraphError::*;
    match err {
        CycleDetected(id, _)
        | UnknownDependency(id, _)
        | TaskNotFound(id)
        | SelfDependency(id)
        | DuplicateTask(id) => id.to_string(),
    }
}

/// Validate a task file; fails when any issue is found
pub fn check(output: &Output, file: &Path) -> Result<()> {
    let tasks = load_tasks(file)?;
    let issues = find_issues(&tasks);
    output.verbose_ctx(
        "check",
        &format!("{} tasks, {} issues", tasks.len(), issues.len()),
    );

    if output.is_json() {
        output.data(&serde_json::json!({
            "tasks": tasks.len(),
            "valid": issues.is_empty(),
            "issues": issues,
        }));
    } else if issues.is_empty() {
        output.line(format!("OK: {} tasks, no issues.", tasks.len()));
    } else {
        output.line(format!("Issues ({}):", issues.len()));
        let messages: Vec<&str> = issues.iter().map(|i| i.message.as_str()).collect();
        output.bullets(&messages);
    }

    if !issues.is_empty() {
        anyhow::bail!("{} issue(s) found in {}", issues.len(), file.display());
    }

    Ok(())
}
