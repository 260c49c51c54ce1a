//! Property tests for the layout engine
//!
//! Random task sets, including degenerate and month-spanning ranges, are
//! laid out with the default configuration and checked against the layout
//! guarantees.

use std::collections::BTreeMap;

use chrono::{Datelike, Days, NaiveDate};
use proptest::prelude::*;

use planner_layout::layout::config::LayoutConfig;
use planner_layout::layout::priority::{score_task, PriorityContext};
use planner_layout::{layout, Task, TaskId};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn add(date: NaiveDate, days: i64) -> NaiveDate {
    if days >= 0 {
        date.checked_add_days(Days::new(days as u64)).unwrap()
    } else {
        date.checked_sub_days(Days::new((-days) as u64)).unwrap()
    }
}

const ASSIGNEES: [&str; 3] = ["ana", "kim", "lee"];
const CATEGORIES: [&str; 4] = ["", "PROPOSAL", "ADMIN", "DISSERTATION"];

fn arb_tasks() -> impl Strategy<Value = Vec<Task>> {
    prop::collection::vec(
        (
            0i64..120,
            -2i64..45,
            -3i32..8,
            prop::option::of(0usize..ASSIGNEES.len()),
            0usize..CATEGORIES.len(),
            any::<bool>(),
        ),
        0..24,
    )
    .prop_map(|specs| {
        specs
            .into_iter()
            .enumerate()
            .map(|(i, (offset, len, priority, who, cat, milestone))| {
                let start = add(base(), offset);
                let mut task = Task::new(
                    TaskId::new(format!("T{i}")).unwrap(),
                    format!("Task {i}"),
                    start,
                    add(start, len),
                )
                .with_priority(priority)
                .with_category(CATEGORIES[cat]);
                if let Some(who) = who {
                    task = task.with_assignee(ASSIGNEES[who]);
                }
                if milestone {
                    task = task.as_milestone();
                }
                task
            })
            .collect()
    })
}

fn months_spanned(start: NaiveDate, end: NaiveDate) -> usize {
    let months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    months as usize + 1
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn no_same_row_overlap(tasks in arb_tasks()) {
        let result = layout(&tasks, &LayoutConfig::default());

        // (group, row) per placed, non-overflow task
        let mut placement: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
        for bar in result.bars.iter().filter(|b| !b.row_overflow) {
            placement.insert(bar.task.as_str(), (bar.group, bar.row));
        }

        for (i, a) in tasks.iter().enumerate() {
            for b in tasks.iter().skip(i + 1) {
                let (Some(pa), Some(pb)) = (
                    placement.get(a.id.as_str()),
                    placement.get(b.id.as_str()),
                ) else {
                    continue;
                };
                if pa != pb {
                    continue;
                }
                let disjoint = a.occupied_until() <= b.start || b.occupied_until() <= a.start;
                prop_assert!(disjoint, "{} and {} share row {:?}", a.id, b.id, pa);
            }
        }
    }

    #[test]
    fn row_cap_holds(tasks in arb_tasks()) {
        let config = LayoutConfig::default();
        let result = layout(&tasks, &config);
        for group in &result.groups {
            prop_assert!(group.rows <= config.max_rows_per_day);
        }
        for bar in &result.bars {
            prop_assert!(bar.row < config.max_rows_per_day);
        }
        prop_assert!(result.statistics.max_rows_used <= config.max_rows_per_day);
    }

    #[test]
    fn segments_cover_each_task_exactly(tasks in arb_tasks()) {
        let result = layout(&tasks, &LayoutConfig::default());

        for task in &tasks {
            let segs: Vec<_> = result.bars.iter().filter(|b| b.task == task.id).collect();
            prop_assert_eq!(segs.len(), months_spanned(task.start, task.effective_end()));

            let first = segs[0];
            let last = segs[segs.len() - 1];
            prop_assert_eq!(first.start, task.start);
            prop_assert_eq!(last.end, task.effective_end());
            prop_assert!(first.is_start);
            prop_assert!(last.is_end);

            for (i, pair) in segs.windows(2).enumerate() {
                prop_assert_eq!(pair[0].segment, i);
                prop_assert_eq!(add(pair[0].end, 1), pair[1].start);
                prop_assert!(!pair[1].is_start && pair[1].is_continuation);
                prop_assert!(!pair[0].is_end);
            }
        }
    }

    #[test]
    fn x_follows_calendar_days(tasks in arb_tasks()) {
        let config = LayoutConfig::default();
        let result = layout(&tasks, &config);
        let Some(calendar_start) = tasks.iter().map(|t| t.start).min() else {
            return Ok(());
        };

        for bar in &result.bars {
            let days = (bar.start - calendar_start).num_days() as f64;
            prop_assert!((bar.x - days * config.day_width).abs() < 1e-9);
            prop_assert!(bar.width > 0.0 && bar.height > 0.0);
        }
    }

    #[test]
    fn statistics_are_bounded(tasks in arb_tasks()) {
        let stats = layout(&tasks, &LayoutConfig::default()).statistics;
        for value in [
            stats.space_efficiency,
            stats.visual_quality,
            stats.visual_balance,
            stats.continuity,
            stats.density,
        ] {
            prop_assert!((0.0..=1.0).contains(&value), "{} out of range", value);
        }
        prop_assert_eq!(stats.total_tasks, tasks.len());
    }

    #[test]
    fn layout_is_idempotent(tasks in arb_tasks()) {
        let config = LayoutConfig::default();
        let first = layout(&tasks, &config);
        let second = layout(&tasks, &config);
        prop_assert_eq!(&first.bars, &second.bars);
        prop_assert_eq!(&first.conflicts, &second.conflicts);
        prop_assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn score_grows_with_priority(
        priority in -5i32..10,
        len in 0i64..40,
        milestone in any::<bool>(),
        workload in 0usize..8,
        dependents in 0usize..4,
    ) {
        let start = add(base(), 10);
        let mut task = Task::new(TaskId::new("P").unwrap(), "P", start, add(start, len));
        if milestone {
            task = task.as_milestone();
        }
        let config = LayoutConfig::default().resolve(std::slice::from_ref(&task));
        let ctx = PriorityContext {
            config: &config,
            conflicts: Vec::new(),
            assignee_workload: workload,
            dependents,
        };

        let lower = score_task(&task.clone().with_priority(priority), &ctx);
        let higher = score_task(&task.with_priority(priority + 1), &ctx);
        prop_assert!(higher.score >= lower.score);
        prop_assert!(higher.tier >= lower.tier);
    }
}
