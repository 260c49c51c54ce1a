//! Month-boundary splitting
//!
//! A task whose range crosses into another month is drawn as one segment per
//! month. Segments are contiguous and together cover exactly the task's
//! range; they are also clipped to the calendar window.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

use super::config::ResolvedConfig;
use crate::domain::Task;

/// One drawable piece of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// Position among the task's visible segments
    pub index: usize,

    /// First and last day covered (inclusive)
    pub start: NaiveDate,
    pub end: NaiveDate,

    /// Exclusive end used for the bar width
    pub occupied_until: NaiveDate,

    pub is_start: bool,
    pub is_end: bool,
    pub is_continuation: bool,
    pub month_boundary: bool,
}

impl Segment {
    pub fn occupied_days(&self) -> i64 {
        (self.occupied_until - self.start).num_days()
    }
}

/// Visible segments of one task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSegments {
    pub segments: Vec<Segment>,

    /// The task's range spans more than one month
    pub split: bool,

    /// The task lies entirely outside the calendar window
    pub clipped: bool,
}

/// First day of `date`'s month
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Last day of `date`'s month
pub fn month_end(date: NaiveDate) -> NaiveDate {
    month_start(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

fn next_day(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

/// Splits `[start, end]` at month boundaries
pub fn split_range(start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, NaiveDate)> {
    let mut ranges = Vec::new();
    let mut cursor = start;
    loop {
        let piece_end = month_end(cursor).min(end);
        ranges.push((cursor, piece_end));
        if piece_end >= end {
            break;
        }
        let next = next_day(piece_end);
        if next == piece_end {
            break;
        }
        cursor = next;
    }
    ranges
}

/// Splits a task into per-month segments clipped to the calendar window
pub fn split_task(task: &Task, config: &ResolvedConfig) -> TaskSegments {
    let end = task.effective_end();
    let ranges = split_range(task.start, end);
    let split = ranges.len() > 1;

    let window_until = next_day(config.calendar_end);
    let last = ranges.len() - 1;

    let segments: Vec<Segment> = ranges
        .into_iter()
        .enumerate()
        .filter_map(|(i, (seg_start, seg_end))| {
            let start = seg_start.max(config.calendar_start);
            let end_visible = seg_end.min(config.calendar_end);
            if start > end_visible {
                return None;
            }

            let occupied_until = if i == last {
                task.occupied_until()
            } else {
                next_day(seg_end)
            }
            .min(window_until);

            let is_start = i == 0 && start == task.start;
            Some(Segment {
                index: 0,
                start,
                end: end_visible,
                occupied_until: occupied_until.max(next_day(start)),
                is_start,
                is_end: i == last && end_visible == end,
                is_continuation: !is_start,
                month_boundary: split,
            })
        })
        .enumerate()
        .map(|(index, segment)| Segment { index, ..segment })
        .collect();

    TaskSegments {
        clipped: segments.is_empty(),
        segments,
        split,
    }
}

/// Share of split tasks whose segments are all free of collisions
pub fn continuity(split_tasks: usize, split_tasks_colliding: usize) -> f64 {
    if split_tasks == 0 {
        return 1.0;
    }
    let intact = split_tasks.saturating_sub(split_tasks_colliding);
    (intact as f64 / split_tasks as f64).clamp(0.0, 1.0)
}

/// Total bar area relative to the grid area of the calendar window
pub fn density(bar_area: f64, config: &ResolvedConfig) -> f64 {
    let grid_area = config.window_days() as f64 * config.day_width * config.day_height;
    if grid_area <= 0.0 {
        return 0.0;
    }
    (bar_area / grid_area).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskId;
    use crate::layout::config::LayoutConfig;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn task(id: &str, start: NaiveDate, end: NaiveDate) -> Task {
        Task::new(TaskId::new(id).unwrap(), id, start, end)
    }

    fn split(t: &Task) -> TaskSegments {
        let config = LayoutConfig::default().resolve(std::slice::from_ref(t));
        split_task(t, &config)
    }

    #[test]
    fn month_bounds() {
        assert_eq!(month_end(date(2, 10)), date(2, 29));
        assert_eq!(month_end(date(12, 31)), date(12, 31));
        assert_eq!(month_start(date(3, 17)), date(3, 1));
    }

    #[test]
    fn splits_at_month_boundary() {
        let result = split(&task("A", date(1, 25), date(2, 5)));
        assert!(result.split);
        assert_eq!(result.segments.len(), 2);

        let first = &result.segments[0];
        assert_eq!((first.start, first.end), (date(1, 25), date(1, 31)));
        assert!(first.is_start && !first.is_end && !first.is_continuation);
        assert_eq!(first.occupied_until, date(2, 1));
        assert!(first.month_boundary);

        let second = &result.segments[1];
        assert_eq!((second.start, second.end), (date(2, 1), date(2, 5)));
        assert!(!second.is_start && second.is_end && second.is_continuation);
        assert_eq!(second.index, 1);
    }

    #[test]
    fn three_month_span() {
        let result = split(&task("Q", date(1, 15), date(3, 10)));
        let spans: Vec<_> = result.segments.iter().map(|s| (s.start, s.end)).collect();
        assert_eq!(
            spans,
            vec![
                (date(1, 15), date(1, 31)),
                (date(2, 1), date(2, 29)),
                (date(3, 1), date(3, 10)),
            ]
        );
        assert!(result.segments[1].is_continuation);
        assert!(!result.segments[1].is_start && !result.segments[1].is_end);
    }

    #[test]
    fn single_month_task_is_one_segment() {
        let result = split(&task("A", date(1, 5), date(1, 12)));
        assert!(!result.split);
        let seg = &result.segments[0];
        assert!(seg.is_start && seg.is_end && !seg.month_boundary);
        assert_eq!(seg.occupied_days(), 7);
    }

    #[test]
    fn clipped_at_window_start_is_continuation() {
        let t = task("A", date(1, 20), date(2, 10));
        let config = LayoutConfig {
            calendar_start: Some(date(2, 1)),
            calendar_end: Some(date(2, 29)),
            ..LayoutConfig::default()
        }
        .resolve(std::slice::from_ref(&t));
        let result = split_task(&t, &config);
        assert_eq!(result.segments.len(), 1);
        let seg = &result.segments[0];
        assert_eq!(seg.index, 0);
        assert!(!seg.is_start && seg.is_continuation && seg.is_end);
    }

    #[test]
    fn outside_window_is_clipped() {
        let t = task("A", date(5, 1), date(5, 3));
        let config = LayoutConfig {
            calendar_start: Some(date(1, 1)),
            calendar_end: Some(date(1, 31)),
            ..LayoutConfig::default()
        }
        .resolve(std::slice::from_ref(&t));
        let result = split_task(&t, &config);
        assert!(result.clipped);
        assert!(result.segments.is_empty());
    }

    #[test]
    fn continuity_and_density_bounds() {
        assert_eq!(continuity(0, 0), 1.0);
        assert_eq!(continuity(4, 1), 0.75);

        let config = LayoutConfig::default().resolve(&[task("A", date(1, 1), date(1, 10))]);
        // 10 days x 20 x 60
        assert!((density(1200.0, &config) - 0.1).abs() < 1e-9);
        assert_eq!(density(1e9, &config), 1.0);
    }
}
