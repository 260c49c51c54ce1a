//! Bar positioning and collision resolution
//!
//! Converts (segment, row, tier, stacking action) into point coordinates.
//! X follows the day grid; Y is the row's lane plus an alignment offset, with
//! the bar centred inside the lane and shifted by the action's vertical
//! offset. After snapping, bars that still intersect are pushed downward
//! below the higher-ranked bar, for a bounded number of passes.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;

use super::config::{Alignment, ResolvedConfig};
use super::month::Segment;
use super::priority::{PriorityScore, Tier, VisualStyle};
use super::stacking::StackingAction;
use crate::domain::{Task, TaskId};

/// Upper bound on collision-resolution sweeps
pub const MAX_RESOLUTION_PASSES: usize = 10;

const EPSILON: f64 = 1e-9;

/// A drawable rectangle for one task segment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedBar {
    pub task: TaskId,
    pub label: String,
    pub segment: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,

    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,

    pub row: usize,

    /// Index of the overlap group
    pub group: usize,

    pub z_index: i32,
    pub is_start: bool,
    pub is_end: bool,
    pub is_continuation: bool,
    pub month_boundary: bool,

    /// The task did not fit under the row cap
    pub row_overflow: bool,

    /// Times the bar was displaced to clear a collision
    pub collision_level: u32,

    /// Rows' worth the bar extends past the day cell
    pub overflow_level: u32,

    pub score: f64,
    pub tier: Tier,
    pub style: VisualStyle,
    pub stacking: StackingAction,
}

impl PositionedBar {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Returns true if both axis intersections exceed `buffer`
    pub fn collides_with(&self, other: &PositionedBar, buffer: f64) -> bool {
        let dx = self.right().min(other.right()) - self.x.max(other.x);
        let dy = self.bottom().min(other.bottom()) - self.y.max(other.y);
        dx > buffer + EPSILON && dy > buffer + EPSILON
    }
}

/// Everything needed to place one segment
#[derive(Debug, Clone, Copy)]
pub struct BarInput<'a> {
    pub task: &'a Task,
    pub segment: &'a Segment,
    pub score: &'a PriorityScore,
    pub stacking: &'a StackingAction,
    pub row: usize,
    pub group: usize,
    pub row_overflow: bool,

    /// Vertical offset from the group's alignment
    pub offset: f64,
}

/// Rounds to the nearest grid line; a grid of 0 disables snapping
pub fn snap(value: f64, grid: f64) -> f64 {
    if grid > 0.0 {
        (value / grid).round() * grid
    } else {
        value
    }
}

/// Rounds up to the next grid line
pub fn snap_up(value: f64, grid: f64) -> f64 {
    if grid > 0.0 {
        (value / grid - EPSILON).ceil() * grid
    } else {
        value
    }
}

/// Bar height from tier, duration and content
pub fn bar_height(task: &Task, tier: Tier, config: &ResolvedConfig) -> f64 {
    let duration = match task.duration_days() {
        d if d <= 1 => 0.8,
        d if d <= 7 => 1.0,
        _ => 1.2,
    };

    let name_len = task.name.chars().count();
    let content = if task.milestone || name_len > 30 || config.is_important_category(&task.category)
    {
        1.3
    } else if name_len < 10 {
        0.7
    } else {
        1.0
    };

    (config.base_task_height * tier.height_multiplier() * duration * content)
        .clamp(config.min_task_height, config.max_task_height)
}

/// Bar width from the segment's occupied days
pub fn bar_width(segment: &Segment, config: &ResolvedConfig) -> f64 {
    let mut width = segment.occupied_days() as f64 * config.day_width;
    if segment.month_boundary && !segment.is_end {
        width -= config.month_boundary_gap;
    }
    width.clamp(config.min_task_width, config.max_task_width)
}

/// Offset applied to a row of a group with `row_count` rows
pub fn alignment_offset(
    alignment: Alignment,
    row: usize,
    row_count: usize,
    has_critical: bool,
    config: &ResolvedConfig,
) -> f64 {
    let used = row_count as f64 * config.row_height;
    let available = config.day_height;
    if row_count == 0 || used >= available {
        return 0.0;
    }
    let extra = available - used;

    let effective = match alignment {
        Alignment::Auto if has_critical => Alignment::Top,
        Alignment::Auto if used < available / 2.0 => Alignment::Center,
        Alignment::Auto => Alignment::Top,
        other => other,
    };

    match effective {
        Alignment::Top | Alignment::Auto => 0.0,
        Alignment::Center => extra / 2.0,
        Alignment::Bottom => extra,
        Alignment::Justify => extra * row as f64 / row_count as f64,
    }
}

/// Places one segment, snapped to the grid
pub fn place_bar(input: BarInput<'_>, config: &ResolvedConfig) -> PositionedBar {
    let BarInput {
        task,
        segment,
        score,
        stacking,
        ..
    } = input;

    let height = (bar_height(task, score.tier, config) * stacking.height_scale)
        .clamp(config.min_task_height, config.max_task_height);
    let width = bar_width(segment, config);

    let lane_top = input.row as f64 * config.row_height + input.offset;
    let inner = (config.row_height - config.task_spacing).max(0.0);
    let y = lane_top
        + config.task_spacing / 2.0
        + (inner - height) / 2.0
        + stacking.vertical_offset;
    let x = config.x_for(segment.start);

    PositionedBar {
        task: task.id.clone(),
        label: task.name.clone(),
        segment: segment.index,
        start: segment.start,
        end: segment.end,
        x: snap(x, config.grid_snap),
        y: snap(y.max(0.0), config.grid_snap),
        width: snap(width, config.grid_snap).max(config.grid_snap.min(width)),
        height: snap(height, config.grid_snap).max(config.grid_snap.min(height)),
        row: input.row,
        group: input.group,
        z_index: stacking.z_index,
        is_start: segment.is_start,
        is_end: segment.is_end,
        is_continuation: segment.is_continuation,
        month_boundary: segment.month_boundary,
        row_overflow: input.row_overflow,
        collision_level: 0,
        overflow_level: 0,
        score: score.score,
        tier: score.tier,
        style: score.style.clone(),
        stacking: stacking.clone(),
    }
}

/// Resolution order: score descending, then x, task ID and segment
fn rank_order(bars: &[PositionedBar]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..bars.len()).collect();
    order.sort_by(|&a, &b| {
        let (ba, bb) = (&bars[a], &bars[b]);
        bb.score
            .total_cmp(&ba.score)
            .then_with(|| ba.x.partial_cmp(&bb.x).unwrap_or(Ordering::Equal))
            .then_with(|| ba.task.cmp(&bb.task))
            .then_with(|| ba.segment.cmp(&bb.segment))
            .then_with(|| a.cmp(&b))
    });
    order
}

/// Outcome of collision resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub passes: usize,
    pub displacements: usize,

    /// Index pairs into the bar list still colliding afterwards
    pub remaining: Vec<(usize, usize)>,
}

/// Index pairs of colliding bars, in list order
pub fn find_collisions(bars: &[PositionedBar], buffer: f64) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..bars.len() {
        for j in i + 1..bars.len() {
            if bars[i].collides_with(&bars[j], buffer) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Moves lower-ranked bars below the bars they collide with
pub fn resolve_collisions(bars: &mut [PositionedBar], config: &ResolvedConfig) -> CollisionReport {
    let mut report = CollisionReport::default();
    let order = rank_order(bars);

    for _ in 0..MAX_RESOLUTION_PASSES {
        report.passes += 1;
        let mut moved = false;

        for (pos, &higher) in order.iter().enumerate() {
            for &lower in &order[pos + 1..] {
                if !bars[higher].collides_with(&bars[lower], config.collision_buffer) {
                    continue;
                }
                let target = snap_up(bars[higher].bottom() + config.task_spacing, config.grid_snap);
                if target > bars[lower].y {
                    bars[lower].y = target;
                    bars[lower].collision_level += 1;
                    report.displacements += 1;
                    moved = true;
                }
            }
        }

        if !moved {
            break;
        }
    }

    for bar in bars.iter_mut() {
        let excess = bar.bottom() - config.day_height;
        bar.overflow_level = if excess > EPSILON {
            (excess / config.row_height).ceil().max(1.0) as u32
        } else {
            0
        };
    }

    report.remaining = find_collisions(bars, config.collision_buffer);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::config::LayoutConfig;
    use crate::layout::month::split_task;
    use crate::layout::priority::{PriorityContext, score_task};
    use crate::layout::stacking::StackingType;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn task(id: &str, start: NaiveDate, end: NaiveDate) -> Task {
        Task::new(TaskId::new(id).unwrap(), id, start, end)
    }

    fn score(t: &Task, config: &ResolvedConfig) -> PriorityScore {
        score_task(
            t,
            &PriorityContext {
                config,
                conflicts: vec![],
                assignee_workload: 0,
                dependents: 0,
            },
        )
    }

    fn place(t: &Task, row: usize, config: &ResolvedConfig) -> PositionedBar {
        place_with(t, row, &StackingAction::default(), config)
    }

    fn place_with(
        t: &Task,
        row: usize,
        stacking: &StackingAction,
        config: &ResolvedConfig,
    ) -> PositionedBar {
        let segments = split_task(t, config);
        let s = score(t, config);
        place_bar(
            BarInput {
                task: t,
                segment: &segments.segments[0],
                score: &s,
                stacking,
                row,
                group: 0,
                row_overflow: false,
                offset: 0.0,
            },
            config,
        )
    }

    #[test]
    fn x_follows_day_grid() {
        let tasks = [
            task("A", date(1, 1), date(1, 3)),
            task("B", date(1, 6), date(1, 8)),
        ];
        let config = LayoutConfig::default().resolve(&tasks);
        assert_eq!(place(&tasks[0], 0, &config).x, 0.0);
        assert_eq!(place(&tasks[1], 0, &config).x, 100.0);
        assert_eq!(place(&tasks[1], 0, &config).width, 40.0);
    }

    #[test]
    fn height_is_clamped() {
        let config = LayoutConfig::default().resolve(&[]);
        let long = task("Thesis chapter with a very long descriptive name", date(1, 1), date(1, 20))
            .as_milestone();
        let h = bar_height(&long, Tier::Critical, &config);
        assert_eq!(h, config.max_task_height);

        let short = task("X", date(1, 1), date(1, 1));
        let h = bar_height(&short, Tier::Minimal, &config);
        assert_eq!(h, config.min_task_height);
    }

    #[test]
    fn bar_centred_in_lane() {
        let t = task("Medium length", date(1, 1), date(1, 4));
        let config = LayoutConfig::default().resolve(std::slice::from_ref(&t));
        let bar = place(&t, 1, &config);
        let lane_top = config.row_height;
        let lane_bottom = 2.0 * config.row_height;
        assert!(bar.y >= lane_top);
        assert!(bar.bottom() <= lane_bottom);
        let above = bar.y - lane_top;
        let below = lane_bottom - bar.bottom();
        assert!((above - below).abs() < 1e-9);
    }

    #[test]
    fn stacking_action_shapes_the_bar() {
        let t = task("Medium length", date(1, 2), date(1, 4));
        let config = LayoutConfig::default().resolve(std::slice::from_ref(&t));
        let plain = place(&t, 0, &config);

        let cascading = StackingAction {
            kind: StackingType::Cascading,
            height_scale: 0.8,
            vertical_offset: 5.0,
            horizontal_offset: 5.0,
            z_index: 7,
            ..StackingAction::default()
        };
        let bar = place_with(&t, 0, &cascading, &config);

        assert_eq!(bar.z_index, 7);
        assert_eq!(bar.x, plain.x);
        assert!(bar.height < plain.height);
        // Centre moves by the vertical offset
        let centre = |b: &PositionedBar| b.y + b.height / 2.0;
        assert!((centre(&bar) - centre(&plain) - 5.0).abs() < 1e-9);

        let minimized = StackingAction {
            height_scale: 0.01,
            ..StackingAction::default()
        };
        assert_eq!(
            place_with(&t, 0, &minimized, &config).height,
            config.min_task_height
        );
    }

    #[test]
    fn non_final_segment_leaves_gap() {
        let t = task("Spanning task", date(1, 25), date(2, 5));
        let config = LayoutConfig::default().resolve(std::slice::from_ref(&t));
        let segments = split_task(&t, &config);
        let first = bar_width(&segments.segments[0], &config);
        assert_eq!(first, 7.0 * 20.0 - config.month_boundary_gap);
    }

    #[test]
    fn alignment_modes() {
        let config = LayoutConfig::default().resolve(&[]);
        // 2 rows of 12 in a 60pt cell
        assert_eq!(alignment_offset(Alignment::Top, 0, 2, false, &config), 0.0);
        assert_eq!(alignment_offset(Alignment::Center, 0, 2, false, &config), 18.0);
        assert_eq!(alignment_offset(Alignment::Bottom, 0, 2, false, &config), 36.0);
        assert_eq!(alignment_offset(Alignment::Justify, 1, 2, false, &config), 18.0);
        assert_eq!(alignment_offset(Alignment::Auto, 0, 2, true, &config), 0.0);
        assert_eq!(alignment_offset(Alignment::Auto, 0, 2, false, &config), 18.0);
        assert_eq!(alignment_offset(Alignment::Auto, 0, 4, false, &config), 0.0);
        // Full cell never shifts
        assert_eq!(alignment_offset(Alignment::Bottom, 0, 5, false, &config), 0.0);
    }

    #[test]
    fn snapping() {
        assert_eq!(snap(7.4, 5.0), 5.0);
        assert_eq!(snap(7.6, 5.0), 10.0);
        assert_eq!(snap(7.6, 0.0), 7.6);
        assert_eq!(snap_up(5.1, 5.0), 10.0);
        assert_eq!(snap_up(10.0, 5.0), 10.0);
    }

    #[test]
    fn collision_moves_lower_ranked_bar_down() {
        let tasks = [
            task("Alpha task", date(1, 1), date(1, 5)).with_priority(5),
            task("Beta task", date(1, 2), date(1, 6)),
        ];
        let config = LayoutConfig::default().resolve(&tasks);
        let mut bars = vec![place(&tasks[1], 0, &config), place(&tasks[0], 0, &config)];
        assert!(bars[0].collides_with(&bars[1], config.collision_buffer));

        let report = resolve_collisions(&mut bars, &config);
        assert!(report.remaining.is_empty());
        assert_eq!(report.displacements, 1);
        // Beta ranks lower and moved below Alpha
        assert_eq!(bars[0].collision_level, 1);
        assert!(bars[0].y >= bars[1].bottom());
        assert_eq!(bars[1].collision_level, 0);
    }

    #[test]
    fn touching_bars_do_not_collide() {
        let tasks = [
            task("Alpha task", date(1, 1), date(1, 5)),
            task("Beta task", date(1, 5), date(1, 9)),
        ];
        let config = LayoutConfig::default().resolve(&tasks);
        let a = place(&tasks[0], 0, &config);
        let b = place(&tasks[1], 0, &config);
        assert!(!a.collides_with(&b, config.collision_buffer));
    }

    #[test]
    fn overflow_level_past_day_cell() {
        let t = task("Overflowing", date(1, 1), date(1, 3));
        let config = LayoutConfig::default().resolve(std::slice::from_ref(&t));
        let mut bars = vec![place(&t, 5, &config)];
        resolve_collisions(&mut bars, &config);
        assert!(bars[0].overflow_level >= 1);
    }
}
