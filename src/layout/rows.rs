//! Row assignment within a group
//!
//! Greedy first-fit packing: members are visited by start day (longer and
//! higher-priority tasks first on ties) and placed in the first row that is
//! free by their start day. When every row is busy and the row cap is
//! reached, the task lands in row 0 and is flagged as overflow.

use serde::Serialize;

use super::overlap::Group;
use crate::domain::{Task, TaskId};

/// Row placement of one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowAssignment {
    pub task: TaskId,

    #[serde(skip)]
    pub index: usize,

    pub row: usize,

    /// Placed beyond the row cap
    pub overflow: bool,
}

/// Row assignments for one group
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowPlan {
    /// In placement order
    pub assignments: Vec<RowAssignment>,

    /// Rows opened, never above the cap
    pub row_count: usize,

    /// Tasks that did not fit under the cap
    pub overflow: Vec<TaskId>,
}

/// Assigns each member of `group` to a row
pub fn assign_rows(group: &Group, tasks: &[Task], max_rows: usize) -> RowPlan {
    let max_rows = max_rows.max(1);

    let mut order = group.members.clone();
    order.sort_by(|&a, &b| {
        let (ta, tb) = (&tasks[a], &tasks[b]);
        ta.start
            .cmp(&tb.start)
            .then_with(|| tb.duration_days().cmp(&ta.duration_days()))
            .then_with(|| tb.priority.cmp(&ta.priority))
            .then_with(|| a.cmp(&b))
    });

    let mut row_ends = Vec::with_capacity(max_rows);
    let mut plan = RowPlan::default();

    for index in order {
        let task = &tasks[index];
        let free = row_ends.iter().position(|end| *end <= task.start);

        let (row, overflow) = match free {
            Some(row) => {
                row_ends[row] = task.occupied_until();
                (row, false)
            }
            None if row_ends.len() < max_rows => {
                row_ends.push(task.occupied_until());
                (row_ends.len() - 1, false)
            }
            // Row 0 keeps its end so later tasks still see the real occupancy
            None => (0, true),
        };

        if overflow {
            plan.overflow.push(task.id.clone());
        }
        plan.assignments.push(RowAssignment {
            task: task.id.clone(),
            index,
            row,
            overflow,
        });
    }

    plan.row_count = row_ends.len();
    plan
}
