//! Overlap detection and grouping
//!
//! Two tasks overlap when their inclusive day ranges intersect. Groups are
//! the connected components of the overlap relation: if A overlaps B and B
//! overlaps C, all three share a group even when A and C are disjoint.
//! Components are found with a union-find over a start-sorted sweep.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use petgraph::unionfind::UnionFind;
use serde::Serialize;

use crate::domain::{Task, TaskId};

/// Geometric relation between two overlapping ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapType {
    /// Same start and end
    Identical,
    /// One range strictly inside the other
    Nested,
    /// One range inside the other, sharing one boundary
    Complete,
    /// Ranges cross without containment
    Partial,
    /// Ranges touch on a single boundary day
    Adjacent,
}

impl OverlapType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlapType::Identical => "identical",
            OverlapType::Nested => "nested",
            OverlapType::Complete => "complete",
            OverlapType::Partial => "partial",
            OverlapType::Adjacent => "adjacent",
        }
    }
}

impl fmt::Display for OverlapType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered severity scale shared by overlaps and conflicts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An overlapping task pair
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overlap {
    pub first: TaskId,
    pub second: TaskId,

    /// Input indices of the pair, `first_index < second_index`
    #[serde(skip)]
    pub first_index: usize,
    #[serde(skip)]
    pub second_index: usize,

    #[serde(rename = "type")]
    pub kind: OverlapType,

    /// First and last shared day
    pub start: NaiveDate,
    pub end: NaiveDate,

    /// `end - start` in whole days
    pub span_days: i64,

    /// Days both tasks cover, counting both ends
    pub shared_days: i64,

    /// `shared_days` relative to the shorter task, in `(0, 1]`
    pub fraction: f64,

    pub severity: Severity,
}

impl Overlap {
    /// Detects the overlap between `tasks[i]` and `tasks[j]`, if any
    pub fn between(tasks: &[Task], i: usize, j: usize) -> Option<Self> {
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        let (a, b) = (&tasks[i], &tasks[j]);
        if i == j || !a.overlaps(b) {
            return None;
        }

        let (s1, e1) = (a.start, a.effective_end());
        let (s2, e2) = (b.start, b.effective_end());
        let start = s1.max(s2);
        let end = e1.min(e2);
        let span_days = (end - start).num_days();
        let shared_days = span_days + 1;
        let shorter = a.inclusive_days().min(b.inclusive_days());
        let fraction = (shared_days as f64 / shorter as f64).min(1.0);

        let a_contains_b = s1 <= s2 && e2 <= e1;
        let b_contains_a = s2 <= s1 && e1 <= e2;
        let kind = if s1 == s2 && e1 == e2 {
            OverlapType::Identical
        } else if (s1 < s2 && e2 < e1) || (s2 < s1 && e1 < e2) {
            OverlapType::Nested
        } else if a_contains_b || b_contains_a {
            OverlapType::Complete
        } else if span_days == 0 {
            OverlapType::Adjacent
        } else {
            OverlapType::Partial
        };

        Some(Self {
            first: a.id.clone(),
            second: b.id.clone(),
            first_index: i,
            second_index: j,
            kind,
            start,
            end,
            span_days,
            shared_days,
            fraction,
            severity: severity_for(kind, fraction),
        })
    }

    /// Returns true if `task_id` is one side of the pair
    pub fn involves(&self, task_id: &TaskId) -> bool {
        &self.first == task_id || &self.second == task_id
    }
}

fn severity_for(kind: OverlapType, fraction: f64) -> Severity {
    match kind {
        OverlapType::Identical => Severity::Critical,
        OverlapType::Nested | OverlapType::Complete => Severity::High,
        OverlapType::Partial if fraction >= 0.8 => Severity::High,
        OverlapType::Partial if fraction >= 0.5 => Severity::Medium,
        OverlapType::Partial | OverlapType::Adjacent => Severity::Low,
    }
}

/// A connected component of overlapping tasks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Position of the group in start order
    pub id: usize,

    /// Input indices, sorted by start, then effective end, then input order
    pub members: Vec<usize>,

    /// Earliest start and latest effective end of the members
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Group {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Groups plus every overlapping pair
#[derive(Debug, Clone, Default)]
pub struct OverlapAnalysis {
    pub groups: Vec<Group>,

    /// Ordered by input index of the first task, then of the second
    pub overlaps: Vec<Overlap>,
}

/// Detects all overlapping pairs and partitions tasks into groups
pub fn analyze(tasks: &[Task]) -> OverlapAnalysis {
    if tasks.is_empty() {
        return OverlapAnalysis::default();
    }

    let mut order: Vec<usize> = (0..tasks.len()).collect();
    order.sort_by_key(|&i| (tasks[i].start, tasks[i].effective_end(), i));

    let mut components = UnionFind::<usize>::new(tasks.len());
    let mut overlaps = Vec::new();

    for (pos, &i) in order.iter().enumerate() {
        let end = tasks[i].effective_end();
        for &j in &order[pos + 1..] {
            // Later tasks start even later
            if tasks[j].start > end {
                break;
            }
            if let Some(overlap) = Overlap::between(tasks, i, j) {
                components.union(i, j);
                overlaps.push(overlap);
            }
        }
    }

    overlaps.sort_by_key(|o| (o.first_index, o.second_index));

    // `order` is already member order, so pushing keeps members sorted
    let mut by_root: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for &i in &order {
        by_root.entry(components.find(i)).or_default().push(i);
    }

    let mut groups: Vec<Group> = by_root
        .into_values()
        .map(|members| {
            let start = members.iter().map(|&i| tasks[i].start).min();
            let end = members.iter().map(|&i| tasks[i].effective_end()).max();
            Group {
                id: 0,
                start: start.unwrap_or_default(),
                end: end.unwrap_or_default(),
                members,
            }
        })
        .collect();

    groups.sort_by_key(|g| (g.start, g.members.first().copied()));
    for (id, group) in groups.iter_mut().enumerate() {
        group.id = id;
    }

    OverlapAnalysis { groups, overlaps }
}
