//! Dependency graph for tasks
//!
//! Tracks dependency links between the tasks of one layout run. Edges point
//! from a dependency to its dependent. The graph is built leniently: links to
//! unknown tasks, self-links, duplicate IDs and cycle-closing links are
//! recorded as issues instead of aborting, so layout can proceed and `check`
//! can report every problem at once. Uses petgraph for graph operations.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use thiserror::Error;

use super::id::TaskId;
use super::task::Task;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GraphError {
    #[error("Dependency would create a cycle: {0} -> {1}")]
    CycleDetected(TaskId, TaskId),

    #[error("Task {0} depends on unknown task {1}")]
    UnknownDependency(TaskId, TaskId),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Self-dependency not allowed: {0}")]
    SelfDependency(TaskId),

    #[error("Duplicate task ID: {0}")]
    DuplicateTask(TaskId),
}

/// A dependency graph for tasks
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// The underlying directed graph
    graph: DiGraph<TaskId, ()>,

    /// Map from TaskId to node index
    node_map: HashMap<TaskId, NodeIndex>,

    /// Problems found while building from tasks, in input order
    issues: Vec<GraphError>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from a collection of tasks, recording invalid links
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut graph = Self::new();

        // First pass: add all nodes
        let tasks: Vec<_> = tasks.into_iter().collect();
        for task in &tasks {
            if !graph.add_task(task.id.clone()) {
                graph.issues.push(GraphError::DuplicateTask(task.id.clone()));
            }
        }

        // Second pass: add all edges
        for task in &tasks {
            for dep_id in &task.dependencies {
                if let Err(err) = graph.add_dependency(&task.id, dep_id) {
                    let err = match err {
                        GraphError::TaskNotFound(missing) => {
                            GraphError::UnknownDependency(task.id.clone(), missing)
                        }
                        other => other,
                    };
                    if !graph.issues.contains(&err) {
                        graph.issues.push(err);
                    }
                }
            }
        }

        graph
    }

    /// Adds a task to the graph, returning false if it was already present
    pub fn add_task(&mut self, task_id: TaskId) -> bool {
        if self.node_map.contains_key(&task_id) {
            return false;
        }
        let idx = self.graph.add_node(task_id.clone());
        self.node_map.insert(task_id, idx);
        true
    }

    /// Adds a dependency edge: `task` depends on `depends_on`
    ///
    /// The edge direction is: depends_on -> task
    /// This means "depends_on must be completed before task"
    pub fn add_dependency(&mut self, task: &TaskId, depends_on: &TaskId) -> Result<(), GraphError> {
        if task == depends_on {
            return Err(GraphError::SelfDependency(task.clone()));
        }

        let task_idx = *self
            .node_map
            .get(task)
            .ok_or_else(|| GraphError::TaskNotFound(task.clone()))?;

        let dep_idx = *self
            .node_map
            .get(depends_on)
            .ok_or_else(|| GraphError::TaskNotFound(depends_on.clone()))?;

        if self.graph.find_edge(dep_idx, task_idx).is_some() {
            return Ok(());
        }

        let edge = self.graph.add_edge(dep_idx, task_idx, ());

        // Keep the graph acyclic
        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(GraphError::CycleDetected(task.clone(), depends_on.clone()));
        }

        Ok(())
    }

    /// Returns every problem with the task set's dependency structure
    pub fn validate(&self) -> Vec<GraphError> {
        self.issues.clone()
    }

    /// Returns how many tasks directly depend on `task_id`
    pub fn dependents_count(&self, task_id: &TaskId) -> usize {
        self.node_map
            .get(task_id)
            .map(|idx| {
                self.graph
                    .neighbors_directed(*idx, Direction::Outgoing)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Returns true if either task directly depends on the other
    pub fn linked(&self, a: &TaskId, b: &TaskId) -> bool {
        match (self.node_map.get(a), self.node_map.get(b)) {
            (Some(ia), Some(ib)) => {
                self.graph.find_edge(*ia, *ib).is_some() || self.graph.find_edge(*ib, *ia).is_some()
            }
            _ => false,
        }
    }
}
