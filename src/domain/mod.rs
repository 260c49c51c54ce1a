//! Domain models for planner-layout
//!
//! Task input types and the dependency graph, without any I/O concerns.

mod graph;
mod id;
mod task;

pub use graph::{DependencyGraph, GraphError};
pub use id::{IdError, TaskId};
pub use task::Task;
