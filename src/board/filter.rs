//! Filter Engine: per-column projection of the cached tasks.
//!
//! Pure functions with no state of their own; callers re-run them on every
//! cache or filter change. Tasks keep cache arrival order within a column.

use super::models::{COLUMNS, Column, Filter, Task, TaskStatus};

/// One rendered column: its definition and the visible tasks in order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView<'a> {
    pub column: Column,
    pub tasks: Vec<&'a Task>,
}

impl ColumnView<'_> {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Tasks with `status` that pass `filter`, in cache order.
pub fn column_tasks<'a>(tasks: &'a [Task], filter: &Filter, status: TaskStatus) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.status == status && filter.matches(t))
        .collect()
}

/// All five columns in render order.
pub fn partition<'a>(tasks: &'a [Task], filter: &Filter) -> Vec<ColumnView<'a>> {
    COLUMNS
        .iter()
        .map(|column| ColumnView {
            column: *column,
            tasks: column_tasks(tasks, filter, column.status),
        })
        .collect()
}
