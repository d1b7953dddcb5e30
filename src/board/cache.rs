//! Task Cache: the in-memory task list of the viewed project.
//!
//! The cache is the single source of truth for rendering. It never holds two
//! entries with the same `task_id`, keeps tasks in arrival order, and
//! broadcasts a [`CacheEvent`] after every change so dependent views can
//! recompute.

use tokio::sync::broadcast;

use super::api::TaskApi;
use super::events::{CacheEvent, EVENT_CHANNEL_CAPACITY, broadcast_event};
use super::models::{Filter, Task, TaskPatch, TaskStatus};
use crate::errors::ApiError;

pub struct TaskCache {
    project_id: Option<i64>,
    filter: Filter,
    tasks: Vec<Task>,
    revision: u64,
    confirmed_writes: u64,
    events: broadcast::Sender<CacheEvent>,
}

impl Default for TaskCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskCache {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            project_id: None,
            filter: Filter::default(),
            tasks: Vec::new(),
            revision: 0,
            confirmed_writes: 0,
            events,
        }
    }

    /// Receive a [`CacheEvent`] for every subsequent change.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    /// Project whose tasks the cache currently holds.
    pub fn project_id(&self) -> Option<i64> {
        self.project_id
    }

    /// Filter the current contents were loaded with.
    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, task_id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.task_id == task_id)
    }

    pub fn status_of(&self, task_id: i64) -> Option<TaskStatus> {
        self.get(task_id).map(|t| t.status)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Incremented on every change; cheap staleness check for renderers.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of server-confirmed writes applied so far. A task list
    /// fetched before the latest of these may disagree with the server.
    pub fn confirmed_writes(&self) -> u64 {
        self.confirmed_writes
    }

    /// Fetch the project's tasks and replace the cache wholesale.
    ///
    /// On failure the previous contents stay in place.
    pub async fn load(
        &mut self,
        api: &dyn TaskApi,
        project_id: i64,
        filter: Filter,
    ) -> Result<usize, ApiError> {
        let tasks = api.list_tasks(project_id, &filter).await?;
        self.replace(project_id, filter, tasks);
        Ok(self.tasks.len())
    }

    /// Swap in a freshly fetched task list.
    ///
    /// A duplicated id keeps its first position and its last value.
    pub fn replace(&mut self, project_id: i64, filter: Filter, tasks: Vec<Task>) {
        let mut deduped: Vec<Task> = Vec::with_capacity(tasks.len());
        for task in tasks {
            match deduped.iter_mut().find(|t| t.task_id == task.task_id) {
                Some(existing) => *existing = task,
                None => deduped.push(task),
            }
        }
        self.project_id = Some(project_id);
        self.filter = filter;
        self.tasks = deduped;
        self.bump(CacheEvent::Replaced {
            project_id,
            count: self.tasks.len(),
        });
    }

    /// Synchronous in-place mutation of one task. No network effect.
    ///
    /// Returns `false` when the task is not cached.
    pub fn apply_local(&mut self, task_id: i64, patch: &TaskPatch) -> bool {
        let Some(task) = self.tasks.iter_mut().find(|t| t.task_id == task_id) else {
            return false;
        };
        patch.apply(task);
        let status = task.status;
        self.bump(CacheEvent::TaskPatched { task_id, status });
        true
    }

    /// [`Self::apply_local`] for a change the server has already accepted.
    pub fn confirm(&mut self, task_id: i64, patch: &TaskPatch) -> bool {
        self.confirmed_writes += 1;
        self.apply_local(task_id, patch)
    }

    /// Insert a confirmed task, or replace the cached copy in place.
    pub fn upsert(&mut self, task: Task) {
        let task_id = task.task_id;
        match self.tasks.iter_mut().find(|t| t.task_id == task_id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
        self.confirmed_writes += 1;
        self.bump(CacheEvent::TaskUpserted { task_id });
    }

    /// Replace the cached copy of a confirmed task, leaving the cache alone
    /// when the task is not in the current view.
    ///
    /// The write is counted either way, since an in-flight load may still
    /// carry the older copy.
    pub fn refresh(&mut self, task: Task) -> bool {
        let task_id = task.task_id;
        self.confirmed_writes += 1;
        let Some(existing) = self.tasks.iter_mut().find(|t| t.task_id == task_id) else {
            return false;
        };
        *existing = task;
        self.bump(CacheEvent::TaskUpserted { task_id });
        true
    }

    pub fn remove(&mut self, task_id: i64) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.task_id == task_id)?;
        let task = self.tasks.remove(index);
        self.confirmed_writes += 1;
        self.bump(CacheEvent::TaskRemoved { task_id });
        Some(task)
    }

    fn bump(&mut self, event: CacheEvent) {
        self.revision += 1;
        broadcast_event(&self.events, event);
    }
}
