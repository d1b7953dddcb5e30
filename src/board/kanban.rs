//! The board runtime: owns the cache and drives drags and reconciliation.
//!
//! All state lives on one owner. Network calls run on spawned tasks that post
//! a [`Completion`] back over a channel; the owner applies completions one at
//! a time through [`KanbanBoard::apply_completion`], so no two handlers ever
//! interleave their cache writes.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};

use super::api::TaskApi;
use super::cache::TaskCache;
use super::detail::TaskDetail;
use super::drag::{DragController, DragEffect, DragState, DropTarget, Point, PointerEvent};
use super::events::CacheEvent;
use super::filter::{ColumnView, partition};
use super::models::{
    Filter, NewTask, PersonBrief, ProjectWithDetails, Task, TaskPatch, TaskStatus,
};
use super::reconcile::{Reconciler, Settlement, StatusCompletion, spawn_status_update};
use crate::errors::{ApiError, BoardError};

/// Result of a background request, delivered to the board's owner.
#[derive(Debug)]
pub enum Completion {
    Loaded {
        generation: u64,
        project_id: i64,
        filter: Filter,
        result: Result<Vec<Task>, ApiError>,
    },
    Members {
        project_id: i64,
        result: Result<ProjectWithDetails, ApiError>,
    },
    Status(StatusCompletion),
}

impl From<StatusCompletion> for Completion {
    fn from(completion: StatusCompletion) -> Self {
        Self::Status(completion)
    }
}

pub struct KanbanBoard {
    api: Arc<dyn TaskApi>,
    cache: TaskCache,
    drag: DragController,
    reconciler: Reconciler,
    project_id: Option<i64>,
    filter: Filter,
    /// Only the load tagged with this generation may replace the cache.
    load_generation: u64,
    /// Confirmed cache writes when the current load was issued.
    load_base: u64,
    loading: bool,
    last_load_error: Option<ApiError>,
    last_rejection: Option<(i64, ApiError)>,
    members: Vec<PersonBrief>,
    pending: usize,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl KanbanBoard {
    pub fn new(api: Arc<dyn TaskApi>, activation_distance: f64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            api,
            cache: TaskCache::new(),
            drag: DragController::new(activation_distance),
            reconciler: Reconciler::new(),
            project_id: None,
            filter: Filter::default(),
            load_generation: 0,
            load_base: 0,
            loading: false,
            last_load_error: None,
            last_rejection: None,
            members: Vec::new(),
            pending: 0,
            tx,
            rx,
        }
    }

    pub fn api(&self) -> &Arc<dyn TaskApi> {
        &self.api
    }

    pub fn cache(&self) -> &TaskCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut TaskCache {
        &mut self.cache
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.cache.subscribe()
    }

    pub fn project_id(&self) -> Option<i64> {
        self.project_id
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn drag_state(&self) -> &DragState {
        self.drag.state()
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// People tasks on the selected project can be assigned to.
    pub fn members(&self) -> &[PersonBrief] {
        &self.members
    }

    /// Whether the newest requested load has not answered yet.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn last_load_error(&self) -> Option<&ApiError> {
        self.last_load_error.as_ref()
    }

    /// The most recent move the server refused, with its reason.
    pub fn last_rejection(&self) -> Option<&(i64, ApiError)> {
        self.last_rejection.as_ref()
    }

    /// The five columns as currently visible.
    pub fn columns(&self) -> Vec<ColumnView<'_>> {
        partition(self.cache.tasks(), &self.filter)
    }

    /// Switch to `project_id`, resetting the filter and fetching its tasks
    /// and members.
    pub fn select_project(&mut self, project_id: i64) {
        tracing::info!(project_id, "selecting project");
        self.project_id = Some(project_id);
        self.filter = Filter::default();
        self.members.clear();
        self.spawn_load(project_id);

        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.pending += 1;
        tokio::spawn(async move {
            let result = api.get_project(project_id).await;
            if tx.send(Completion::Members { project_id, result }).is_err() {
                tracing::debug!(project_id, "board dropped before members loaded");
            }
        });
    }

    /// Target `project_id` without fetching anything, for callers that only
    /// create tasks. Loads still in flight are abandoned and the cache keeps
    /// its contents until the next load.
    pub fn set_project(&mut self, project_id: i64) {
        self.project_id = Some(project_id);
        self.filter = Filter::default();
        self.members.clear();
        self.load_generation += 1;
        self.loading = false;
    }

    pub fn set_filter(&mut self, filter: Filter) -> Result<(), BoardError> {
        let project_id = self.project_id.ok_or(BoardError::NoProjectSelected)?;
        self.filter = filter;
        self.spawn_load(project_id);
        Ok(())
    }

    pub fn clear_filter(&mut self) -> Result<(), BoardError> {
        self.set_filter(Filter::default())
    }

    /// Re-fetch the selected project with the current filter. Any load still
    /// in flight is abandoned.
    pub fn reload(&mut self) -> Result<(), BoardError> {
        let project_id = self.project_id.ok_or(BoardError::NoProjectSelected)?;
        self.spawn_load(project_id);
        Ok(())
    }

    fn spawn_load(&mut self, project_id: i64) {
        self.load_generation += 1;
        self.load_base = self.cache.confirmed_writes();
        self.loading = true;
        let generation = self.load_generation;
        let filter = self.filter;
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.pending += 1;
        tracing::debug!(project_id, generation, ?filter, "loading tasks");
        tokio::spawn(async move {
            let result = api.list_tasks(project_id, &filter).await;
            let completion = Completion::Loaded {
                generation,
                project_id,
                filter,
                result,
            };
            if tx.send(completion).is_err() {
                tracing::debug!(project_id, generation, "board dropped before tasks loaded");
            }
        });
    }

    pub fn pointer_down(&mut self, task_id: i64, at: Point) -> Vec<DragEffect> {
        self.pointer(PointerEvent::Down { task_id, at })
    }

    pub fn pointer_move(&mut self, at: Point, over: Option<DropTarget>) -> Vec<DragEffect> {
        self.pointer(PointerEvent::Move { at, over })
    }

    pub fn pointer_up(&mut self, at: Point, over: Option<DropTarget>) -> Vec<DragEffect> {
        self.pointer(PointerEvent::Up { at, over })
    }

    pub fn cancel_drag(&mut self) -> Vec<DragEffect> {
        self.pointer(PointerEvent::Cancel)
    }

    /// Feed one pointer event through the drag machine and carry out its
    /// cache and network effects. The effects are returned so the caller can
    /// react to the ones meant for it, such as [`DragEffect::OpenDetail`].
    fn pointer(&mut self, event: PointerEvent) -> Vec<DragEffect> {
        let cache = &self.cache;
        let effects = self.drag.handle(event, |id| cache.status_of(id));
        for effect in &effects {
            match *effect {
                DragEffect::ShowInColumn { task_id, status } => {
                    self.cache.apply_local(task_id, &TaskPatch::status(status));
                }
                DragEffect::Dropped { task_id, to, .. } => self.commit_move(task_id, to),
                DragEffect::OpenDetail { .. } | DragEffect::Cancelled { .. } => {}
            }
        }
        effects
    }

    /// Move a task without a pointer. Returns `false` when it already has
    /// `status`, in which case nothing is sent.
    pub fn move_task(&mut self, task_id: i64, status: TaskStatus) -> Result<bool, BoardError> {
        let current = self
            .cache
            .status_of(task_id)
            .ok_or(BoardError::TaskNotFound { id: task_id })?;
        if current == status {
            return Ok(false);
        }
        self.commit_move(task_id, status);
        Ok(true)
    }

    fn commit_move(&mut self, task_id: i64, target: TaskStatus) {
        let Some(seq) = self.reconciler.begin(&mut self.cache, task_id, target) else {
            return;
        };
        self.pending += 1;
        spawn_status_update(Arc::clone(&self.api), task_id, seq, target, self.tx.clone());
    }

    /// Create a task on the selected project and append it to the cache.
    ///
    /// The detail is not opened here; callers that want it pass the returned
    /// id to [`Self::open_detail`].
    pub async fn create_task(&mut self, name: &str) -> Result<&Task, BoardError> {
        self.create(NewTask::named(0, name)).await
    }

    /// Like [`Self::create_task`] with every field of `new_task` honoured
    /// except `project_id`, which is always the selected project.
    pub async fn create(&mut self, mut new_task: NewTask) -> Result<&Task, BoardError> {
        let project_id = self.project_id.ok_or(BoardError::NoProjectSelected)?;
        let name = new_task.name.trim().to_string();
        if name.is_empty() {
            return Err(BoardError::InvalidField {
                field: "name",
                value: new_task.name,
            });
        }
        new_task.name = name;
        new_task.project_id = project_id;

        let task = self.api.create_task(&new_task).await?;
        let task_id = task.task_id;
        tracing::info!(task_id, project_id, "task created");
        self.cache.upsert(task);
        self.cache
            .get(task_id)
            .ok_or(BoardError::TaskNotFound { id: task_id })
    }

    /// Open a detail session on a cached task.
    pub fn open_detail(&self, task_id: i64) -> Result<TaskDetail, BoardError> {
        let task = self
            .cache
            .get(task_id)
            .ok_or(BoardError::TaskNotFound { id: task_id })?;
        Ok(TaskDetail::new(Arc::clone(&self.api), task.clone()))
    }

    /// Whether any background request has not been applied yet.
    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }

    /// Wait for the next background completion. Returns `None` when nothing
    /// is outstanding.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        if self.pending == 0 {
            return None;
        }
        let completion = self.rx.recv().await?;
        self.pending -= 1;
        Some(completion)
    }

    pub fn apply_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Loaded {
                generation,
                project_id,
                filter,
                result,
            } => self.apply_load(generation, project_id, filter, result),
            Completion::Members { project_id, result } => {
                if self.project_id != Some(project_id) {
                    return;
                }
                match result {
                    Ok(project) => self.members = project.assignees(),
                    Err(err) => tracing::warn!(project_id, error = %err, "failed to load members"),
                }
            }
            Completion::Status(completion) => {
                let task_id = completion.task_id;
                let settled = self.reconciler.complete(&mut self.cache, completion);
                if let Settlement::RolledBack(err) = settled {
                    self.last_rejection = Some((task_id, err));
                    // The server is authoritative: re-fetch instead of
                    // restoring a snapshot.
                    match self.project_id {
                        Some(project_id) if self.cache.get(task_id).is_some() => {
                            self.spawn_load(project_id)
                        }
                        Some(_) => {}
                        None => tracing::warn!(task_id, "rejected move with no project to reload"),
                    }
                }
            }
        }
    }

    fn apply_load(
        &mut self,
        generation: u64,
        project_id: i64,
        filter: Filter,
        result: Result<Vec<Task>, ApiError>,
    ) {
        if generation != self.load_generation {
            tracing::debug!(generation, current = self.load_generation, "stale load discarded");
            return;
        }
        self.loading = false;
        match result {
            Ok(_) if self.cache.confirmed_writes() != self.load_base => {
                // A write was confirmed after this list was requested, so
                // the list may predate it.
                tracing::debug!(project_id, generation, "load raced a confirmed write, reloading");
                self.spawn_load(project_id);
            }
            Ok(mut tasks) => {
                self.reconciler.overlay(&mut tasks);
                if let Some(task_id) = self.drag.state().task_id() {
                    let loaded = tasks.iter().find(|t| t.task_id == task_id).map(|t| t.status);
                    self.drag.rebase(loaded);
                }
                if let Some((task_id, shown)) = self.drag.state().provisional_status()
                    && let Some(task) = tasks.iter_mut().find(|t| t.task_id == task_id)
                {
                    task.status = shown;
                }
                tracing::debug!(project_id, count = tasks.len(), "tasks loaded");
                self.cache.replace(project_id, filter, tasks);
                self.last_load_error = None;
            }
            Err(err) => {
                tracing::warn!(project_id, error = %err, "failed to load tasks");
                self.last_load_error = Some(err);
            }
        }
    }

    /// Apply completions until nothing is outstanding.
    pub async fn settle(&mut self) {
        while let Some(completion) = self.next_completion().await {
            self.apply_completion(completion);
        }
    }
}
