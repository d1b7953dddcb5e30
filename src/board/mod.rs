//! Board: the drag-and-drop status-transition engine.
//!
//! ## Overview
//!
//! The board keeps the viewed project's tasks in memory, projects them into
//! five status columns, turns pointer gestures into status moves, and commits
//! those moves optimistically while reconciling with the task API in the
//! background.
//!
//! ## Module Map
//!
//! ```text
//!  pointer events            ┌─────────────────────────────────────────────┐
//! ─────────────────────────> │  kanban.rs  (KanbanBoard, Completion)       │
//!                            │     │ DragController::handle()              │
//!                            │     v                                       │
//!                            │  drag.rs  (DragState, DragEffect)           │
//!                            │     │ Dropped → Reconciler::begin()         │
//!                            │     v                                       │
//!                            │  reconcile.rs  (Reconciler, seq per task)   │
//!                            │     │ spawn_status_update()                 │
//!                            │     v                      ┌──────────────┐ │
//!                            │  api.rs  (TaskApi) ──────> │ task server  │ │
//!                            │     │ Completion over mpsc └──────────────┘ │
//!                            │     v                                       │
//!                            │  cache.rs  (TaskCache) ──> events.rs        │
//!                            │     │                                       │
//!                            │     v                                       │
//!                            │  filter.rs  (partition → ColumnView)        │
//!                            └─────────────────────────────────────────────┘
//! ```
//!
//! ## Supporting Modules
//!
//! | Module   | Responsibility                                            |
//! |----------|-----------------------------------------------------------|
//! | `models` | Wire types: `Task`, `TaskStatus`, `Filter`, `Project`     |
//! | `detail` | `TaskDetail`: one task's edits, comments and attachments  |
//! | `events` | `CacheEvent` enum + `broadcast_event()` helper            |

pub mod api;
pub mod cache;
pub mod detail;
pub mod drag;
pub mod events;
pub mod filter;
pub mod kanban;
pub mod models;
pub mod reconcile;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{AttachmentUpload, HttpTaskApi, TaskApi};
pub use cache::TaskCache;
pub use detail::{TaskDetail, TaskDraft};
pub use drag::{DragEffect, DragState, DropTarget, Point};
pub use kanban::{Completion, KanbanBoard};
pub use models::{Filter, Task, TaskStatus};
