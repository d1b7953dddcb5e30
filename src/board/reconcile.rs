//! Reconciliation Unit: optimistic status moves and their settlement.
//!
//! A move is committed to the cache immediately, then confirmed or undone
//! by the server's answer. Every move is tagged with a sequence number and
//! only the latest sequence per task may settle it: an older completion is
//! superseded no matter whether it succeeded or failed. A failed move is
//! undone by re-fetching, never by restoring a local snapshot, so a rollback
//! cannot stomp a newer optimistic value.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;

use super::api::TaskApi;
use super::cache::TaskCache;
use super::models::{Task, TaskPatch, TaskStatus, TaskUpdate};
use crate::errors::ApiError;

/// The newest unconfirmed move of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InFlight {
    pub seq: u64,
    pub target: TaskStatus,
}

/// Answer to an "update task status" request, tagged with its move.
#[derive(Debug)]
pub struct StatusCompletion {
    pub task_id: i64,
    pub seq: u64,
    pub result: Result<Task, ApiError>,
}

/// How a completion settled.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// The server accepted the latest move; the cache was already right.
    Confirmed,
    /// A newer move on the same task exists; the completion was ignored.
    Superseded,
    /// The server rejected the latest move. The caller must reload.
    RolledBack(ApiError),
}

#[derive(Debug, Default)]
pub struct Reconciler {
    next_seq: u64,
    in_flight: HashMap<i64, InFlight>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the optimistic status and record the move.
    ///
    /// Returns the move's sequence number, or `None` if the task is not cached.
    pub fn begin(&mut self, cache: &mut TaskCache, task_id: i64, target: TaskStatus) -> Option<u64> {
        if !cache.apply_local(task_id, &TaskPatch::status(target)) {
            return None;
        }
        self.next_seq += 1;
        let seq = self.next_seq;
        if let Some(previous) = self.in_flight.insert(task_id, InFlight { seq, target }) {
            tracing::debug!(
                task_id,
                superseded = previous.seq,
                seq,
                "move issued while an earlier one is unconfirmed"
            );
        }
        tracing::info!(task_id, seq, status = %target, "optimistic status commit");
        Some(seq)
    }

    /// Settle a completion against the latest move for its task.
    pub fn complete(&mut self, cache: &mut TaskCache, completion: StatusCompletion) -> Settlement {
        let StatusCompletion {
            task_id,
            seq,
            result,
        } = completion;
        match self.in_flight.get(&task_id) {
            Some(latest) if latest.seq == seq => {}
            _ => {
                tracing::debug!(task_id, seq, "stale status completion ignored");
                return Settlement::Superseded;
            }
        }
        self.in_flight.remove(&task_id);

        match result {
            Ok(task) => {
                tracing::debug!(task_id, seq, "status move confirmed");
                cache.confirm(task_id, &TaskPatch::updated_at(task.updated_at));
                Settlement::Confirmed
            }
            Err(err) => {
                tracing::warn!(task_id, seq, error = %err, "status move rejected, rolling back");
                Settlement::RolledBack(err)
            }
        }
    }

    pub fn in_flight(&self, task_id: i64) -> Option<InFlight> {
        self.in_flight.get(&task_id).copied()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight.is_empty()
    }

    /// Re-apply every unconfirmed move on top of freshly fetched tasks.
    pub fn overlay(&self, tasks: &mut [Task]) {
        for task in tasks.iter_mut() {
            if let Some(pending) = self.in_flight.get(&task.task_id) {
                task.status = pending.target;
            }
        }
    }
}

/// Send the authoritative status update without waiting for it.
///
/// The answer is posted to `tx` as a [`StatusCompletion`].
pub fn spawn_status_update<C>(
    api: Arc<dyn TaskApi>,
    task_id: i64,
    seq: u64,
    target: TaskStatus,
    tx: mpsc::UnboundedSender<C>,
) where
    C: From<StatusCompletion> + Send + 'static,
{
    tokio::spawn(async move {
        let result = api.update_task(task_id, &TaskUpdate::status(target)).await;
        let completion = StatusCompletion {
            task_id,
            seq,
            result,
        };
        if tx.send(completion.into()).is_err() {
            tracing::debug!(task_id, seq, "board dropped before status update completed");
        }
    });
}
