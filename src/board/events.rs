use serde::Serialize;
use tokio::sync::broadcast;

use super::models::TaskStatus;

/// Capacity of the cache notification channel. Slow subscribers that fall
/// further behind than this see `RecvError::Lagged` and should re-read the
/// whole cache.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

// ── Cache change notifications ───────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum CacheEvent {
    /// The whole task list was swapped for a fresh load.
    Replaced {
        project_id: i64,
        count: usize,
    },
    /// A local, in-place change (optimistic or visual-only).
    TaskPatched {
        task_id: i64,
        status: TaskStatus,
    },
    TaskUpserted {
        task_id: i64,
    },
    TaskRemoved {
        task_id: i64,
    },
}

// ── Broadcast helper ─────────────────────────────────────────────────

/// Broadcast a cache event to every subscriber.
/// Returns silently even if nobody is subscribed.
pub fn broadcast_event(tx: &broadcast::Sender<CacheEvent>, event: CacheEvent) {
    if tx.send(event).is_err() {
        tracing::trace!("cache event dropped, no subscribers");
    }
}
