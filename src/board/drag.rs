//! Drag Session Controller.
//!
//! One pointer interaction, from pick-up to drop, as a tagged-union state
//! and a pure [`transition`] function. The controller never touches the
//! cache or the network; it returns [`DragEffect`]s that the board runtime
//! executes.
//!
//! ```text
//!          down            move ≥ threshold         hover other column
//!  Idle ─────────> Pressed ─────────────────> Dragging ─────────────────> ProvisionallyMoved
//!   ^                 │ up (click)               │   ^  hover origin column      │
//!   │                 v                          │   └───────────────────────────┘
//!   │            OpenDetail                      │ up / cancel
//!   └────────────────────────────────────────────┴──> Dropped | Cancelled ──> Idle
//! ```
//!
//! `Dropped` and `Cancelled` are reported as effects rather than resting
//! states: a finished session always returns to `Idle` in the same step and
//! never waits for the network.

use super::models::TaskStatus;

/// Pointer movement (px) below which a press is treated as a click.
pub const DEFAULT_ACTIVATION_DISTANCE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// What the pointer is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    Column(TaskStatus),
    Task(i64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { task_id: i64, at: Point },
    Move { at: Point, over: Option<DropTarget> },
    Up { at: Point, over: Option<DropTarget> },
    Cancel,
}

/// The task being moved. Holds an id only; the cache owns the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragSession {
    pub task_id: i64,
    /// Status before the drag began; drops are compared against this.
    pub origin: TaskStatus,
    pub hovered: Option<DropTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Pointer is down on a card but has not moved far enough to drag.
    Pressed { task_id: i64, at: Point },
    Dragging(DragSession),
    /// The card is shown in `shown` (visual only) while the pointer is held.
    ProvisionallyMoved {
        session: DragSession,
        shown: TaskStatus,
    },
}

impl DragState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Task under the pointer, from press until the session ends.
    pub fn task_id(&self) -> Option<i64> {
        match self {
            Self::Idle => None,
            Self::Pressed { task_id, .. } => Some(*task_id),
            Self::Dragging(session) | Self::ProvisionallyMoved { session, .. } => {
                Some(session.task_id)
            }
        }
    }

    pub fn session(&self) -> Option<&DragSession> {
        match self {
            Self::Dragging(session) | Self::ProvisionallyMoved { session, .. } => Some(session),
            Self::Idle | Self::Pressed { .. } => None,
        }
    }

    /// Column the dragged card should currently render in, if it was moved
    /// visually away from its origin.
    pub fn provisional_status(&self) -> Option<(i64, TaskStatus)> {
        match self {
            Self::ProvisionallyMoved { session, shown } => Some((session.task_id, *shown)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragEffect {
    /// Pointer-down and up without meaningful movement.
    OpenDetail { task_id: i64 },
    /// Visual-only status change in the cache; never sent to the server.
    ShowInColumn { task_id: i64, status: TaskStatus },
    /// Dropped on a status different from the origin: reconcile it.
    Dropped {
        task_id: i64,
        from: TaskStatus,
        to: TaskStatus,
    },
    /// Released over nothing actionable, or aborted.
    Cancelled { task_id: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: DragState,
    pub effects: Vec<DragEffect>,
}

impl Transition {
    fn to(next: DragState) -> Self {
        Self {
            next,
            effects: Vec::new(),
        }
    }

    fn with(next: DragState, effects: Vec<DragEffect>) -> Self {
        Self { next, effects }
    }
}

/// Advance the drag state machine by one pointer event.
///
/// `status_of` reads a task's current status from the cache.
pub fn transition<F>(
    state: DragState,
    event: PointerEvent,
    activation_distance: f64,
    status_of: F,
) -> Transition
where
    F: Fn(i64) -> Option<TaskStatus>,
{
    match (state, event) {
        (DragState::Idle, PointerEvent::Down { task_id, at }) => match status_of(task_id) {
            Some(_) => Transition::to(DragState::Pressed { task_id, at }),
            None => Transition::to(DragState::Idle),
        },
        (DragState::Idle, _) => Transition::to(DragState::Idle),

        (DragState::Pressed { task_id, at: start }, PointerEvent::Move { at, over }) => {
            if start.distance_to(at) < activation_distance {
                return Transition::to(state);
            }
            let Some(origin) = status_of(task_id) else {
                return Transition::to(DragState::Idle);
            };
            let session = DragSession {
                task_id,
                origin,
                hovered: None,
            };
            hover(session, None, over, &status_of)
        }
        (DragState::Pressed { task_id, at: start }, PointerEvent::Up { at, .. }) => {
            if start.distance_to(at) < activation_distance {
                Transition::with(DragState::Idle, vec![DragEffect::OpenDetail { task_id }])
            } else {
                // Released far away without any move in between: no drag was
                // ever shown, so neither open nor drop.
                Transition::to(DragState::Idle)
            }
        }
        (DragState::Pressed { .. }, PointerEvent::Cancel) => Transition::to(DragState::Idle),
        (DragState::Pressed { .. }, PointerEvent::Down { .. }) => Transition::to(state),

        (DragState::Dragging(session), PointerEvent::Move { over, .. }) => {
            hover(session, None, over, &status_of)
        }
        (DragState::ProvisionallyMoved { session, shown }, PointerEvent::Move { over, .. }) => {
            hover(session, Some(shown), over, &status_of)
        }
        (DragState::Dragging(session), PointerEvent::Up { over, .. }) => {
            drop_on(session, None, over, &status_of)
        }
        (DragState::ProvisionallyMoved { session, shown }, PointerEvent::Up { over, .. }) => {
            drop_on(session, Some(shown), over, &status_of)
        }
        (DragState::Dragging(session), PointerEvent::Cancel) => cancel(session, None),
        (DragState::ProvisionallyMoved { session, shown }, PointerEvent::Cancel) => {
            cancel(session, Some(shown))
        }
        (DragState::Dragging(_) | DragState::ProvisionallyMoved { .. }, PointerEvent::Down { .. }) => {
            Transition::to(state)
        }
    }
}

fn hover<F>(
    mut session: DragSession,
    shown: Option<TaskStatus>,
    over: Option<DropTarget>,
    status_of: &F,
) -> Transition
where
    F: Fn(i64) -> Option<TaskStatus>,
{
    session.hovered = over;
    let hovered_status = match over {
        Some(DropTarget::Column(status)) => Some(status),
        // The dragged card under its own pointer says nothing about where to go.
        Some(DropTarget::Task(id)) if id == session.task_id => None,
        Some(DropTarget::Task(id)) => status_of(id),
        None => None,
    };
    let current = shown.unwrap_or(session.origin);
    let rest = match shown {
        Some(shown) => DragState::ProvisionallyMoved { session, shown },
        None => DragState::Dragging(session),
    };

    match hovered_status {
        None => Transition::to(rest),
        Some(status) if status == current => Transition::to(rest),
        Some(status) if status == session.origin => Transition::with(
            DragState::Dragging(session),
            vec![DragEffect::ShowInColumn {
                task_id: session.task_id,
                status,
            }],
        ),
        Some(status) => Transition::with(
            DragState::ProvisionallyMoved {
                session,
                shown: status,
            },
            vec![DragEffect::ShowInColumn {
                task_id: session.task_id,
                status,
            }],
        ),
    }
}

fn drop_on<F>(
    session: DragSession,
    shown: Option<TaskStatus>,
    over: Option<DropTarget>,
    status_of: &F,
) -> Transition
where
    F: Fn(i64) -> Option<TaskStatus>,
{
    let target = match over {
        Some(DropTarget::Column(status)) => Some(status),
        Some(DropTarget::Task(id)) => status_of(id),
        None => None,
    };
    let Some(target) = target else {
        return cancel(session, shown);
    };

    if target == session.origin {
        // Back where it started: undo any visual move, send nothing.
        let effects = revert(session, shown).into_iter().collect();
        return Transition::with(DragState::Idle, effects);
    }
    Transition::with(
        DragState::Idle,
        vec![DragEffect::Dropped {
            task_id: session.task_id,
            from: session.origin,
            to: target,
        }],
    )
}

/// Re-anchor a session on the dragged task's freshly loaded status.
///
/// `origin` is what a cancel or a drop back reverts to, so it must follow the
/// server whenever the cache is replaced mid-session. `None` means the task
/// is no longer loaded, which ends the session.
pub fn rebase(state: DragState, loaded: Option<TaskStatus>) -> DragState {
    let Some(status) = loaded else {
        return DragState::Idle;
    };
    match state {
        DragState::Dragging(mut session) => {
            session.origin = status;
            DragState::Dragging(session)
        }
        DragState::ProvisionallyMoved { mut session, shown } => {
            session.origin = status;
            if shown == status {
                DragState::Dragging(session)
            } else {
                DragState::ProvisionallyMoved { session, shown }
            }
        }
        DragState::Idle | DragState::Pressed { .. } => state,
    }
}

fn cancel(session: DragSession, shown: Option<TaskStatus>) -> Transition {
    let mut effects: Vec<DragEffect> = revert(session, shown).into_iter().collect();
    effects.push(DragEffect::Cancelled {
        task_id: session.task_id,
    });
    Transition::with(DragState::Idle, effects)
}

fn revert(session: DragSession, shown: Option<TaskStatus>) -> Option<DragEffect> {
    shown
        .filter(|s| *s != session.origin)
        .map(|_| DragEffect::ShowInColumn {
            task_id: session.task_id,
            status: session.origin,
        })
}

/// Stateful wrapper around [`transition`] for callers that hold one session.
#[derive(Debug, Clone)]
pub struct DragController {
    state: DragState,
    activation_distance: f64,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVATION_DISTANCE)
    }
}

impl DragController {
    pub fn new(activation_distance: f64) -> Self {
        Self {
            state: DragState::Idle,
            activation_distance,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn activation_distance(&self) -> f64 {
        self.activation_distance
    }

    /// See [`rebase`].
    pub fn rebase(&mut self, loaded: Option<TaskStatus>) {
        let next = rebase(self.state, loaded);
        if next != self.state {
            tracing::debug!(from = ?self.state, to = ?next, "drag session rebased on load");
        }
        self.state = next;
    }

    pub fn handle<F>(&mut self, event: PointerEvent, status_of: F) -> Vec<DragEffect>
    where
        F: Fn(i64) -> Option<TaskStatus>,
    {
        let Transition { next, effects } =
            transition(self.state, event, self.activation_distance, status_of);
        if std::mem::discriminant(&next) != std::mem::discriminant(&self.state) {
            tracing::debug!(from = ?self.state, to = ?next, "drag state changed");
        }
        self.state = next;
        effects
    }
}
