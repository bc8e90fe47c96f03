//! Completion events for asynchronous kernel submissions.
//!
//! Every submission produces one [`Event`]. Events are passed back into later
//! submissions as dependency lists, establishing a happens-after partial
//! order; the engine guarantees a kernel starts only after every event in its
//! dependency list has completed. Completion is observed through the event
//! (`status`, `wait`), never by blocking inside the dispatch path.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of an event within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(u64);

impl EventId {
    fn next() -> Self {
        EventId(NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[inline]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "evt-{}", self.0)
    }
}

/// Coarse observation of an event's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// The submission has not finished yet.
    Pending,
    /// The submission finished and its results are visible.
    Complete,
    /// The submission failed; `wait` reports the reason.
    Failed,
}

enum EventState {
    Pending,
    Complete,
    Failed(String),
}

struct EventInner {
    id: EventId,
    label: String,
    state: Mutex<EventState>,
    cond: Condvar,
}

/// Handle to an in-flight or completed asynchronous operation.
///
/// Cloning is cheap and all clones observe the same completion. The engine
/// holds the paired [`Completion`] and fires it exactly once; everyone else
/// only reads.
#[derive(Clone)]
pub struct Event {
    inner: Arc<EventInner>,
}

impl Event {
    /// Create a pending event and the completion side that resolves it.
    ///
    /// The label names the submission (conventionally `module::kernel`) and
    /// is carried into failure reports.
    pub fn new(label: impl Into<String>) -> (Event, Completion) {
        let inner = Arc::new(EventInner {
            id: EventId::next(),
            label: label.into(),
            state: Mutex::new(EventState::Pending),
            cond: Condvar::new(),
        });
        (
            Event {
                inner: inner.clone(),
            },
            Completion { inner: Some(inner) },
        )
    }

    /// An event that is already complete.
    ///
    /// Useful as a neutral member of a dependency list.
    pub fn completed() -> Event {
        Event {
            inner: Arc::new(EventInner {
                id: EventId::next(),
                label: "completed".to_string(),
                state: Mutex::new(EventState::Complete),
                cond: Condvar::new(),
            }),
        }
    }

    /// Event identity.
    #[inline]
    pub fn id(&self) -> EventId {
        self.inner.id
    }

    /// Submission label this event belongs to.
    #[inline]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Current state without blocking.
    pub fn status(&self) -> EventStatus {
        match *self.inner.state.lock() {
            EventState::Pending => EventStatus::Pending,
            EventState::Complete => EventStatus::Complete,
            EventState::Failed(_) => EventStatus::Failed,
        }
    }

    /// True once the submission has finished successfully.
    pub fn is_complete(&self) -> bool {
        self.status() == EventStatus::Complete
    }

    /// Block until the event resolves.
    ///
    /// Returns an error if the submission failed.
    pub fn wait(&self) -> Result<()> {
        let mut state = self.inner.state.lock();
        loop {
            match &*state {
                EventState::Pending => self.inner.cond.wait(&mut state),
                EventState::Complete => return Ok(()),
                EventState::Failed(reason) => {
                    return Err(Error::ExecutionFailed {
                        label: self.inner.label.clone(),
                        reason: reason.clone(),
                    })
                }
            }
        }
    }

    /// Block until the event resolves or the timeout elapses.
    ///
    /// Returns `Ok(true)` on completion within the timeout, `Ok(false)` on
    /// timeout, and an error if the submission failed.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        loop {
            match &*state {
                EventState::Pending => {
                    if self.inner.cond.wait_until(&mut state, deadline).timed_out()
                        && matches!(*state, EventState::Pending)
                    {
                        return Ok(false);
                    }
                }
                EventState::Complete => return Ok(true),
                EventState::Failed(reason) => {
                    return Err(Error::ExecutionFailed {
                        label: self.inner.label.clone(),
                        reason: reason.clone(),
                    })
                }
            }
        }
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("id", &self.inner.id)
            .field("label", &self.inner.label)
            .field("status", &self.status())
            .finish()
    }
}

/// Resolving side of an [`Event`], held by the engine.
///
/// Fires at most once. Dropping an unfired completion fails the event so
/// waiters never hang on a submission that was lost.
pub struct Completion {
    inner: Option<Arc<EventInner>>,
}

impl Completion {
    /// Mark the event complete and wake all waiters.
    pub fn complete(mut self) {
        if let Some(inner) = self.inner.take() {
            Self::resolve(&inner, EventState::Complete);
        }
    }

    /// Mark the event failed with a reason and wake all waiters.
    pub fn fail(mut self, reason: impl Into<String>) {
        if let Some(inner) = self.inner.take() {
            Self::resolve(&inner, EventState::Failed(reason.into()));
        }
    }

    fn resolve(inner: &Arc<EventInner>, with: EventState) {
        let mut state = inner.state.lock();
        if matches!(*state, EventState::Pending) {
            *state = with;
        }
        inner.cond.notify_all();
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.take() {
            Self::resolve(
                &inner,
                EventState::Failed("kernel was dropped before completion".to_string()),
            );
        }
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("fired", &self.inner.is_none())
            .finish()
    }
}

/// Wait for every event in the list, reporting the first failure.
pub fn wait_all(events: &[Event]) -> Result<()> {
    for event in events {
        event.wait()?;
    }
    Ok(())
}
