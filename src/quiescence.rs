//! Awaitable "nothing left to do" notification.
//!
//! [`Simulation::when_quiescent`](crate::Simulation::when_quiescent) hands
//! out a [`Quiescence`] future and keeps the matching [`QuiescenceSignal`].
//! The simulation resolves the signal from its drain loops; the future may
//! be polled from another task, so the shared slot sits behind a
//! `parking_lot::Mutex`.

use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

use crate::types::SimTime;

#[derive(Debug, Default)]
struct Slot {
    resolved_at: Option<SimTime>,
    waker: Option<Waker>,
}

/// The simulation's side of a quiescence wait.
#[derive(Clone, Debug, Default)]
pub struct QuiescenceSignal {
    slot: Arc<Mutex<Slot>>,
}

impl QuiescenceSignal {
    /// Creates an unresolved signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the future observing this signal.
    pub fn future(&self) -> Quiescence {
        Quiescence {
            slot: self.slot.clone(),
        }
    }

    /// Resolves the wait at logical time `at` and wakes the waiting task.
    ///
    /// Later calls keep the first resolution time.
    pub fn resolve(&self, at: SimTime) {
        let waker = {
            let mut slot = self.slot.lock();
            if slot.resolved_at.is_some() {
                return;
            }
            slot.resolved_at = Some(at);
            slot.waker.take()
        };
        if let Some(waker) = waker {
            waker.wake();
        }
    }

    /// Returns true once [`resolve`](Self::resolve) has been called.
    pub fn is_resolved(&self) -> bool {
        self.slot.lock().resolved_at.is_some()
    }
}

/// Resolves to the logical time at which the simulation became quiescent.
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct Quiescence {
    slot: Arc<Mutex<Slot>>,
}

impl Quiescence {
    /// Non-blocking check, usable without an executor.
    pub fn is_resolved(&self) -> bool {
        self.slot.lock().resolved_at.is_some()
    }

    /// The resolution time, if resolved.
    pub fn resolved_at(&self) -> Option<SimTime> {
        self.slot.lock().resolved_at
    }
}

impl Future for Quiescence {
    type Output = SimTime;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<SimTime> {
        let mut slot = self.slot.lock();
        if let Some(at) = slot.resolved_at {
            return Poll::Ready(at);
        }
        match &slot.waker {
            Some(existing) if existing.will_wake(cx.waker()) => {}
            _ => slot.waker = Some(cx.waker().clone()),
        }
        Poll::Pending
    }
}
