//! Discrete-event timeline.
//!
//! The `Timeline` owns pending events keyed by logical timestamp and the
//! mapping between logical and real time.
//!
//! # Time model
//!
//! Logical time is the [`TimeSource`] reading minus an epoch offset. The
//! offset moves in two situations:
//!
//! - on [`resume`](Timeline::resume), so the paused interval is discounted;
//! - when a batch is drained later than its due instant by more than the
//!   configured slack (host suspended, long evaluation), the excess is folded
//!   into the epoch so later events keep their relative spacing.
//!
//! While a batch runs, logical time is pinned to the batch instant. Callers
//! drive execution with [`take_due`](Timeline::take_due) (running) or
//! [`step`](Timeline::step) (paused) followed by
//! [`finish_batch`](Timeline::finish_batch); events scheduled in between are
//! always accepted.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::clock::TimeSource;
use crate::error::TimelineError;
use crate::event::{EventId, ScheduledEvent};
use crate::types::SimTime;

/// Default lateness tolerated before the epoch is shifted.
pub const DEFAULT_SLACK: SimTime = 100;

/// Timeline construction parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimelineConfig {
    /// Lateness tolerated before the epoch absorbs the excess
    pub slack: SimTime,
    /// Start in the paused state
    pub start_paused: bool,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            slack: DEFAULT_SLACK,
            start_paused: false,
        }
    }
}

/// All events sharing one timestamp, in enqueue order.
#[derive(Debug)]
pub struct Batch<P> {
    /// The instant logical time is pinned to while the batch runs
    pub time: SimTime,
    /// Events in enqueue order
    pub events: Vec<ScheduledEvent<P>>,
}

/// Counters kept by the timeline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TimelineStats {
    /// Events accepted by `schedule_at`
    pub scheduled: u64,
    /// Events handed out in batches
    pub fired: u64,
    /// Events removed by `cancel`
    pub cancelled: u64,
    /// Events scheduled before the current logical time
    pub past_scheduled: u64,
    /// Batches drained later than the slack allows
    pub late_batches: u64,
    /// Total logical time absorbed into the epoch by late batches
    pub absorbed_lateness: SimTime,
}

/// Scheduler and clock state for one simulation.
pub struct Timeline<P> {
    clock: Arc<dyn TimeSource>,
    /// Real minus logical time
    epoch: i64,
    paused_at: Option<SimTime>,
    frozen_at: Option<SimTime>,
    queue: BTreeMap<SimTime, Vec<ScheduledEvent<P>>>,
    index: HashMap<EventId, SimTime>,
    next_id: u64,
    slack: SimTime,
    stats: TimelineStats,
}

impl<P> Timeline<P> {
    /// Creates a running timeline at epoch 0.
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self::with_config(clock, TimelineConfig::default())
    }

    /// Creates a timeline with explicit parameters.
    pub fn with_config(clock: Arc<dyn TimeSource>, config: TimelineConfig) -> Self {
        let mut timeline = Self {
            clock,
            epoch: 0,
            paused_at: None,
            frozen_at: None,
            queue: BTreeMap::new(),
            index: HashMap::new(),
            next_id: 0,
            slack: config.slack,
            stats: TimelineStats::default(),
        };
        if config.start_paused {
            timeline.pause();
        }
        timeline
    }

    /// Current logical time.
    ///
    /// Pinned while a batch runs, frozen while paused.
    pub fn now(&self) -> SimTime {
        if let Some(t) = self.frozen_at {
            return t;
        }
        if let Some(t) = self.paused_at {
            return t;
        }
        self.running_now()
    }

    fn running_now(&self) -> SimTime {
        (self.clock.now() as i64 - self.epoch).max(0) as SimTime
    }

    /// Returns true while paused.
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    /// Returns true while a batch is executing.
    pub fn is_frozen(&self) -> bool {
        self.frozen_at.is_some()
    }

    /// Lateness tolerated before the epoch absorbs the excess.
    pub fn slack(&self) -> SimTime {
        self.slack
    }

    /// Schedules `payload` to fire at `time`.
    ///
    /// Timestamps earlier than [`now`](Self::now) are accepted with a
    /// warning and run on the next drain.
    pub fn schedule_at(
        &mut self,
        time: SimTime,
        payload: P,
        label: impl Into<String>,
        blocks_auto_pause: bool,
    ) -> EventId {
        let now = self.now();
        let label = label.into();
        if time < now {
            tracing::warn!(
                time,
                now,
                label = %label,
                "event scheduled in the past, running on next drain"
            );
            self.stats.past_scheduled += 1;
        }

        let id = EventId::new(self.next_id);
        self.next_id += 1;
        self.stats.scheduled += 1;

        self.queue.entry(time).or_default().push(ScheduledEvent {
            id,
            time,
            scheduled_at: now,
            label,
            blocks_auto_pause,
            payload,
        });
        self.index.insert(id, time);
        id
    }

    /// Schedules `payload` to fire `delay` units after now.
    pub fn schedule_after(
        &mut self,
        delay: SimTime,
        payload: P,
        label: impl Into<String>,
        blocks_auto_pause: bool,
    ) -> EventId {
        let at = self.now().saturating_add(delay);
        self.schedule_at(at, payload, label, blocks_auto_pause)
    }

    /// Removes one pending event. Returns false if it already ran or never existed.
    pub fn cancel(&mut self, id: EventId) -> bool {
        let Some(time) = self.index.remove(&id) else {
            return false;
        };
        let mut removed = false;
        if let Some(events) = self.queue.get_mut(&time) {
            let before = events.len();
            events.retain(|e| e.id != id);
            removed = events.len() != before;
            if events.is_empty() {
                self.queue.remove(&time);
            }
        }
        if removed {
            self.stats.cancelled += 1;
        }
        removed
    }

    /// Takes the earliest batch if it is due and the timeline is running.
    ///
    /// Logical time stays pinned to the batch instant until
    /// [`finish_batch`](Self::finish_batch).
    pub fn take_due(&mut self) -> Option<Batch<P>> {
        if self.is_paused() || self.is_frozen() {
            return None;
        }
        let (&time, events) = self.queue.first_key_value()?;
        let due = events.iter().map(|e| e.due()).min().unwrap_or(time);
        let now = self.running_now();
        if time > now {
            return None;
        }

        let lateness = now.saturating_sub(due);
        if lateness > self.slack {
            tracing::warn!(
                lateness,
                slack = self.slack,
                "timeline fell behind, shifting epoch"
            );
            self.epoch += lateness as i64;
            self.stats.late_batches += 1;
            self.stats.absorbed_lateness += lateness;
        }

        let pinned = due.min(self.running_now()).max(time);
        Some(self.pop_front(pinned))
    }

    /// Executes the next pending batch while paused and stays paused.
    ///
    /// Logical time jumps forward to the batch instant. Returns `Ok(None)`
    /// when nothing is pending.
    pub fn step(&mut self) -> Result<Option<Batch<P>>, TimelineError> {
        self.step_until(SimTime::MAX)
    }

    /// Like [`step`](Self::step), but only if the next batch is at or before `limit`.
    pub fn step_until(&mut self, limit: SimTime) -> Result<Option<Batch<P>>, TimelineError> {
        let paused_at = self.paused_at.ok_or(TimelineError::NotPaused)?;
        if self.is_frozen() {
            return Ok(None);
        }
        let time = match self.queue.first_key_value() {
            Some((&time, _)) if time <= limit => time,
            _ => return Ok(None),
        };
        let pinned = time.max(paused_at);
        self.paused_at = Some(pinned);
        Ok(Some(self.pop_front(pinned)))
    }

    /// Moves paused logical time forward to `target` without running anything.
    pub fn advance_paused_to(&mut self, target: SimTime) -> Result<(), TimelineError> {
        let paused_at = self.paused_at.ok_or(TimelineError::NotPaused)?;
        self.paused_at = Some(paused_at.max(target));
        Ok(())
    }

    fn pop_front(&mut self, pinned: SimTime) -> Batch<P> {
        let (_, events) = self
            .queue
            .pop_first()
            .unwrap_or_else(|| (pinned, Vec::new()));
        for e in &events {
            self.index.remove(&e.id);
        }
        self.stats.fired += events.len() as u64;
        self.frozen_at = Some(pinned);
        Batch {
            time: pinned,
            events,
        }
    }

    /// Unpins logical time after a batch has completed.
    pub fn finish_batch(&mut self) {
        self.frozen_at = None;
    }

    /// Freezes logical time. Idempotent.
    pub fn pause(&mut self) {
        if self.paused_at.is_none() {
            let now = self.now();
            tracing::debug!(now, "timeline paused");
            self.paused_at = Some(now);
        }
    }

    /// Resumes from the paused logical time, discounting the pause.
    pub fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.epoch = self.clock.now() as i64 - paused_at as i64;
            tracing::debug!(now = paused_at, "timeline resumed");
        }
    }

    /// Drops every pending event and restarts logical time at zero.
    pub fn reset(&mut self, paused: bool) {
        self.queue.clear();
        self.index.clear();
        self.frozen_at = None;
        self.epoch = self.clock.now() as i64;
        self.paused_at = if paused { Some(0) } else { None };
        tracing::debug!(paused, "timeline reset");
    }

    /// Number of pending events.
    pub fn pending_count(&self) -> usize {
        self.index.len()
    }

    /// Returns true if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Timestamp of the earliest pending batch.
    pub fn next_event_time(&self) -> Option<SimTime> {
        self.queue.keys().next().copied()
    }

    /// Label of the first event in the earliest pending batch.
    pub fn next_event_description(&self) -> Option<&str> {
        self.queue
            .values()
            .next()
            .and_then(|events| events.first())
            .map(|e| e.label.as_str())
    }

    /// Number of pending events flagged as making a pause control meaningful.
    pub fn auto_pause_blockers(&self) -> usize {
        self.pending().filter(|e| e.blocks_auto_pause).count()
    }

    /// Logical time remaining until the next batch is due.
    ///
    /// `None` while paused or when nothing is pending.
    pub fn time_until_next(&self) -> Option<SimTime> {
        if self.is_paused() {
            return None;
        }
        self.next_event_time()
            .map(|t| t.saturating_sub(self.now()))
    }

    /// Pending events in firing order.
    pub fn pending(&self) -> impl Iterator<Item = &ScheduledEvent<P>> {
        self.queue.values().flatten()
    }

    /// Returns the counters.
    pub fn stats(&self) -> &TimelineStats {
        &self.stats
    }
}

impl<P> std::fmt::Debug for Timeline<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timeline")
            .field("now", &self.now())
            .field("paused", &self.is_paused())
            .field("pending", &self.pending_count())
            .finish()
    }
}
