//! Event definitions for the timeline.
//!
//! A [`ScheduledEvent`] binds a payload to a logical timestamp. The
//! simulation's payloads are the tagged [`SimEvent`] variants, interpreted
//! by a single dispatch function, so the pending queue can be inspected
//! and tested without executing anything.

use serde::{Deserialize, Serialize};

use crate::types::{ComponentId, SimTime, WireId};
use crate::value::LogicValue;

/// Identifier assigned to every scheduled event, strictly increasing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(u64);

impl EventId {
    /// Wraps a raw value.
    pub fn new(raw: u64) -> Self {
        EventId(raw)
    }

    /// The raw value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "E#{}", self.0)
    }
}

/// A deferred payload bound to a logical timestamp.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScheduledEvent<P> {
    /// Assigned on scheduling
    pub id: EventId,
    /// The logical time at which this event fires
    pub time: SimTime,
    /// Logical time when the event was scheduled
    pub scheduled_at: SimTime,
    /// Human-readable description, surfaced as "next event"
    pub label: String,
    /// Whether this event makes offering a pause control meaningful
    pub blocks_auto_pause: bool,
    /// What to do when the event fires
    pub payload: P,
}

impl<P> ScheduledEvent<P> {
    /// The earliest logical instant at which this event could run.
    ///
    /// Equals `time` unless the event was scheduled in the past.
    pub fn due(&self) -> SimTime {
        self.time.max(self.scheduled_at)
    }
}

/// Direction of a clock transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    /// The output level right after this edge.
    pub fn level(self) -> LogicValue {
        match self {
            Edge::Rising => LogicValue::High,
            Edge::Falling => LogicValue::Low,
        }
    }

    /// The edge that follows this one.
    pub fn opposite(self) -> Edge {
        match self {
            Edge::Rising => Edge::Falling,
            Edge::Falling => Edge::Rising,
        }
    }
}

/// Timeline payloads understood by [`Simulation`](crate::Simulation).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimEvent {
    /// Re-evaluate a component.
    MarkDirty { component: ComponentId },

    /// A delayed output reaches its pin.
    DriveOutput {
        component: ComponentId,
        output: usize,
        value: LogicValue,
    },

    /// A delayed wire delivers to its destination.
    WireTransfer { wire: WireId, value: LogicValue },

    /// A self-scheduled clock transition.
    ClockEdge { component: ComponentId, edge: Edge },
}

impl SimEvent {
    /// The component this event acts on, if it targets one directly.
    pub fn component(&self) -> Option<ComponentId> {
        match self {
            SimEvent::MarkDirty { component }
            | SimEvent::DriveOutput { component, .. }
            | SimEvent::ClockEdge { component, .. } => Some(*component),
            SimEvent::WireTransfer { .. } => None,
        }
    }

    /// A default label for the timeline.
    pub fn describe(&self) -> String {
        match self {
            SimEvent::MarkDirty { component } => format!("recalculate c{}", component),
            SimEvent::DriveOutput {
                component,
                output,
                value,
            } => format!("c{}.out{} <= {}", component, output, value),
            SimEvent::WireTransfer { wire, value } => format!("w{} <= {}", wire, value),
            SimEvent::ClockEdge { component, edge } => {
                format!("clock c{} {:?}", component, edge).to_lowercase()
            }
        }
    }
}
