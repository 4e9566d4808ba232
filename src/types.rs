//! Core type definitions for the simulation engine.
//!
//! This module defines the identifiers and time unit shared by every other module.

use serde::{Deserialize, Serialize};

/// Logical simulation time.
///
/// All scheduled events, propagation delays and clock periods use the same
/// `SimTime` representation. When driven by [`SystemClock`](crate::clock::SystemClock)
/// one unit corresponds to one millisecond of unpaused wall time.
pub type SimTime = u64;

/// Unique identifier for a component in the circuit.
pub type ComponentId = u64;

/// Unique identifier for a wire in the circuit.
pub type WireId = u64;

/// Direction of a pin relative to its owning component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinDirection {
    /// Value is resolved from attached wires.
    Input,
    /// Value is written by the owning component's evaluation.
    Output,
}

/// Address of a single pin: owning component, direction and index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinRef {
    /// The owning component
    pub component: ComponentId,
    /// Input or output side
    pub direction: PinDirection,
    /// Index within that side's pin list
    pub index: usize,
}

impl PinRef {
    /// Addresses input pin `index` of `component`.
    pub fn input(component: ComponentId, index: usize) -> Self {
        Self {
            component,
            direction: PinDirection::Input,
            index,
        }
    }

    /// Addresses output pin `index` of `component`.
    pub fn output(component: ComponentId, index: usize) -> Self {
        Self {
            component,
            direction: PinDirection::Output,
            index,
        }
    }
}

impl std::fmt::Display for PinRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let side = match self.direction {
            PinDirection::Input => "in",
            PinDirection::Output => "out",
        };
        write!(f, "c{}.{}{}", self.component, side, self.index)
    }
}
