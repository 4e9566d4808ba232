//! Per-pin value resolution.
//!
//! An input pin's value is a pure function of the values carried by its
//! attached wires. How concurrent drivers combine is a per-pin policy
//! ([`DriverResolution`]); what an unattached input reads is a
//! simulation-wide policy ([`UnconnectedInput`]).

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::value::{resolve_drivers, LogicValue};

/// A wired resolution policy: how concurrent drivers on one point combine.
pub trait DriverResolution: Send + Sync + std::fmt::Debug {
    /// Combines the carried values of every attached driver.
    fn resolve(&self, drivers: &[LogicValue]) -> LogicValue;
}

/// Built-in resolution policies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// [`resolve_drivers`]: disagreeing driven values become `Unknown`.
    #[default]
    Standard,
    /// Any `High` driver wins.
    WiredOr,
    /// Any `Low` driver wins.
    WiredAnd,
}

impl Resolution {
    /// Wraps the policy for storage on a pin.
    pub fn shared(self) -> Arc<dyn DriverResolution> {
        Arc::new(self)
    }
}

impl DriverResolution for Resolution {
    fn resolve(&self, drivers: &[LogicValue]) -> LogicValue {
        match self {
            Resolution::Standard => resolve_drivers(drivers),
            Resolution::WiredOr => dominant(drivers, LogicValue::High),
            Resolution::WiredAnd => dominant(drivers, LogicValue::Low),
        }
    }
}

/// Wired arbitration where `winner` overrides every other driven value.
fn dominant(drivers: &[LogicValue], winner: LogicValue) -> LogicValue {
    if drivers.contains(&winner) {
        return winner;
    }
    resolve_drivers(drivers)
}

/// What an input pin with no attached wires reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnconnectedInput {
    /// Untouched inputs read as a driven `Low`.
    #[default]
    Low,
    /// Untouched inputs float, which usually surfaces as `Unknown` downstream.
    HighZ,
}

impl UnconnectedInput {
    /// The value an unattached input resolves to.
    pub fn value(self) -> LogicValue {
        match self {
            UnconnectedInput::Low => LogicValue::Low,
            UnconnectedInput::HighZ => LogicValue::HighZ,
        }
    }
}

/// Resolves one input pin from its attached wires' carried values.
pub fn resolve_input(
    carried: &[LogicValue],
    policy: &dyn DriverResolution,
    unconnected: UnconnectedInput,
) -> LogicValue {
    if carried.is_empty() {
        unconnected.value()
    } else {
        policy.resolve(carried)
    }
}
