//! The component evaluation contract.
//!
//! Every logic element implements [`Component`]. The simulation owns the
//! pins; a component only sees a snapshot of its resolved input values and
//! returns the values it wants on its outputs. Periodic behaviour is
//! expressed through [`EvalContext::schedule_edge`], which the simulation
//! turns into `ClockEdge` timeline events.

use serde::{Deserialize, Serialize};
use std::any::Any;

use crate::error::EvalResult;
use crate::event::Edge;
use crate::resolver::Resolution;
use crate::types::{ComponentId, SimTime};
use crate::value::LogicValue;

/// Evaluation state of a component.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    /// Outputs reflect the current inputs
    #[default]
    Clean,
    /// Queued for re-evaluation
    Dirty,
    /// Currently being evaluated or fanning out its outputs
    Evaluating,
}

/// A future clock transition requested by a component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeRequest {
    /// Logical time of the transition
    pub at: SimTime,
    /// Which transition
    pub edge: Edge,
}

/// What a component may observe and request while it runs.
#[derive(Debug)]
pub struct EvalContext {
    component: ComponentId,
    now: SimTime,
    requests: Vec<EdgeRequest>,
}

impl EvalContext {
    /// Creates a context for `component` at logical time `now`.
    pub fn new(component: ComponentId, now: SimTime) -> Self {
        Self {
            component,
            now,
            requests: Vec::new(),
        }
    }

    /// The component being run.
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Logical time, stable for the whole call.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Requests a [`Component::clock_edge`] callback at `at`.
    pub fn schedule_edge(&mut self, at: SimTime, edge: Edge) {
        self.requests.push(EdgeRequest { at, edge });
    }

    /// Consumes the context, returning the requests in the order they were made.
    pub fn into_requests(self) -> Vec<EdgeRequest> {
        self.requests
    }
}

/// The interface every logic element implements.
///
/// Pin counts are fixed for the lifetime of the component. `evaluate`
/// must return exactly `output_count()` values; combinational components
/// must return the same outputs for the same inputs.
pub trait Component: Send {
    /// Short type name, used in logs and stats.
    fn type_name(&self) -> &str;

    /// Number of input pins.
    fn input_count(&self) -> usize;

    /// Number of output pins.
    fn output_count(&self) -> usize;

    /// Output values before the first evaluation.
    fn initial_outputs(&self) -> Vec<LogicValue> {
        vec![LogicValue::Low; self.output_count()]
    }

    /// Computes new outputs from a stable snapshot of the inputs.
    fn evaluate(&mut self, inputs: &[LogicValue], ctx: &mut EvalContext)
        -> EvalResult<Vec<LogicValue>>;

    /// Propagation delay applied to output `output`.
    fn output_delay(&self, _output: usize) -> SimTime {
        0
    }

    /// How concurrent drivers on input `input` combine.
    fn input_resolution(&self, _input: usize) -> Resolution {
        Resolution::Standard
    }

    /// Whether outputs depend on inputs alone.
    fn is_combinational(&self) -> bool {
        true
    }

    /// Called once when the component joins a simulation and after a reset.
    ///
    /// Clocks use this to request their first edge.
    fn start(&mut self, _ctx: &mut EvalContext) {}

    /// Called when a requested edge fires. The component is re-evaluated afterwards.
    fn clock_edge(&mut self, _edge: Edge, _ctx: &mut EvalContext) {}

    /// Accepts an externally applied value. Returns false if the component has no such entry point.
    fn accept_input(&mut self, _value: LogicValue) -> bool {
        false
    }

    /// Restores internal state to its initial value.
    fn reset(&mut self) {}

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
