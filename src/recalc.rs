//! Dirty tracking and queue-draining propagation.
//!
//! The [`RecalcManager`] keeps a FIFO worklist of components whose inputs
//! changed. [`run_pending`](RecalcManager::run_pending) pops one at a time,
//! evaluates it against a snapshot of its inputs and fans out the outputs
//! that changed:
//!
//! - zero-delay outputs are written immediately and zero-delay wires mark
//!   their targets dirty, which appends them to the same worklist;
//! - delayed outputs and delayed wires become `DriveOutput` and
//!   `WireTransfer` events on the timeline.
//!
//! There is no topological ordering. Feedback loops converge through the
//! four-valued algebra or hit the per-pass visit bound.

use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::circuit::Circuit;
use crate::component::{ComponentStatus, EdgeRequest, EvalContext};
use crate::error::{EvalError, ReentrancyError};
use crate::event::SimEvent;
use crate::timeline::Timeline;
use crate::types::ComponentId;
use crate::value::LogicValue;

/// Default per-pass evaluation bound for a single component.
pub const DEFAULT_MAX_VISITS: u32 = 1000;

/// Outcome of one [`run_pending`](RecalcManager::run_pending) pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Successful evaluations
    pub evaluations: u64,
    /// Failed evaluations in the order they happened
    pub errors: Vec<(ComponentId, EvalError)>,
    /// Components dropped after exceeding the visit bound
    pub oscillating: Vec<ComponentId>,
    /// Components whose dirtying was rejected because they were evaluating
    pub rejected: Vec<ComponentId>,
}

impl PassReport {
    /// Returns true if nothing went wrong during the pass.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.oscillating.is_empty() && self.rejected.is_empty()
    }

    /// Folds another report into this one.
    pub fn merge(&mut self, other: PassReport) {
        self.evaluations += other.evaluations;
        self.errors.extend(other.errors);
        for id in other.oscillating {
            if !self.oscillating.contains(&id) {
                self.oscillating.push(id);
            }
        }
        self.rejected.extend(other.rejected);
    }
}

/// Lifetime counters of a [`RecalcManager`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RecalcStats {
    pub passes: u64,
    pub evaluations: u64,
    pub evaluation_errors: u64,
    pub reentrancy_rejections: u64,
    pub oscillation_cutoffs: u64,
}

/// The dirty worklist and its drain loop.
#[derive(Debug)]
pub struct RecalcManager {
    worklist: VecDeque<ComponentId>,
    queued: HashSet<ComponentId>,
    max_visits: u32,
    verify_combinational: bool,
    stats: RecalcStats,
}

impl Default for RecalcManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_VISITS)
    }
}

impl RecalcManager {
    /// Creates a manager that drops a component after `max_visits` evaluations in one pass.
    pub fn new(max_visits: u32) -> Self {
        Self {
            worklist: VecDeque::new(),
            queued: HashSet::new(),
            max_visits: max_visits.max(1),
            verify_combinational: false,
            stats: RecalcStats::default(),
        }
    }

    /// Re-evaluates combinational components to catch non-idempotent results.
    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify_combinational = enabled;
        self
    }

    /// Per-pass evaluation bound for a single component.
    pub fn max_visits(&self) -> u32 {
        self.max_visits
    }

    /// Queues a component for evaluation.
    ///
    /// Returns `Ok(true)` if it was newly queued and `Ok(false)` if it was
    /// already queued or does not exist. Fails while the component is
    /// evaluating.
    pub fn mark_dirty(
        &mut self,
        circuit: &mut Circuit,
        id: ComponentId,
    ) -> Result<bool, ReentrancyError> {
        let Some(slot) = circuit.slot_mut(id) else {
            return Ok(false);
        };
        if slot.status == ComponentStatus::Evaluating {
            self.stats.reentrancy_rejections += 1;
            return Err(ReentrancyError(id));
        }
        if !self.queued.insert(id) {
            return Ok(false);
        }
        slot.status = ComponentStatus::Dirty;
        self.worklist.push_back(id);
        Ok(true)
    }

    /// Returns true if `id` is waiting in the worklist.
    pub fn is_queued(&self, id: ComponentId) -> bool {
        self.queued.contains(&id)
    }

    /// Number of components waiting.
    pub fn pending_len(&self) -> usize {
        self.worklist.len()
    }

    /// Returns true if the worklist is empty.
    pub fn is_idle(&self) -> bool {
        self.worklist.is_empty()
    }

    /// Forgets every queued component.
    pub fn clear(&mut self) {
        self.worklist.clear();
        self.queued.clear();
    }

    /// Counters accumulated since creation.
    pub fn stats(&self) -> &RecalcStats {
        &self.stats
    }

    /// Drains the worklist until it is empty.
    pub fn run_pending(
        &mut self,
        circuit: &mut Circuit,
        timeline: &mut Timeline<SimEvent>,
    ) -> PassReport {
        let mut report = PassReport::default();
        if self.worklist.is_empty() {
            return report;
        }
        self.stats.passes += 1;
        let mut visits: HashMap<ComponentId, u32> = HashMap::new();

        while let Some(id) = self.worklist.pop_front() {
            self.queued.remove(&id);
            let Some(slot) = circuit.slot_mut(id) else {
                continue;
            };

            let count = visits.entry(id).or_insert(0);
            *count += 1;
            if *count > self.max_visits {
                slot.status = ComponentStatus::Clean;
                if !report.oscillating.contains(&id) {
                    tracing::warn!(
                        component = id,
                        name = %slot.name,
                        visits = self.max_visits,
                        "component exceeded visit bound, dropping for this pass"
                    );
                    self.stats.oscillation_cutoffs += 1;
                    report.oscillating.push(id);
                }
                continue;
            }

            self.evaluate(circuit, timeline, id, &mut report);
        }

        report
    }

    fn evaluate(
        &mut self,
        circuit: &mut Circuit,
        timeline: &mut Timeline<SimEvent>,
        id: ComponentId,
        report: &mut PassReport,
    ) {
        let now = timeline.now();
        let verify = self.verify_combinational;
        let Some(slot) = circuit.slot_mut(id) else {
            return;
        };

        slot.status = ComponentStatus::Evaluating;
        let inputs = slot.input_values();
        let mut ctx = EvalContext::new(id, now);
        let result = match slot.component.evaluate(&inputs, &mut ctx) {
            Ok(outputs) if outputs.len() != slot.outputs.len() => Err(EvalError::OutputArity {
                expected: slot.outputs.len(),
                actual: outputs.len(),
            }),
            Ok(outputs) if verify && slot.component.is_combinational() => {
                let mut again = EvalContext::new(id, now);
                match slot.component.evaluate(&inputs, &mut again) {
                    Ok(second) if second == outputs => Ok(outputs),
                    Ok(_) => Err(EvalError::NonIdempotent),
                    Err(e) => Err(e),
                }
            }
            other => other,
        };
        schedule_edge_requests(timeline, id, ctx.into_requests());

        let outputs = match result {
            Ok(outputs) => outputs,
            Err(e) => {
                tracing::warn!(
                    component = id,
                    name = %slot.name,
                    error = %e,
                    "evaluation failed, keeping previous outputs"
                );
                slot.last_error = Some(e.clone());
                slot.status = ComponentStatus::Clean;
                self.stats.evaluation_errors += 1;
                report.errors.push((id, e));
                return;
            }
        };

        slot.last_error = None;
        self.stats.evaluations += 1;
        report.evaluations += 1;

        let mut immediate = Vec::new();
        for (index, value) in outputs.into_iter().enumerate() {
            let pin = &mut slot.outputs[index];
            if pin.projected == value {
                continue;
            }
            pin.projected = value;
            match slot.component.output_delay(index) {
                0 => immediate.push((index, value)),
                delay => {
                    let event = SimEvent::DriveOutput {
                        component: id,
                        output: index,
                        value,
                    };
                    let label = event.describe();
                    timeline.schedule_at(now.saturating_add(delay), event, label, false);
                }
            }
        }
        tracing::trace!(component = id, changed = immediate.len(), "evaluated");

        for (index, value) in immediate {
            let rejected = self.apply_output(circuit, timeline, id, index, value);
            report.rejected.extend(rejected);
        }

        if let Some(slot) = circuit.slot_mut(id) {
            slot.status = ComponentStatus::Clean;
        }
    }

    /// Writes an output pin and fans the change out over its wires.
    ///
    /// Zero-delay wires deliver now and dirty their targets; delayed wires
    /// schedule a `WireTransfer`. Returns the targets whose dirtying was
    /// rejected.
    pub fn apply_output(
        &mut self,
        circuit: &mut Circuit,
        timeline: &mut Timeline<SimEvent>,
        component: ComponentId,
        index: usize,
        value: LogicValue,
    ) -> Vec<ComponentId> {
        let Some(wires) = circuit.set_output(component, index, value) else {
            return Vec::new();
        };
        let now = timeline.now();
        let mut rejected = Vec::new();

        for wire in wires {
            let Some(delay) = circuit.wire(wire).map(|w| w.delay) else {
                continue;
            };
            if delay > 0 {
                let event = SimEvent::WireTransfer { wire, value };
                let label = event.describe();
                timeline.schedule_at(now.saturating_add(delay), event, label, false);
                continue;
            }
            if let Some(target) = circuit.deliver(wire, value) {
                if let Err(e) = self.mark_dirty(circuit, target) {
                    tracing::warn!(error = %e, wire, "zero-delay feedback rejected");
                    rejected.push(e.0);
                }
            }
        }
        rejected
    }
}

/// Turns component edge requests into `ClockEdge` events.
///
/// Clock edges keep a simulation alive, so they count as auto-pause blockers.
pub fn schedule_edge_requests(
    timeline: &mut Timeline<SimEvent>,
    component: ComponentId,
    requests: Vec<EdgeRequest>,
) {
    for EdgeRequest { at, edge } in requests {
        let event = SimEvent::ClockEdge { component, edge };
        let label = event.describe();
        timeline.schedule_at(at, event, label, true);
    }
}
