//! The simulation context.
//!
//! A [`Simulation`] owns one [`Circuit`], one [`Timeline`] and one
//! [`RecalcManager`]; nothing is global. Hosts drive it in one of two ways:
//!
//! - **running**: call [`poll`](Simulation::poll) from a loop, sleeping for
//!   [`time_until_next_event`](Simulation::time_until_next_event) in between;
//! - **paused**: call [`step`](Simulation::step) or
//!   [`run_until`](Simulation::run_until) for deterministic stepping.
//!
//! Structural edits (`add_component`, `connect`, ...) only mark components
//! dirty. [`set_input`](Simulation::set_input) drains immediately, and
//! [`settle`](Simulation::settle) drains everything due now.

use std::collections::HashMap;
use std::sync::Arc;

use crate::circuit::{Circuit, ComponentSlot};
use crate::clock::TimeSource;
use crate::component::{Component, ComponentStatus, EvalContext};
use crate::config::{SimConfig, SimulationParams};
use crate::error::{CircuitError, EvalError, ReentrancyError, SimResult};
use crate::event::{EventId, ScheduledEvent, SimEvent};
use crate::quiescence::{Quiescence, QuiescenceSignal};
use crate::recalc::{schedule_edge_requests, PassReport, RecalcManager};
use crate::registry::{Attrs, ComponentRegistry};
use crate::resolver::DriverResolution;
use crate::stats::{ComponentStats, EngineStats, SimulationStats};
use crate::timeline::{Batch, Timeline};
use crate::types::{ComponentId, PinRef, SimTime, WireId};
use crate::value::LogicValue;

/// A circuit together with its scheduler and clock.
///
/// # Example
///
/// ```rust
/// use quadsim::components::{Combinational, InputSwitch};
/// use quadsim::{LogicValue, ManualClock, PinRef, Simulation};
/// use std::sync::Arc;
///
/// let mut sim = Simulation::new(Arc::new(ManualClock::new()));
/// let a = sim.add_component("a", Box::new(InputSwitch::new(LogicValue::Low)));
/// let b = sim.add_component("b", Box::new(InputSwitch::new(LogicValue::Low)));
/// let and = sim.add_component("and", Box::new(Combinational::and(2)));
/// sim.connect(PinRef::output(a, 0), PinRef::input(and, 0)).unwrap();
/// sim.connect(PinRef::output(b, 0), PinRef::input(and, 1)).unwrap();
/// sim.settle();
///
/// sim.set_input(a, LogicValue::High).unwrap();
/// sim.set_input(b, LogicValue::High).unwrap();
/// assert_eq!(sim.output_value(and, 0).unwrap(), LogicValue::High);
/// ```
pub struct Simulation {
    circuit: Circuit,
    timeline: Timeline<SimEvent>,
    recalc: RecalcManager,
    stats: EngineStats,
    waiters: Vec<QuiescenceSignal>,
}

impl Simulation {
    /// Creates a simulation with default parameters.
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self::with_params(clock, &SimulationParams::default())
    }

    /// Creates a simulation from explicit engine parameters.
    pub fn with_params(clock: Arc<dyn TimeSource>, params: &SimulationParams) -> Self {
        tracing::debug!(
            max_visits = params.max_visits_per_pass,
            slack = params.slack,
            unconnected = ?params.unconnected_input,
            "creating simulation"
        );
        Self {
            circuit: Circuit::new(params.unconnected_input),
            timeline: Timeline::with_config(clock, params.timeline_config()),
            recalc: RecalcManager::new(params.max_visits_per_pass)
                .with_verification(params.verify_combinational),
            stats: EngineStats::default(),
            waiters: Vec::new(),
        }
    }

    /// Creates a simulation from a loaded configuration file.
    pub fn from_config(clock: Arc<dyn TimeSource>, config: &SimConfig) -> Self {
        Self::with_params(clock, &config.simulation)
    }

    // ==================== Structure ====================

    /// Adds a component, starts it and marks it dirty.
    pub fn add_component(
        &mut self,
        name: impl Into<String>,
        component: Box<dyn Component>,
    ) -> ComponentId {
        let name = name.into();
        let type_name = component.type_name().to_string();
        let id = self.circuit.add(name.clone(), component);
        self.start_component(id);
        self.mark_or_log(id);
        tracing::debug!(component = id, name = %name, kind = %type_name, "component added");
        id
    }

    /// Creates a component through `registry` and adds it.
    ///
    /// Nothing is added if the type is unknown or an attribute is malformed.
    pub fn instantiate(
        &mut self,
        registry: &ComponentRegistry,
        type_name: &str,
        name: impl Into<String>,
        attrs: &Attrs,
    ) -> SimResult<ComponentId> {
        let component = registry.create(type_name, attrs)?;
        Ok(self.add_component(name, component))
    }

    /// Removes a component and every wire touching it.
    ///
    /// Pending events aimed at it are dropped when they fire.
    pub fn remove_component(&mut self, id: ComponentId) -> SimResult<Box<dyn Component>> {
        let (slot, affected) = self.circuit.remove(id)?;
        for target in affected {
            self.mark_or_log(target);
        }
        tracing::debug!(component = id, name = %slot.name, "component removed");
        Ok(slot.component)
    }

    /// Connects an output pin to an input pin with no delay.
    pub fn connect(&mut self, source: PinRef, target: PinRef) -> SimResult<WireId> {
        self.connect_with_delay(source, target, 0)
    }

    /// Connects an output pin to an input pin through a delayed wire.
    pub fn connect_with_delay(
        &mut self,
        source: PinRef,
        target: PinRef,
        delay: SimTime,
    ) -> SimResult<WireId> {
        let (wire, changed) = self.circuit.connect(source, target, delay)?;
        if let Some(id) = changed {
            self.mark_or_log(id);
        }
        tracing::debug!(wire, %source, %target, delay, "connected");
        Ok(wire)
    }

    /// Removes a wire.
    pub fn disconnect(&mut self, wire: WireId) -> SimResult<()> {
        if let Some(id) = self.circuit.disconnect(wire)? {
            self.mark_or_log(id);
        }
        Ok(())
    }

    /// Installs a resolution policy on one input pin.
    pub fn set_input_resolution(
        &mut self,
        pin: PinRef,
        policy: Arc<dyn DriverResolution>,
    ) -> SimResult<()> {
        if let Some(id) = self.circuit.set_input_policy(pin, policy)? {
            self.mark_or_log(id);
        }
        Ok(())
    }

    // ==================== Propagation ====================

    /// Applies an external value to an input component and drains.
    pub fn set_input(&mut self, id: ComponentId, value: LogicValue) -> SimResult<PassReport> {
        let slot = self
            .circuit
            .slot_mut(id)
            .ok_or(CircuitError::UnknownComponent(id))?;
        if !slot.component.accept_input(value) {
            return Err(CircuitError::NotAnInput(id).into());
        }
        self.stats.inputs_applied += 1;
        self.recalc.mark_dirty(&mut self.circuit, id)?;
        Ok(self.run_pending())
    }

    /// Queues a component for evaluation.
    pub fn mark_dirty(&mut self, id: ComponentId) -> Result<bool, ReentrancyError> {
        self.recalc.mark_dirty(&mut self.circuit, id)
    }

    /// Evaluates every dirty component until none remain.
    pub fn run_pending(&mut self) -> PassReport {
        let report = self.recalc.run_pending(&mut self.circuit, &mut self.timeline);
        self.notify_waiters();
        report
    }

    /// Drains dirty components and every batch due at the current time.
    ///
    /// Works in both states. Deterministic when no component depends on
    /// real time. At most as many events run as were pending on entry;
    /// anything scheduled during the drain waits for the next call.
    pub fn settle(&mut self) -> PassReport {
        let mut report = self.run_pending();
        let mut budget = self.timeline.pending_count();
        while budget > 0 {
            let batch = if self.timeline.is_paused() {
                let now = self.timeline.now();
                self.timeline.step_until(now).ok().flatten()
            } else {
                self.timeline.take_due()
            };
            let Some(batch) = batch else { break };
            budget = budget.saturating_sub(batch.events.len().max(1));
            report.merge(self.process_batch(batch));
        }
        report
    }

    /// Host-loop entry point: drains and runs every due batch.
    ///
    /// Does nothing to the timeline while paused. Bounded like
    /// [`settle`](Self::settle), so a batch that keeps scheduling work at
    /// its own instant cannot hold the host loop.
    pub fn poll(&mut self) -> PassReport {
        let mut report = self.run_pending();
        let mut budget = self.timeline.pending_count();
        while budget > 0 {
            let Some(batch) = self.timeline.take_due() else { break };
            budget = budget.saturating_sub(batch.events.len().max(1));
            report.merge(self.process_batch(batch));
        }
        report
    }

    /// Runs the next pending batch while paused.
    ///
    /// Returns the batch time, or `None` if nothing is pending.
    pub fn step(&mut self) -> SimResult<Option<SimTime>> {
        self.run_pending();
        let Some(batch) = self.timeline.step()? else {
            return Ok(None);
        };
        let time = batch.time;
        self.process_batch(batch);
        Ok(Some(time))
    }

    /// Runs every batch up to and including `target` while paused, then
    /// leaves logical time at `target`.
    ///
    /// Each instant gets a budget of the events pending when time first
    /// reaches it. If work keeps landing on one instant past that budget,
    /// the run stops there and logical time stays at that instant.
    pub fn run_until(&mut self, target: SimTime) -> SimResult<PassReport> {
        let mut report = self.run_pending();
        let mut instant = self.timeline.now();
        let mut budget = self.timeline.pending_count();
        while let Some(next) = self.timeline.next_event_time().filter(|&t| t <= target) {
            if next > instant {
                instant = next;
                budget = self.timeline.pending_count();
            }
            if budget == 0 {
                tracing::warn!(instant, "event budget exhausted before reaching target");
                return Ok(report);
            }
            let Some(batch) = self.timeline.step_until(target)? else {
                break;
            };
            budget = budget.saturating_sub(batch.events.len().max(1));
            report.merge(self.process_batch(batch));
        }
        self.timeline.advance_paused_to(target)?;
        Ok(report)
    }

    fn process_batch(&mut self, batch: Batch<SimEvent>) -> PassReport {
        tracing::trace!(time = batch.time, events = batch.events.len(), "batch");
        self.stats.batches_executed += 1;
        for event in batch.events {
            self.dispatch(event);
        }
        let report = self.recalc.run_pending(&mut self.circuit, &mut self.timeline);
        self.timeline.finish_batch();
        self.notify_waiters();
        report
    }

    /// Interprets one timeline payload.
    fn dispatch(&mut self, event: ScheduledEvent<SimEvent>) {
        if self.apply_event(event.payload) {
            self.stats.events_dispatched += 1;
        } else {
            self.stats.events_dropped += 1;
            tracing::debug!(id = %event.id, label = %event.label, "dropping event for missing target");
        }
    }

    /// Returns false if the event's component or wire no longer exists.
    fn apply_event(&mut self, payload: SimEvent) -> bool {
        match payload {
            SimEvent::MarkDirty { component } => {
                if self.circuit.slot(component).is_none() {
                    return false;
                }
                self.mark_or_log(component);
            }
            SimEvent::DriveOutput {
                component,
                output,
                value,
            } => {
                if self.circuit.slot(component).is_none() {
                    return false;
                }
                self.recalc.apply_output(
                    &mut self.circuit,
                    &mut self.timeline,
                    component,
                    output,
                    value,
                );
            }
            SimEvent::WireTransfer { wire, value } => {
                if self.circuit.wire(wire).is_none() {
                    return false;
                }
                if let Some(target) = self.circuit.deliver(wire, value) {
                    self.mark_or_log(target);
                }
            }
            SimEvent::ClockEdge { component, edge } => {
                let now = self.timeline.now();
                let Some(slot) = self.circuit.slot_mut(component) else {
                    return false;
                };
                let mut ctx = EvalContext::new(component, now);
                slot.component.clock_edge(edge, &mut ctx);
                schedule_edge_requests(&mut self.timeline, component, ctx.into_requests());
                self.mark_or_log(component);
            }
        }
        true
    }

    fn start_component(&mut self, id: ComponentId) {
        let now = self.timeline.now();
        if let Some(slot) = self.circuit.slot_mut(id) {
            let mut ctx = EvalContext::new(id, now);
            slot.component.start(&mut ctx);
            schedule_edge_requests(&mut self.timeline, id, ctx.into_requests());
        }
    }

    fn mark_or_log(&mut self, id: ComponentId) {
        if let Err(e) = self.recalc.mark_dirty(&mut self.circuit, id) {
            tracing::warn!(error = %e, "mark dirty rejected");
        }
    }

    // ==================== Timeline control ====================

    /// Current logical time.
    pub fn now(&self) -> SimTime {
        self.timeline.now()
    }

    /// Freezes logical time. Idempotent.
    pub fn pause(&mut self) {
        self.timeline.pause();
    }

    /// Resumes from the paused logical time.
    pub fn resume(&mut self) {
        self.timeline.resume();
    }

    /// Returns true while logical time is frozen by [`pause`](Self::pause).
    pub fn is_paused(&self) -> bool {
        self.timeline.is_paused()
    }

    /// Returns every component to its initial state at logical time zero.
    ///
    /// Pending events are dropped, clocks are restarted and every component
    /// is marked dirty; call [`settle`](Self::settle) afterwards.
    pub fn reset(&mut self, paused: bool) {
        self.timeline.reset(paused);
        self.recalc.clear();
        self.circuit.reset_values();
        for id in self.circuit.component_ids() {
            self.start_component(id);
            self.mark_or_log(id);
        }
        tracing::info!(paused, "simulation reset");
    }

    /// Schedules a raw payload at `at`.
    pub fn schedule(&mut self, at: SimTime, event: SimEvent) -> EventId {
        let label = event.describe();
        let blocks = matches!(event, SimEvent::ClockEdge { .. });
        self.timeline.schedule_at(at, event, label, blocks)
    }

    /// Cancels a pending event.
    pub fn cancel(&mut self, id: EventId) -> bool {
        self.timeline.cancel(id)
    }

    // ==================== Queries ====================

    /// Current value of any pin.
    pub fn pin_value(&self, pin: PinRef) -> SimResult<LogicValue> {
        Ok(self.circuit.pin_value(pin)?)
    }

    /// Resolved value of an input pin.
    pub fn input_value(&self, id: ComponentId, index: usize) -> SimResult<LogicValue> {
        self.pin_value(PinRef::input(id, index))
    }

    /// Value currently on an output pin.
    pub fn output_value(&self, id: ComponentId, index: usize) -> SimResult<LogicValue> {
        self.pin_value(PinRef::output(id, index))
    }

    /// Evaluation state of a component, if it exists.
    pub fn status(&self, id: ComponentId) -> Option<ComponentStatus> {
        self.circuit.slot(id).map(|s| s.status)
    }

    /// Returns true if the component is waiting to be evaluated.
    pub fn is_dirty(&self, id: ComponentId) -> bool {
        self.status(id) == Some(ComponentStatus::Dirty)
    }

    /// The error of the component's last evaluation, if it failed.
    pub fn last_error(&self, id: ComponentId) -> Option<&EvalError> {
        self.circuit.slot(id).and_then(|s| s.last_error.as_ref())
    }

    /// Borrows a component as its concrete type.
    pub fn component<T: Component + 'static>(&self, id: ComponentId) -> Option<&T> {
        self.circuit
            .slot(id)
            .and_then(|s| s.component.as_any().downcast_ref::<T>())
    }

    /// Mutably borrows a component as its concrete type.
    ///
    /// Changing state this way does not mark the component dirty.
    pub fn component_mut<T: Component + 'static>(&mut self, id: ComponentId) -> Option<&mut T> {
        self.circuit
            .slot_mut(id)
            .and_then(|s| s.component.as_any_mut().downcast_mut::<T>())
    }

    /// The circuit's bookkeeping for one component.
    pub fn slot(&self, id: ComponentId) -> Option<&ComponentSlot> {
        self.circuit.slot(id)
    }

    /// Read-only view of the circuit graph.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Read-only view of the event timeline.
    pub fn timeline(&self) -> &Timeline<SimEvent> {
        &self.timeline
    }

    /// Pending events in firing order.
    pub fn pending_events(&self) -> impl Iterator<Item = &ScheduledEvent<SimEvent>> {
        self.timeline.pending()
    }

    /// Number of events still queued.
    pub fn pending_event_count(&self) -> usize {
        self.timeline.pending_count()
    }

    /// Logical time of the earliest pending event.
    pub fn next_event_time(&self) -> Option<SimTime> {
        self.timeline.next_event_time()
    }

    /// Label of the earliest pending event.
    pub fn next_event_description(&self) -> Option<&str> {
        self.timeline.next_event_description()
    }

    /// Pending events that keep the simulation alive (clock edges).
    pub fn auto_pause_blockers(&self) -> usize {
        self.timeline.auto_pause_blockers()
    }

    /// How long a host loop may sleep before the next [`poll`](Self::poll).
    pub fn time_until_next_event(&self) -> Option<SimTime> {
        self.timeline.time_until_next()
    }

    // ==================== Quiescence ====================

    /// Returns true when no component is dirty and no pending event would
    /// change a value.
    pub fn is_quiescent(&self) -> bool {
        self.recalc.is_idle() && !self.has_effective_events()
    }

    /// Replays pending events against current values to see if any would
    /// change something.
    fn has_effective_events(&self) -> bool {
        let mut outputs: HashMap<(ComponentId, usize), LogicValue> = HashMap::new();
        let mut wires: HashMap<WireId, LogicValue> = HashMap::new();

        for event in self.timeline.pending() {
            match event.payload {
                SimEvent::MarkDirty { component } | SimEvent::ClockEdge { component, .. } => {
                    if self.circuit.slot(component).is_some() {
                        return true;
                    }
                }
                SimEvent::DriveOutput {
                    component,
                    output,
                    value,
                } => {
                    let current = match outputs.get(&(component, output)) {
                        Some(v) => *v,
                        None => match self.circuit.pin_value(PinRef::output(component, output)) {
                            Ok(v) => v,
                            Err(_) => continue,
                        },
                    };
                    if current != value {
                        return true;
                    }
                    outputs.insert((component, output), value);
                }
                SimEvent::WireTransfer { wire, value } => {
                    let current = match wires.get(&wire) {
                        Some(v) => *v,
                        None => match self.circuit.wire(wire) {
                            Some(w) => w.carried,
                            None => continue,
                        },
                    };
                    if current != value {
                        return true;
                    }
                    wires.insert(wire, value);
                }
            }
        }
        false
    }

    /// Returns a future that resolves once the simulation is quiescent.
    ///
    /// Resolution happens inside the drain methods, so something must keep
    /// calling [`poll`](Self::poll), [`step`](Self::step) or similar.
    pub fn when_quiescent(&mut self) -> Quiescence {
        let signal = QuiescenceSignal::new();
        let future = signal.future();
        if self.is_quiescent() {
            signal.resolve(self.now());
        } else {
            self.waiters.push(signal);
        }
        future
    }

    fn notify_waiters(&mut self) {
        if self.waiters.is_empty() || !self.is_quiescent() {
            return;
        }
        let now = self.now();
        tracing::debug!(now, waiters = self.waiters.len(), "quiescent");
        for signal in self.waiters.drain(..) {
            signal.resolve(now);
        }
    }

    // ==================== Statistics ====================

    /// Takes a statistics snapshot.
    pub fn stats(&self) -> SimulationStats {
        let mut stats = SimulationStats::new();
        stats.engine = EngineStats {
            final_time: self.now(),
            component_count: self.circuit.component_count(),
            wire_count: self.circuit.wire_count(),
            pending_events: self.timeline.pending_count(),
            ..self.stats.clone()
        };
        stats.recalc = self.recalc.stats().clone();
        stats.timeline = self.timeline.stats().clone();
        stats.components = self
            .circuit
            .components()
            .map(|slot| {
                (
                    slot.id,
                    ComponentStats {
                        name: slot.name.clone(),
                        type_name: slot.component.type_name().to_string(),
                        status: slot.status,
                        error: slot.last_error.as_ref().map(|e| e.to_string()),
                    },
                )
            })
            .collect();
        stats
    }

    /// Exports the statistics snapshot as JSON.
    pub fn export_stats(&self) -> serde_json::Value {
        serde_json::to_value(self.stats()).unwrap_or(serde_json::Value::Null)
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("now", &self.now())
            .field("paused", &self.is_paused())
            .field("components", &self.circuit.component_count())
            .field("wires", &self.circuit.wire_count())
            .field("dirty", &self.recalc.pending_len())
            .field("pending_events", &self.timeline.pending_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::components::{Clock, Combinational, InputSwitch, Probe};
    use crate::error::SimError;
    use crate::event::Edge;
    use LogicValue::*;

    fn sim() -> (ManualClock, Simulation) {
        let clock = ManualClock::new();
        let sim = Simulation::new(Arc::new(clock.clone()));
        (clock, sim)
    }

    fn paused() -> Simulation {
        let params = SimulationParams {
            start_paused: true,
            ..Default::default()
        };
        Simulation::with_params(Arc::new(ManualClock::new()), &params)
    }

    #[test]
    fn test_add_component_marks_dirty() {
        let (_, mut sim) = sim();
        let id = sim.add_component("not", Box::new(Combinational::not()));
        assert!(sim.is_dirty(id));

        sim.settle();
        assert_eq!(sim.status(id), Some(ComponentStatus::Clean));
        assert_eq!(sim.output_value(id, 0).unwrap(), High);
    }

    #[test]
    fn test_set_input_on_non_input_fails() {
        let (_, mut sim) = sim();
        let not = sim.add_component("not", Box::new(Combinational::not()));
        let err = sim.set_input(not, High).unwrap_err();
        assert_eq!(err, SimError::from(CircuitError::NotAnInput(not)));
        assert!(sim.set_input(77, High).is_err());
    }

    #[test]
    fn test_instantiate_unknown_type() {
        let (_, mut sim) = sim();
        let registry = crate::registry::create_default_registry();
        let err = sim
            .instantiate(&registry, "Flux", "f", &Attrs::new())
            .unwrap_err();
        assert_eq!(err, SimError::from(CircuitError::UnknownType("Flux".to_string())));

        let id = sim.instantiate(&registry, "Probe", "p", &Attrs::new()).unwrap();
        assert!(sim.component::<Probe>(id).is_some());
    }

    #[test]
    fn test_delayed_drive_fires_when_due() {
        let (clock, mut sim) = sim();
        let sw = sim.add_component("sw", Box::new(InputSwitch::new(Low)));
        let buf = sim.add_component("buf", Box::new(Combinational::buffer().with_delay(10)));
        sim.connect(PinRef::output(sw, 0), PinRef::input(buf, 0)).unwrap();
        sim.settle();

        sim.set_input(sw, High).unwrap();
        assert_eq!(sim.time_until_next_event(), Some(10));
        clock.advance(9);
        sim.poll();
        assert_eq!(sim.output_value(buf, 0).unwrap(), Low);
        clock.advance(1);
        sim.poll();
        assert_eq!(sim.output_value(buf, 0).unwrap(), High);
    }

    #[test]
    fn test_events_for_removed_component_are_dropped() {
        let mut sim = paused();
        let sw = sim.add_component("sw", Box::new(InputSwitch::new(High)));
        let buf = sim.add_component("buf", Box::new(Combinational::buffer().with_delay(5)));
        sim.connect(PinRef::output(sw, 0), PinRef::input(buf, 0)).unwrap();
        sim.settle();
        assert_eq!(sim.pending_event_count(), 1);

        let removed = sim.remove_component(buf).unwrap();
        assert_eq!(removed.type_name(), "Buffer");
        assert_eq!(sim.step().unwrap(), Some(5));
        assert_eq!(sim.stats().engine.events_dropped, 1);
    }

    #[test]
    fn test_step_requires_pause() {
        let (_, mut sim) = sim();
        assert!(sim.step().is_err());
        assert!(sim.run_until(10).is_err());
    }

    #[test]
    fn test_cancel_scheduled_event() {
        let mut sim = paused();
        let not = sim.add_component("not", Box::new(Combinational::not()));
        sim.settle();

        let id = sim.schedule(40, SimEvent::MarkDirty { component: not });
        assert_eq!(sim.next_event_description(), Some("recalculate c0"));
        assert!(sim.cancel(id));
        assert_eq!(sim.step().unwrap(), None);
    }

    #[test]
    fn test_clock_edge_blocks_auto_pause() {
        let mut sim = paused();
        sim.add_component("clk", Box::new(Clock::new(20)));
        assert_eq!(sim.auto_pause_blockers(), 1);
        assert!(matches!(
            sim.pending_events().next().unwrap().payload,
            SimEvent::ClockEdge {
                edge: Edge::Rising,
                ..
            }
        ));
    }

    #[test]
    fn test_reset_restarts_clock_and_values() {
        let mut sim = paused();
        let clk = sim.add_component("clk", Box::new(Clock::new(20)));
        sim.run_until(30).unwrap();
        assert_eq!(sim.now(), 30);

        sim.reset(true);
        assert_eq!(sim.now(), 0);
        assert!(sim.is_dirty(clk));
        assert_eq!(sim.output_value(clk, 0).unwrap(), Low);
        assert_eq!(sim.pending_event_count(), 1);
        assert_eq!(sim.component::<Clock>(clk).unwrap().edge_count(), 0);
    }

    #[test]
    fn test_quiescent_ignores_redundant_events() {
        let mut sim = paused();
        let sw = sim.add_component("sw", Box::new(InputSwitch::new(Low)));
        sim.settle();
        assert!(sim.is_quiescent());

        // a drive to the value already on the pin changes nothing
        sim.schedule(
            10,
            SimEvent::DriveOutput {
                component: sw,
                output: 0,
                value: Low,
            },
        );
        assert!(sim.is_quiescent());

        sim.schedule(
            20,
            SimEvent::DriveOutput {
                component: sw,
                output: 0,
                value: High,
            },
        );
        assert!(!sim.is_quiescent());
    }

    #[test]
    fn test_export_stats() {
        let (_, mut sim) = sim();
        let sw = sim.add_component("sw", Box::new(InputSwitch::new(Low)));
        let not = sim.add_component("not", Box::new(Combinational::not()));
        sim.connect(PinRef::output(sw, 0), PinRef::input(not, 0)).unwrap();
        sim.settle();
        sim.set_input(sw, High).unwrap();

        let stats = sim.export_stats();
        assert_eq!(stats["engine"]["component_count"], 2);
        assert_eq!(stats["engine"]["wire_count"], 1);
        assert_eq!(stats["engine"]["inputs_applied"], 1);
        assert_eq!(stats["components"]["1"]["type_name"], "Not");
    }
}
