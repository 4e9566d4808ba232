//! The component graph: pins, wires and component slots.
//!
//! `Circuit` stores structure and current values only. It never decides
//! when anything is evaluated; every method that changes a resolved input
//! reports the affected component so the caller can mark it dirty.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::component::{Component, ComponentStatus};
use crate::error::{CircuitError, EvalError};
use crate::resolver::{resolve_input, DriverResolution, UnconnectedInput};
use crate::types::{ComponentId, PinDirection, PinRef, SimTime, WireId};
use crate::value::LogicValue;

/// An input pin: its resolved value and the wires feeding it.
#[derive(Clone, Debug)]
pub struct InputPin {
    /// Resolved value
    pub value: LogicValue,
    /// Attached wires, in connection order
    pub wires: Vec<WireId>,
    /// How concurrent drivers combine
    pub policy: Arc<dyn DriverResolution>,
}

/// An output pin: its driven value and the wires it feeds.
#[derive(Clone, Debug)]
pub struct OutputPin {
    /// Value currently on the pin
    pub value: LogicValue,
    /// Last value computed for the pin, possibly still in flight
    pub projected: LogicValue,
    /// Attached wires, in connection order
    pub wires: Vec<WireId>,
}

/// A directed connection from an output pin to an input pin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wire {
    pub id: WireId,
    /// Driving output pin
    pub source: PinRef,
    /// Driven input pin
    pub target: PinRef,
    /// Transfer delay
    pub delay: SimTime,
    /// Value last delivered to the target
    pub carried: LogicValue,
}

/// A component together with its pins and evaluation bookkeeping.
pub struct ComponentSlot {
    pub id: ComponentId,
    pub name: String,
    pub component: Box<dyn Component>,
    pub inputs: Vec<InputPin>,
    pub outputs: Vec<OutputPin>,
    pub status: ComponentStatus,
    /// Set when the last evaluation failed, cleared on the next success
    pub last_error: Option<EvalError>,
}

impl ComponentSlot {
    /// Snapshot of the resolved input values.
    pub fn input_values(&self) -> Vec<LogicValue> {
        self.inputs.iter().map(|p| p.value).collect()
    }

    /// Current output values.
    pub fn output_values(&self) -> Vec<LogicValue> {
        self.outputs.iter().map(|p| p.value).collect()
    }
}

impl std::fmt::Debug for ComponentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSlot")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &self.component.type_name())
            .field("status", &self.status)
            .field("inputs", &self.input_values())
            .field("outputs", &self.output_values())
            .finish()
    }
}

/// Components and wires of one simulation.
#[derive(Debug, Default)]
pub struct Circuit {
    components: BTreeMap<ComponentId, ComponentSlot>,
    wires: BTreeMap<WireId, Wire>,
    next_component: ComponentId,
    next_wire: WireId,
    unconnected: UnconnectedInput,
}

impl Circuit {
    /// Creates an empty circuit with the given unconnected-input policy.
    pub fn new(unconnected: UnconnectedInput) -> Self {
        Self {
            unconnected,
            ..Self::default()
        }
    }

    /// The unconnected-input policy.
    pub fn unconnected_policy(&self) -> UnconnectedInput {
        self.unconnected
    }

    /// Adds a component and creates its pins.
    pub fn add(&mut self, name: impl Into<String>, component: Box<dyn Component>) -> ComponentId {
        let id = self.next_component;
        self.next_component += 1;

        let inputs = (0..component.input_count())
            .map(|i| InputPin {
                value: self.unconnected.value(),
                wires: Vec::new(),
                policy: component.input_resolution(i).shared(),
            })
            .collect();

        let mut initial = component.initial_outputs();
        initial.resize(component.output_count(), LogicValue::Low);
        let outputs = initial
            .into_iter()
            .map(|value| OutputPin {
                value,
                projected: value,
                wires: Vec::new(),
            })
            .collect();

        self.components.insert(
            id,
            ComponentSlot {
                id,
                name: name.into(),
                component,
                inputs,
                outputs,
                status: ComponentStatus::Clean,
                last_error: None,
            },
        );
        id
    }

    /// Removes a component after detaching every wire touching it.
    ///
    /// Returns the slot and the other components whose inputs changed.
    pub fn remove(
        &mut self,
        id: ComponentId,
    ) -> Result<(ComponentSlot, Vec<ComponentId>), CircuitError> {
        let slot = self
            .components
            .get(&id)
            .ok_or(CircuitError::UnknownComponent(id))?;
        let attached: Vec<WireId> = slot
            .inputs
            .iter()
            .flat_map(|p| p.wires.iter().copied())
            .chain(slot.outputs.iter().flat_map(|p| p.wires.iter().copied()))
            .collect();

        let mut affected = Vec::new();
        for wire in attached {
            if let Ok(Some(target)) = self.disconnect(wire) {
                if target != id && !affected.contains(&target) {
                    affected.push(target);
                }
            }
        }

        let slot = self
            .components
            .remove(&id)
            .ok_or(CircuitError::UnknownComponent(id))?;
        Ok((slot, affected))
    }

    /// Connects an output pin to an input pin.
    ///
    /// The wire immediately carries the source's current value. Returns the
    /// wire and, if the target's resolved value changed, its component.
    pub fn connect(
        &mut self,
        source: PinRef,
        target: PinRef,
        delay: SimTime,
    ) -> Result<(WireId, Option<ComponentId>), CircuitError> {
        if source.direction != PinDirection::Output {
            return Err(CircuitError::DirectionMismatch(source));
        }
        if target.direction != PinDirection::Input {
            return Err(CircuitError::DirectionMismatch(target));
        }
        let carried = self.pin_value(source)?;
        self.pin_value(target)?;

        let id = self.next_wire;
        self.next_wire += 1;
        self.wires.insert(
            id,
            Wire {
                id,
                source,
                target,
                delay,
                carried,
            },
        );
        if let Some(slot) = self.components.get_mut(&source.component) {
            slot.outputs[source.index].wires.push(id);
        }
        if let Some(slot) = self.components.get_mut(&target.component) {
            slot.inputs[target.index].wires.push(id);
        }

        let changed = self.refresh_input(target);
        Ok((id, changed.then_some(target.component)))
    }

    /// Removes a wire. Returns the target component if its input changed.
    pub fn disconnect(&mut self, wire: WireId) -> Result<Option<ComponentId>, CircuitError> {
        let wire = self
            .wires
            .remove(&wire)
            .ok_or(CircuitError::UnknownWire(wire))?;
        if let Some(slot) = self.components.get_mut(&wire.source.component) {
            slot.outputs[wire.source.index].wires.retain(|w| *w != wire.id);
        }
        if let Some(slot) = self.components.get_mut(&wire.target.component) {
            slot.inputs[wire.target.index].wires.retain(|w| *w != wire.id);
        }
        let changed = self.refresh_input(wire.target);
        Ok(changed.then_some(wire.target.component))
    }

    /// Replaces the resolution policy of an input pin.
    ///
    /// Returns the component if the pin's resolved value changed.
    pub fn set_input_policy(
        &mut self,
        pin: PinRef,
        policy: Arc<dyn DriverResolution>,
    ) -> Result<Option<ComponentId>, CircuitError> {
        if pin.direction != PinDirection::Input {
            return Err(CircuitError::DirectionMismatch(pin));
        }
        let slot = self
            .components
            .get_mut(&pin.component)
            .ok_or(CircuitError::UnknownComponent(pin.component))?;
        let input = slot
            .inputs
            .get_mut(pin.index)
            .ok_or(CircuitError::PinOutOfRange(pin))?;
        input.policy = policy;
        Ok(self.refresh_input(pin).then_some(pin.component))
    }

    /// Re-resolves an input pin from its wires. Returns true if the value changed.
    pub fn refresh_input(&mut self, pin: PinRef) -> bool {
        let Some(slot) = self.components.get_mut(&pin.component) else {
            return false;
        };
        let Some(input) = slot.inputs.get_mut(pin.index) else {
            return false;
        };
        let carried: Vec<LogicValue> = input
            .wires
            .iter()
            .filter_map(|w| self.wires.get(w))
            .map(|w| w.carried)
            .collect();
        let resolved = resolve_input(&carried, input.policy.as_ref(), self.unconnected);
        if resolved == input.value {
            return false;
        }
        input.value = resolved;
        true
    }

    /// Writes an output pin. Returns the attached wires if the value changed.
    pub fn set_output(
        &mut self,
        component: ComponentId,
        index: usize,
        value: LogicValue,
    ) -> Option<Vec<WireId>> {
        let pin = self
            .components
            .get_mut(&component)?
            .outputs
            .get_mut(index)?;
        if pin.value == value {
            return None;
        }
        pin.value = value;
        Some(pin.wires.clone())
    }

    /// Sets the value a wire carries and re-resolves its target.
    ///
    /// Returns the target component if its resolved input changed.
    pub fn deliver(&mut self, wire: WireId, value: LogicValue) -> Option<ComponentId> {
        let w = self.wires.get_mut(&wire)?;
        if w.carried == value {
            return None;
        }
        w.carried = value;
        let target = w.target;
        self.refresh_input(target).then_some(target.component)
    }

    /// Restores every component, pin and wire to its initial value.
    ///
    /// Components are reset and report their initial outputs again; wires
    /// carry their source's initial value and inputs are re-resolved.
    pub fn reset_values(&mut self) {
        for slot in self.components.values_mut() {
            slot.component.reset();
            let mut initial = slot.component.initial_outputs();
            initial.resize(slot.outputs.len(), LogicValue::Low);
            for (pin, value) in slot.outputs.iter_mut().zip(initial) {
                pin.value = value;
                pin.projected = value;
            }
            slot.status = ComponentStatus::Clean;
            slot.last_error = None;
        }

        let carried: Vec<(WireId, LogicValue)> = self
            .wires
            .values()
            .map(|w| (w.id, self.pin_value(w.source).unwrap_or_default()))
            .collect();
        for (id, value) in carried {
            if let Some(wire) = self.wires.get_mut(&id) {
                wire.carried = value;
            }
        }

        let inputs: Vec<PinRef> = self
            .components
            .values()
            .flat_map(|slot| (0..slot.inputs.len()).map(move |i| PinRef::input(slot.id, i)))
            .collect();
        for pin in inputs {
            self.refresh_input(pin);
        }
    }

    /// Current value of any pin.
    pub fn pin_value(&self, pin: PinRef) -> Result<LogicValue, CircuitError> {
        let slot = self
            .components
            .get(&pin.component)
            .ok_or(CircuitError::UnknownComponent(pin.component))?;
        let value = match pin.direction {
            PinDirection::Input => slot.inputs.get(pin.index).map(|p| p.value),
            PinDirection::Output => slot.outputs.get(pin.index).map(|p| p.value),
        };
        value.ok_or(CircuitError::PinOutOfRange(pin))
    }

    /// Returns a component slot.
    pub fn slot(&self, id: ComponentId) -> Option<&ComponentSlot> {
        self.components.get(&id)
    }

    /// Returns a mutable component slot.
    pub fn slot_mut(&mut self, id: ComponentId) -> Option<&mut ComponentSlot> {
        self.components.get_mut(&id)
    }

    /// Returns a wire.
    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(&id)
    }

    /// Iterates components in id order.
    pub fn components(&self) -> impl Iterator<Item = &ComponentSlot> {
        self.components.values()
    }

    /// Iterates component slots mutably in id order.
    pub fn components_mut(&mut self) -> impl Iterator<Item = &mut ComponentSlot> {
        self.components.values_mut()
    }

    /// Iterates wires in id order.
    pub fn wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.values()
    }

    /// Ids of every component, in id order.
    pub fn component_ids(&self) -> Vec<ComponentId> {
        self.components.keys().copied().collect()
    }

    /// Number of components.
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Number of wires.
    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Combinational, InputSwitch};
    use LogicValue::*;

    fn circuit() -> Circuit {
        Circuit::new(UnconnectedInput::Low)
    }

    #[test]
    fn test_add_creates_pins() {
        let mut c = circuit();
        let id = c.add("and", Box::new(Combinational::and(3)));

        let slot = c.slot(id).unwrap();
        assert_eq!(slot.inputs.len(), 3);
        assert_eq!(slot.outputs.len(), 1);
        assert_eq!(slot.input_values(), vec![Low, Low, Low]);
        assert_eq!(slot.status, ComponentStatus::Clean);
    }

    #[test]
    fn test_unconnected_highz_policy() {
        let mut c = Circuit::new(UnconnectedInput::HighZ);
        let id = c.add("not", Box::new(Combinational::not()));
        assert_eq!(c.pin_value(PinRef::input(id, 0)).unwrap(), HighZ);
    }

    #[test]
    fn test_connect_carries_source_value() {
        let mut c = circuit();
        let src = c.add("in", Box::new(InputSwitch::new(High)));
        let dst = c.add("not", Box::new(Combinational::not()));

        let (wire, changed) = c
            .connect(PinRef::output(src, 0), PinRef::input(dst, 0), 0)
            .unwrap();
        assert_eq!(changed, Some(dst));
        assert_eq!(c.wire(wire).unwrap().carried, High);
        assert_eq!(c.pin_value(PinRef::input(dst, 0)).unwrap(), High);
    }

    #[test]
    fn test_connect_rejects_wrong_direction() {
        let mut c = circuit();
        let a = c.add("a", Box::new(Combinational::not()));
        let b = c.add("b", Box::new(Combinational::not()));

        let err = c
            .connect(PinRef::input(a, 0), PinRef::input(b, 0), 0)
            .unwrap_err();
        assert_eq!(err, CircuitError::DirectionMismatch(PinRef::input(a, 0)));

        let err = c
            .connect(PinRef::output(a, 0), PinRef::input(b, 4), 0)
            .unwrap_err();
        assert_eq!(err, CircuitError::PinOutOfRange(PinRef::input(b, 4)));
    }

    #[test]
    fn test_multiple_drivers_resolve() {
        let mut c = circuit();
        let hi = c.add("hi", Box::new(InputSwitch::new(High)));
        let lo = c.add("lo", Box::new(InputSwitch::new(Low)));
        let buf = c.add("buf", Box::new(Combinational::buffer()));

        c.connect(PinRef::output(hi, 0), PinRef::input(buf, 0), 0).unwrap();
        c.connect(PinRef::output(lo, 0), PinRef::input(buf, 0), 0).unwrap();
        assert_eq!(c.pin_value(PinRef::input(buf, 0)).unwrap(), Unknown);
    }

    #[test]
    fn test_disconnect_restores_unconnected_default() {
        let mut c = circuit();
        let src = c.add("in", Box::new(InputSwitch::new(High)));
        let dst = c.add("buf", Box::new(Combinational::buffer()));
        let (wire, _) = c
            .connect(PinRef::output(src, 0), PinRef::input(dst, 0), 0)
            .unwrap();

        assert_eq!(c.disconnect(wire).unwrap(), Some(dst));
        assert_eq!(c.pin_value(PinRef::input(dst, 0)).unwrap(), Low);
        assert!(c.disconnect(wire).is_err());
    }

    #[test]
    fn test_remove_detaches_wires() {
        let mut c = circuit();
        let src = c.add("in", Box::new(InputSwitch::new(High)));
        let dst = c.add("buf", Box::new(Combinational::buffer()));
        c.connect(PinRef::output(src, 0), PinRef::input(dst, 0), 0).unwrap();

        let (slot, affected) = c.remove(src).unwrap();
        assert_eq!(slot.name, "in");
        assert_eq!(affected, vec![dst]);
        assert_eq!(c.wire_count(), 0);
        assert!(c.slot(dst).unwrap().inputs[0].wires.is_empty());
        assert_eq!(c.remove(src).unwrap_err(), CircuitError::UnknownComponent(src));
    }

    #[test]
    fn test_set_output_and_deliver() {
        let mut c = circuit();
        let src = c.add("in", Box::new(InputSwitch::new(Low)));
        let dst = c.add("buf", Box::new(Combinational::buffer()));
        let (wire, _) = c
            .connect(PinRef::output(src, 0), PinRef::input(dst, 0), 0)
            .unwrap();

        assert_eq!(c.set_output(src, 0, High), Some(vec![wire]));
        assert_eq!(c.set_output(src, 0, High), None);
        assert_eq!(c.deliver(wire, High), Some(dst));
        assert_eq!(c.deliver(wire, High), None);
        assert_eq!(c.pin_value(PinRef::input(dst, 0)).unwrap(), High);
    }

    #[test]
    fn test_reset_values() {
        let mut c = circuit();
        let src = c.add("in", Box::new(InputSwitch::new(Low)));
        let dst = c.add("buf", Box::new(Combinational::buffer()));
        let (wire, _) = c
            .connect(PinRef::output(src, 0), PinRef::input(dst, 0), 0)
            .unwrap();

        c.slot_mut(src).unwrap().component.accept_input(High);
        c.set_output(src, 0, High);
        c.deliver(wire, High);
        c.set_output(dst, 0, High);
        c.slot_mut(dst).unwrap().last_error = Some(EvalError::NonIdempotent);

        c.reset_values();
        assert_eq!(c.pin_value(PinRef::output(src, 0)).unwrap(), Low);
        assert_eq!(c.wire(wire).unwrap().carried, Low);
        assert_eq!(c.pin_value(PinRef::input(dst, 0)).unwrap(), Low);
        let slot = c.slot(dst).unwrap();
        assert_eq!(slot.output_values(), vec![Low]);
        assert!(slot.last_error.is_none());
    }
}
