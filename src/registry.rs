//! Component factory registry.
//!
//! Component types are registered by name with a factory that reads string
//! attributes, so hosts can construct components from their own
//! descriptions without knowing the concrete types. Missing attributes take
//! their defaults; malformed ones are reported, never replaced.
//!
//! # Example
//!
//! ```
//! use quadsim::registry::create_default_registry;
//! use std::collections::HashMap;
//!
//! let registry = create_default_registry();
//! let attrs = HashMap::from([("inputs".to_string(), "3".to_string())]);
//! let gate = registry.create("And", &attrs).unwrap();
//! assert_eq!(gate.input_count(), 3);
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::component::Component;
use crate::components::{d_flip_flop, Clock, Combinational, InputSwitch, Probe};
use crate::error::{CircuitError, SimResult};
use crate::resolver::Resolution;
use crate::types::SimTime;
use crate::value::LogicValue;

/// String attributes handed to a factory.
pub type Attrs = HashMap<String, String>;

/// Type alias for component factory functions.
pub type ComponentFactory = Arc<dyn Fn(&Attrs) -> SimResult<Box<dyn Component>> + Send + Sync>;

/// A registry for component factories.
#[derive(Default)]
pub struct ComponentRegistry {
    factories: HashMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&Attrs) -> SimResult<Box<dyn Component>> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    /// Creates a component by type name.
    ///
    /// Fails with [`CircuitError::UnknownType`] for an unregistered name and
    /// with the factory's error for malformed attributes.
    pub fn create(&self, type_name: &str, attrs: &Attrs) -> SimResult<Box<dyn Component>> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| CircuitError::UnknownType(type_name.to_string()))?;
        factory(attrs)
    }

    /// Returns true if a type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Returns the number of registered types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Unregisters a component type.
    pub fn unregister(&mut self, type_name: &str) -> bool {
        self.factories.remove(type_name).is_some()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("registered_types", &self.type_names())
            .finish()
    }
}

fn invalid(key: &str, value: &str) -> CircuitError {
    CircuitError::InvalidAttribute {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn attr<T: std::str::FromStr>(attrs: &Attrs, key: &str, default: T) -> SimResult<T> {
    match attrs.get(key) {
        Some(raw) => Ok(raw.trim().parse().map_err(|_| invalid(key, raw))?),
        None => Ok(default),
    }
}

fn resolution(attrs: &Attrs) -> SimResult<Resolution> {
    let Some(raw) = attrs.get("resolution") else {
        return Ok(Resolution::Standard);
    };
    match raw.trim().to_lowercase().as_str() {
        "standard" => Ok(Resolution::Standard),
        "wired_or" | "wiredor" => Ok(Resolution::WiredOr),
        "wired_and" | "wiredand" => Ok(Resolution::WiredAnd),
        _ => Err(invalid("resolution", raw).into()),
    }
}

fn gate(attrs: &Attrs, build: fn(usize) -> Combinational) -> SimResult<Box<dyn Component>> {
    let inputs = attr(attrs, "inputs", 2usize)?.max(1);
    let delay: SimTime = attr(attrs, "delay", 0)?;
    Ok(Box::new(
        build(inputs).with_delay(delay).with_resolution(resolution(attrs)?),
    ))
}

fn unary(attrs: &Attrs, component: Combinational) -> SimResult<Box<dyn Component>> {
    let delay: SimTime = attr(attrs, "delay", 0)?;
    Ok(Box::new(component.with_delay(delay).with_resolution(resolution(attrs)?)))
}

/// Creates a registry with the built-in component types.
///
/// | Type | Attributes |
/// |---|---|
/// | `And`, `Or`, `Xor`, `Nand`, `Nor`, `Xnor` | `inputs` (2), `delay` (0), `resolution` |
/// | `Not`, `Buffer`, `TriState` | `delay` (0), `resolution` |
/// | `DFlipFlop` | `delay` (0) |
/// | `InputSwitch` | `value` (`0`) |
/// | `Probe` | |
/// | `Clock` | `period` (100), `duty` (50), `phase` (0) |
pub fn create_default_registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();

    registry.register("And", |attrs| gate(attrs, Combinational::and));
    registry.register("Or", |attrs| gate(attrs, Combinational::or));
    registry.register("Xor", |attrs| gate(attrs, Combinational::xor));
    registry.register("Nand", |attrs| gate(attrs, Combinational::nand));
    registry.register("Nor", |attrs| gate(attrs, Combinational::nor));
    registry.register("Xnor", |attrs| gate(attrs, Combinational::xnor));

    registry.register("Not", |attrs| unary(attrs, Combinational::not()));
    registry.register("Buffer", |attrs| unary(attrs, Combinational::buffer()));
    registry.register("TriState", |attrs| unary(attrs, Combinational::tri_state()));

    registry.register("DFlipFlop", |attrs| {
        Ok(Box::new(d_flip_flop().with_delay(attr(attrs, "delay", 0)?)))
    });

    registry.register("InputSwitch", |attrs| {
        let value = match attrs.get("value") {
            Some(raw) => raw.trim().parse::<LogicValue>()?,
            None => LogicValue::Low,
        };
        Ok(Box::new(InputSwitch::new(value)))
    });

    registry.register("Probe", |_| Ok(Box::new(Probe::new())));

    registry.register("Clock", |attrs| {
        Ok(Box::new(
            Clock::new(attr(attrs, "period", 100)?)
                .with_duty(attr(attrs, "duty", 50)?)
                .with_phase(attr(attrs, "phase", 0)?),
        ))
    });

    registry
}
