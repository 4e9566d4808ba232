//! Combinational components built from a truth function.
//!
//! `Combinational` holds a pure function from input values to output
//! values. The standard gates are constructors over it rather than
//! separate types.

use std::any::Any;
use std::sync::Arc;

use crate::component::{Component, EvalContext};
use crate::error::{EvalError, EvalResult};
use crate::resolver::Resolution;
use crate::types::SimTime;
use crate::value::{and_all, invert, or_all, xor_all, LogicValue};

/// A pure mapping from input values to output values.
pub type TruthFn = Arc<dyn Fn(&[LogicValue]) -> Vec<LogicValue> + Send + Sync>;

/// A stateless component evaluated through a [`TruthFn`].
///
/// # Example
///
/// ```rust
/// use quadsim::components::Combinational;
/// use quadsim::{Component, EvalContext, LogicValue};
///
/// let mut gate = Combinational::nand(2).with_delay(5);
/// let mut ctx = EvalContext::new(0, 0);
/// let out = gate.evaluate(&[LogicValue::High, LogicValue::High], &mut ctx).unwrap();
/// assert_eq!(out, vec![LogicValue::Low]);
/// assert_eq!(gate.output_delay(0), 5);
/// ```
#[derive(Clone)]
pub struct Combinational {
    name: String,
    inputs: usize,
    outputs: usize,
    func: TruthFn,
    delays: Vec<SimTime>,
    resolution: Resolution,
}

impl Combinational {
    /// Creates a component with `inputs` inputs and `outputs` outputs.
    pub fn new<F>(name: impl Into<String>, inputs: usize, outputs: usize, func: F) -> Self
    where
        F: Fn(&[LogicValue]) -> Vec<LogicValue> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inputs,
            outputs,
            func: Arc::new(func),
            delays: vec![0; outputs],
            resolution: Resolution::Standard,
        }
    }

    /// Applies the same propagation delay to every output.
    pub fn with_delay(mut self, delay: SimTime) -> Self {
        self.delays.iter_mut().for_each(|d| *d = delay);
        self
    }

    /// Sets the propagation delay of one output.
    pub fn with_output_delay(mut self, output: usize, delay: SimTime) -> Self {
        if let Some(d) = self.delays.get_mut(output) {
            *d = delay;
        }
        self
    }

    /// Sets the wired resolution policy of every input.
    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    fn single(name: &str, inputs: usize, f: fn(&[LogicValue]) -> LogicValue) -> Self {
        Self::new(name, inputs, 1, move |ins| vec![f(ins)])
    }

    /// N-input AND.
    pub fn and(inputs: usize) -> Self {
        Self::single("And", inputs, and_all)
    }

    /// N-input OR.
    pub fn or(inputs: usize) -> Self {
        Self::single("Or", inputs, or_all)
    }

    /// N-input XOR (odd parity).
    pub fn xor(inputs: usize) -> Self {
        Self::single("Xor", inputs, xor_all)
    }

    /// N-input NAND.
    pub fn nand(inputs: usize) -> Self {
        Self::single("Nand", inputs, |ins| invert(and_all(ins)))
    }

    /// N-input NOR.
    pub fn nor(inputs: usize) -> Self {
        Self::single("Nor", inputs, |ins| invert(or_all(ins)))
    }

    /// N-input XNOR.
    pub fn xnor(inputs: usize) -> Self {
        Self::single("Xnor", inputs, |ins| invert(xor_all(ins)))
    }

    /// Inverter. A floating input reads as `Unknown`.
    pub fn not() -> Self {
        Self::single("Not", 1, |ins| invert(defined_or_unknown(ins[0])))
    }

    /// Non-inverting buffer. A floating input reads as `Unknown`.
    pub fn buffer() -> Self {
        Self::single("Buffer", 1, |ins| defined_or_unknown(ins[0]))
    }

    /// Tri-state buffer: inputs `[data, enable]`.
    ///
    /// Enable `High` passes data, `Low` releases the output to `HighZ`,
    /// anything else is `Unknown`.
    pub fn tri_state() -> Self {
        Self::single("TriState", 2, |ins| match ins[1] {
            LogicValue::High => defined_or_unknown(ins[0]),
            LogicValue::Low => LogicValue::HighZ,
            _ => LogicValue::Unknown,
        })
    }
}

fn defined_or_unknown(v: LogicValue) -> LogicValue {
    if v.is_defined() {
        v
    } else {
        LogicValue::Unknown
    }
}

impl std::fmt::Debug for Combinational {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Combinational")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("delays", &self.delays)
            .finish()
    }
}

impl Component for Combinational {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn input_count(&self) -> usize {
        self.inputs
    }

    fn output_count(&self) -> usize {
        self.outputs
    }

    fn evaluate(
        &mut self,
        inputs: &[LogicValue],
        _ctx: &mut EvalContext,
    ) -> EvalResult<Vec<LogicValue>> {
        if inputs.len() != self.inputs {
            return Err(EvalError::InputArity {
                expected: self.inputs,
                actual: inputs.len(),
            });
        }
        Ok((self.func)(inputs))
    }

    fn output_delay(&self, output: usize) -> SimTime {
        self.delays.get(output).copied().unwrap_or(0)
    }

    fn input_resolution(&self, _input: usize) -> Resolution {
        self.resolution
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
