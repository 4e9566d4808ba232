//! Components whose outputs depend on internal state.

use std::any::Any;
use std::sync::Arc;

use crate::component::{Component, EvalContext};
use crate::error::{EvalError, EvalResult};
use crate::types::SimTime;
use crate::value::{invert, LogicValue};

/// Transition function: updates the state from the inputs and returns the outputs.
pub type TransitionFn<S> = Arc<dyn Fn(&mut S, &[LogicValue]) -> Vec<LogicValue> + Send + Sync>;

/// A component driven by a transition function over state `S`.
pub struct Stateful<S> {
    name: String,
    inputs: usize,
    outputs: usize,
    initial: S,
    state: S,
    transition: TransitionFn<S>,
    initial_outputs: Vec<LogicValue>,
    delay: SimTime,
}

impl<S: Clone> Stateful<S> {
    /// Creates a stateful component starting from `initial`.
    pub fn new<F>(
        name: impl Into<String>,
        inputs: usize,
        outputs: usize,
        initial: S,
        transition: F,
    ) -> Self
    where
        F: Fn(&mut S, &[LogicValue]) -> Vec<LogicValue> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            inputs,
            outputs,
            state: initial.clone(),
            initial,
            transition: Arc::new(transition),
            initial_outputs: vec![LogicValue::Low; outputs],
            delay: 0,
        }
    }

    /// Sets the outputs reported before the first evaluation.
    pub fn with_initial_outputs(mut self, outputs: Vec<LogicValue>) -> Self {
        self.initial_outputs = outputs;
        self
    }

    /// Applies a propagation delay to every output.
    pub fn with_delay(mut self, delay: SimTime) -> Self {
        self.delay = delay;
        self
    }

    /// Current internal state.
    pub fn state(&self) -> &S {
        &self.state
    }
}

impl<S: Clone + Send + 'static> Component for Stateful<S> {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn input_count(&self) -> usize {
        self.inputs
    }

    fn output_count(&self) -> usize {
        self.outputs
    }

    fn initial_outputs(&self) -> Vec<LogicValue> {
        self.initial_outputs.clone()
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
        Ok((self.transition)(&mut self.state, inputs))
    }

    fn output_delay(&self, _output: usize) -> SimTime {
        self.delay
    }

    fn is_combinational(&self) -> bool {
        false
    }

    fn reset(&mut self) {
        self.state = self.initial.clone();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// State of a D flip-flop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlipFlopState {
    /// Clock level seen on the previous evaluation
    pub last_clock: LogicValue,
    /// Stored bit
    pub q: LogicValue,
}

/// Rising-edge D flip-flop: inputs `[d, clk]`, outputs `[q, !q]`.
pub fn d_flip_flop() -> Stateful<FlipFlopState> {
    let initial = FlipFlopState {
        last_clock: LogicValue::Low,
        q: LogicValue::Low,
    };
    Stateful::new("DFlipFlop", 2, 2, initial, |state, inputs| {
        let (d, clk) = (inputs[0], inputs[1]);
        if state.last_clock == LogicValue::Low && clk == LogicValue::High {
            state.q = if d.is_defined() { d } else { LogicValue::Unknown };
        }
        state.last_clock = clk;
        vec![state.q, invert(state.q)]
    })
    .with_initial_outputs(vec![LogicValue::Low, LogicValue::High])
}

#[cfg(test)]
mod tests {
    use super::*;
    use LogicValue::*;

    fn eval<S: Clone + Send + 'static>(c: &mut Stateful<S>, inputs: &[LogicValue]) -> Vec<LogicValue> {
        c.evaluate(inputs, &mut EvalContext::new(0, 0)).unwrap()
    }

    #[test]
    fn test_flip_flop_captures_on_rising_edge() {
        let mut ff = d_flip_flop();
        assert_eq!(ff.initial_outputs(), vec![Low, High]);

        assert_eq!(eval(&mut ff, &[High, Low]), vec![Low, High]);
        assert_eq!(eval(&mut ff, &[High, High]), vec![High, Low]);
        // level-held clock does not capture
        assert_eq!(eval(&mut ff, &[Low, High]), vec![High, Low]);
        assert_eq!(eval(&mut ff, &[Low, Low]), vec![High, Low]);
        assert_eq!(eval(&mut ff, &[Low, High]), vec![Low, High]);
    }

    #[test]
    fn test_flip_flop_undefined_data() {
        let mut ff = d_flip_flop();
        assert_eq!(eval(&mut ff, &[HighZ, High]), vec![Unknown, Unknown]);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut counter = Stateful::new("Toggle", 1, 1, false, |state, inputs| {
            if inputs[0] == High {
                *state = !*state;
            }
            vec![LogicValue::from_bool(*state)]
        });
        assert_eq!(eval(&mut counter, &[High]), vec![High]);
        assert!(*counter.state());

        counter.reset();
        assert!(!*counter.state());
        assert!(!counter.is_combinational());
    }

    #[test]
    fn test_wrong_input_count() {
        let mut ff = d_flip_flop();
        let err = ff.evaluate(&[High], &mut EvalContext::new(0, 0)).unwrap_err();
        assert_eq!(err, EvalError::InputArity { expected: 2, actual: 1 });
    }
}
