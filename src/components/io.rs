//! Circuit boundary components: externally driven switches and probes.

use std::any::Any;

use crate::component::{Component, EvalContext};
use crate::error::EvalResult;
use crate::types::SimTime;
use crate::value::LogicValue;

/// A source with one output whose value is set from outside the circuit.
#[derive(Clone, Debug)]
pub struct InputSwitch {
    initial: LogicValue,
    value: LogicValue,
}

impl InputSwitch {
    /// Creates a switch holding `value`.
    pub fn new(value: LogicValue) -> Self {
        Self {
            initial: value,
            value,
        }
    }

    /// The value the switch currently drives.
    pub fn value(&self) -> LogicValue {
        self.value
    }
}

impl Default for InputSwitch {
    fn default() -> Self {
        Self::new(LogicValue::Low)
    }
}

impl Component for InputSwitch {
    fn type_name(&self) -> &str {
        "InputSwitch"
    }

    fn input_count(&self) -> usize {
        0
    }

    fn output_count(&self) -> usize {
        1
    }

    fn initial_outputs(&self) -> Vec<LogicValue> {
        vec![self.value]
    }

    fn evaluate(&mut self, _inputs: &[LogicValue], _ctx: &mut EvalContext) -> EvalResult<Vec<LogicValue>> {
        Ok(vec![self.value])
    }

    fn is_combinational(&self) -> bool {
        false
    }

    fn accept_input(&mut self, value: LogicValue) -> bool {
        self.value = value;
        true
    }

    fn reset(&mut self) {
        self.value = self.initial;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A sink with one input that records every change it observes.
#[derive(Clone, Debug, Default)]
pub struct Probe {
    history: Vec<(SimTime, LogicValue)>,
}

impl Probe {
    /// Creates a probe with an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Observed transitions in order, as `(time, value)`.
    pub fn history(&self) -> &[(SimTime, LogicValue)] {
        &self.history
    }

    /// The most recent value seen, if any evaluation happened.
    pub fn last(&self) -> Option<LogicValue> {
        self.history.last().map(|(_, v)| *v)
    }

    /// Times at which the input became `value`.
    pub fn times_of(&self, value: LogicValue) -> Vec<SimTime> {
        self.history
            .iter()
            .filter(|(_, v)| *v == value)
            .map(|(t, _)| *t)
            .collect()
    }
}

impl Component for Probe {
    fn type_name(&self) -> &str {
        "Probe"
    }

    fn input_count(&self) -> usize {
        1
    }

    fn output_count(&self) -> usize {
        0
    }

    fn evaluate(&mut self, inputs: &[LogicValue], ctx: &mut EvalContext) -> EvalResult<Vec<LogicValue>> {
        let value = inputs.first().copied().unwrap_or_default();
        if self.last() != Some(value) {
            self.history.push((ctx.now(), value));
        }
        Ok(Vec::new())
    }

    fn is_combinational(&self) -> bool {
        false
    }

    fn reset(&mut self) {
        self.history.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LogicValue::*;

    #[test]
    fn test_switch_accepts_input() {
        let mut sw = InputSwitch::new(Low);
        assert_eq!(sw.initial_outputs(), vec![Low]);
        assert!(sw.accept_input(High));
        let out = sw.evaluate(&[], &mut EvalContext::new(0, 0)).unwrap();
        assert_eq!(out, vec![High]);

        sw.reset();
        assert_eq!(sw.value(), Low);
    }

    #[test]
    fn test_probe_records_transitions_only() {
        let mut probe = Probe::new();
        for (t, v) in [(0, Low), (5, Low), (10, High), (12, High), (20, Unknown)] {
            probe.evaluate(&[v], &mut EvalContext::new(0, t)).unwrap();
        }
        assert_eq!(probe.history(), &[(0, Low), (10, High), (20, Unknown)]);
        assert_eq!(probe.times_of(High), vec![10]);
        assert_eq!(probe.last(), Some(Unknown));

        probe.reset();
        assert!(probe.history().is_empty());
    }
}
