//! Self-scheduling square-wave generator.

use std::any::Any;

use crate::component::{Component, EvalContext};
use crate::error::EvalResult;
use crate::event::Edge;
use crate::types::SimTime;
use crate::value::LogicValue;

/// A periodic clock with one output.
///
/// The output starts `Low`. The first rising edge fires `phase` units after
/// the clock starts, then the output stays `High` for `duty` percent of the
/// period. Each edge schedules the next one, so a clock never stops on its
/// own.
#[derive(Clone, Debug)]
pub struct Clock {
    period: SimTime,
    duty: u8,
    phase: SimTime,
    level: LogicValue,
    edges: u64,
}

impl Clock {
    /// 50% duty cycle, no phase offset.
    pub fn new(period: SimTime) -> Self {
        Self {
            period: period.max(2),
            duty: 50,
            phase: 0,
            level: LogicValue::Low,
            edges: 0,
        }
    }

    /// Sets the share of the period spent `High`, in percent.
    pub fn with_duty(mut self, percent: u8) -> Self {
        self.duty = percent.clamp(1, 99);
        self
    }

    /// Delays the first rising edge.
    pub fn with_phase(mut self, phase: SimTime) -> Self {
        self.phase = phase;
        self
    }

    /// Full cycle length.
    pub fn period(&self) -> SimTime {
        self.period
    }

    /// Current output level.
    pub fn level(&self) -> LogicValue {
        self.level
    }

    /// Number of edges taken since the last start.
    pub fn edge_count(&self) -> u64 {
        self.edges
    }

    fn high_time(&self) -> SimTime {
        let duty = self.duty as SimTime;
        let high = self.period / 100 * duty + self.period % 100 * duty / 100;
        high.clamp(1, self.period - 1)
    }

    fn low_time(&self) -> SimTime {
        self.period - self.high_time()
    }
}

impl Component for Clock {
    fn type_name(&self) -> &str {
        "Clock"
    }

    fn input_count(&self) -> usize {
        0
    }

    fn output_count(&self) -> usize {
        1
    }

    fn evaluate(&mut self, _inputs: &[LogicValue], _ctx: &mut EvalContext) -> EvalResult<Vec<LogicValue>> {
        Ok(vec![self.level])
    }

    fn is_combinational(&self) -> bool {
        false
    }

    fn start(&mut self, ctx: &mut EvalContext) {
        self.level = LogicValue::Low;
        self.edges = 0;
        ctx.schedule_edge(ctx.now().saturating_add(self.phase), Edge::Rising);
    }

    fn clock_edge(&mut self, edge: Edge, ctx: &mut EvalContext) {
        self.level = edge.level();
        self.edges += 1;
        let hold = match edge {
            Edge::Rising => self.high_time(),
            Edge::Falling => self.low_time(),
        };
        ctx.schedule_edge(ctx.now().saturating_add(hold), edge.opposite());
    }

    fn reset(&mut self) {
        self.level = LogicValue::Low;
        self.edges = 0;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
