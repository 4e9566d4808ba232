//! Error types for the simulation engine.
//!
//! Only [`DomainError`] and the structural errors reach callers directly.
//! Evaluation-time failures are contained by the drain loops and exposed
//! per component through [`Simulation::last_error`](crate::Simulation::last_error).

use thiserror::Error;

use crate::types::{ComponentId, PinRef, WireId};

/// Malformed literal input to the logic value conversions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid logic character {ch:?} at position {position}")]
    InvalidCharacter { ch: char, position: usize },

    #[error("empty logic literal")]
    Empty,
}

/// A component violated the evaluation contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("expected {expected} input values, got {actual}")]
    InputArity { expected: usize, actual: usize },

    #[error("expected {expected} output values, got {actual}")]
    OutputArity { expected: usize, actual: usize },

    #[error("combinational component returned different outputs for identical inputs")]
    NonIdempotent,

    #[error("{0}")]
    Component(String),
}

/// Result type for component evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// A component tried to dirty itself while it was being evaluated.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("component {0} cannot be marked dirty while evaluating")]
pub struct ReentrancyError(pub ComponentId);

/// Misuse of the timeline's control operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineError {
    #[error("timeline must be paused to step")]
    NotPaused,
}

/// Structural errors when editing or querying the circuit graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CircuitError {
    #[error("unknown component {0}")]
    UnknownComponent(ComponentId),

    #[error("unknown wire {0}")]
    UnknownWire(WireId),

    #[error("pin {0} does not exist")]
    PinOutOfRange(PinRef),

    #[error("pin {0} has the wrong direction for this operation")]
    DirectionMismatch(PinRef),

    #[error("component {0} does not accept external input")]
    NotAnInput(ComponentId),

    #[error("no component type registered as {0:?}")]
    UnknownType(String),

    #[error("attribute {key:?} has malformed value {value:?}")]
    InvalidAttribute { key: String, value: String },
}

/// Umbrella error for simulation operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Reentrancy(#[from] ReentrancyError),

    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error(transparent)]
    Circuit(#[from] CircuitError),
}

/// Convenience alias for `Result<T, SimError>`.
pub type SimResult<T> = Result<T, SimError>;
