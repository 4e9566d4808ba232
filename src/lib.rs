//! # quadsim
//!
//! A discrete-event simulation engine for four-valued digital logic.
//!
//! Signals take one of four values ([`LogicValue`]: `Low`, `High`, `HighZ`,
//! `Unknown`). Components are connected output-to-input by wires; when an
//! input changes, the owning component is marked dirty and re-evaluated,
//! and its changed outputs propagate either immediately (zero delay) or
//! through events on a [`Timeline`].
//!
//! ## Layers
//!
//! - **Algebra**: [`value`] (four-valued logic, bit and hex strings) and
//!   [`resolver`] (how several drivers on one input combine).
//! - **Components**: the [`Component`] trait and the built-ins in
//!   [`components`].
//! - **Scheduling**: [`recalc`] drains dirty components without recursion;
//!   [`timeline`] orders delayed effects and maps logical to real time.
//! - **Context**: [`Simulation`] ties one circuit, one timeline and one
//!   recalculation manager together.
//!
//! ## Quick Start
//!
//! ```rust
//! use quadsim::components::{Clock, Probe};
//! use quadsim::{LogicValue, ManualClock, PinRef, Simulation, SimConfigBuilder};
//! use std::sync::Arc;
//!
//! let config = SimConfigBuilder::new().start_paused(true).build().unwrap();
//! let mut sim = Simulation::from_config(Arc::new(ManualClock::new()), &config);
//!
//! let clk = sim.add_component("clk", Box::new(Clock::new(100)));
//! let probe = sim.add_component("probe", Box::new(Probe::new()));
//! sim.connect(PinRef::output(clk, 0), PinRef::input(probe, 0)).unwrap();
//!
//! sim.run_until(250).unwrap();
//! let rising = sim.component::<Probe>(probe).unwrap().times_of(LogicValue::High);
//! assert_eq!(rising, vec![0, 100, 200]);
//! ```
//!
//! ## Configuration-Driven Setup
//!
//! ```rust,ignore
//! use quadsim::{Simulation, SimConfig, SystemClock};
//!
//! let config = SimConfig::from_file("engine.yaml")?;
//! quadsim::init_logging(&config.simulation.log_level);
//! let sim = Simulation::from_config(Arc::new(SystemClock::new()), &config);
//! ```

pub mod types;
pub mod error;
pub mod value;
pub mod resolver;
pub mod event;
pub mod clock;
pub mod timeline;
pub mod component;
pub mod components;
pub mod circuit;
pub mod recalc;
pub mod quiescence;
pub mod simulation;
pub mod config;
pub mod registry;
pub mod stats;

// Re-export commonly used types
pub use types::{ComponentId, PinDirection, PinRef, SimTime, WireId};
pub use error::{
    CircuitError, DomainError, EvalError, EvalResult, ReentrancyError, SimError, SimResult,
    TimelineError,
};
pub use value::{
    format_bits, format_hex, invert, parse_bits, parse_hex, resolve_drivers, LogicValue,
};
pub use resolver::{DriverResolution, Resolution, UnconnectedInput};
pub use event::{Edge, EventId, ScheduledEvent, SimEvent};
pub use clock::{ManualClock, SystemClock, TimeSource};
pub use timeline::{Batch, Timeline, TimelineConfig, TimelineStats};
pub use component::{Component, ComponentStatus, EvalContext};
pub use circuit::{Circuit, ComponentSlot, Wire};
pub use recalc::{PassReport, RecalcManager, RecalcStats};
pub use quiescence::Quiescence;
pub use simulation::Simulation;
pub use config::{ConfigError, SimConfig, SimConfigBuilder, SimulationParams};
pub use registry::{create_default_registry, ComponentRegistry};
pub use stats::{SimulationStats, StatsCollector, Timer};

/// Initialize the tracing subscriber for logging.
///
/// Call this at the start of your program to enable logging. `RUST_LOG`
/// takes precedence over `level`.
///
/// # Example
///
/// ```rust,ignore
/// quadsim::init_logging("debug");
/// ```
pub fn init_logging(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
