//! Built-in component implementations.
//!
//! - [`Combinational`]: gates and arbitrary truth functions
//! - [`Stateful`]: transition-function components such as [`d_flip_flop`]
//! - [`InputSwitch`] and [`Probe`]: circuit boundary
//! - [`Clock`]: self-scheduling square wave

pub mod clock;
pub mod combinational;
pub mod io;
pub mod stateful;

pub use clock::Clock;
pub use combinational::{Combinational, TruthFn};
pub use io::{InputSwitch, Probe};
pub use stateful::{d_flip_flop, FlipFlopState, Stateful, TransitionFn};
