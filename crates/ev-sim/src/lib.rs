//! Per-tick constrained operating-point simulation for electric vehicles.
//!
//! Provides:
//! - [`Simulator`]: fixed-interval state machine with a bisection search for
//!   the best feasible acceleration under grip, motor and battery limits
//! - [`PowerBreakdown`]: per-tick attribution of battery power to its sinks
//! - [`SimOptions`] / [`RegenPolicy`]: run configuration

pub mod error;
pub mod options;
pub mod power;
pub mod simulator;

pub use error::{SimError, SimResult};
pub use options::{RegenPolicy, SimOptions};
pub use power::{PowerBreakdown, labels};
pub use simulator::{OperatingPoint, STARTUP_PROBE_MPS2, Simulator, TickOutcome};
