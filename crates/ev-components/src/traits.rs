//! Core traits for component state models.

use crate::limit::LimitReason;

/// Per-run state of a component whose operating envelope is checked before it
/// is committed.
///
/// `check` is a pure function of the current state and the demand, suitable for
/// repeated probing by the operating-point search. `commit` applies the same
/// demand and mutates the component's counters (charge used, thermal load).
/// Both must agree: any demand `check` accepts, `commit` accepts with the same
/// response.
pub trait Constrained {
    /// What the rest of the vehicle asks of this component for one tick.
    type Demand;

    /// What the component reports back (power drawn, losses, ...).
    type Response;

    /// Component name for diagnostics and limit attribution.
    fn name(&self) -> &str;

    /// Evaluate a demand without mutating state.
    fn check(&self, demand: &Self::Demand) -> Result<Self::Response, LimitReason>;

    /// Apply a demand, updating internal counters.
    fn commit(&mut self, demand: &Self::Demand) -> Result<Self::Response, LimitReason>;
}
