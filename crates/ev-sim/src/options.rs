//! Simulation run options.

use crate::error::{SimError, SimResult};

/// What happens when braking asks for more than regeneration can absorb.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegenPolicy {
    /// Regenerate as much as the motors and pack accept and dissipate the rest
    /// in the friction brakes.
    #[default]
    FrictionBrakes,
    /// Braking beyond regeneration capability is infeasible; the solver backs
    /// off toward zero deceleration.
    Infeasible,
}

/// Options for a simulation run.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Fixed tick interval (seconds)
    pub interval_s: f64,
    /// Operating-point search tolerance (m/s²)
    pub tolerance_mps2: f64,
    pub regen: RegenPolicy,
    /// Vehicle speed at the start of the run (m/s)
    pub initial_speed_mps: f64,
    /// Battery state of charge at the start of the run, in [0, 1]
    pub initial_state_of_charge: f64,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            interval_s: 1e-3,
            tolerance_mps2: 1e-3,
            regen: RegenPolicy::default(),
            initial_speed_mps: 0.0,
            initial_state_of_charge: 1.0,
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.interval_s.is_finite() && self.interval_s > 0.0) {
            return Err(SimError::InvalidArg {
                what: "interval must be positive",
            });
        }
        if !(self.tolerance_mps2.is_finite() && self.tolerance_mps2 > 0.0) {
            return Err(SimError::InvalidArg {
                what: "solver tolerance must be positive",
            });
        }
        if !(self.initial_speed_mps.is_finite() && self.initial_speed_mps >= 0.0) {
            return Err(SimError::InvalidArg {
                what: "initial speed must not be negative",
            });
        }
        if !(0.0..=1.0).contains(&self.initial_state_of_charge) {
            return Err(SimError::InvalidArg {
                what: "initial state of charge must be in [0, 1]",
            });
        }
        Ok(())
    }
}
