//! Tire contact model.

use crate::error::ComponentResult;
use ev_core::numeric::{ensure_non_negative, ensure_positive};
use ev_core::units::Length;

/// Wheel/road contact properties.
///
/// Grip and rolling resistance are both coefficients on the normal load carried
/// by the wheelset, so a tire on its own has no notion of weight.
#[derive(Clone, Debug, PartialEq)]
pub struct Tire {
    /// Peak friction coefficient
    pub grip: f64,
    /// Rolling resistance coefficient (Crr)
    pub rolling_resistance: f64,
    /// Loaded wheel radius
    pub radius: Length,
}

impl Tire {
    pub fn new(grip: f64, rolling_resistance: f64, radius: Length) -> ComponentResult<Self> {
        ensure_positive(grip, "tire grip")?;
        ensure_non_negative(rolling_resistance, "tire rolling resistance")?;
        ensure_positive(radius.value, "tire radius")?;

        Ok(Self {
            grip,
            rolling_resistance,
            radius,
        })
    }

    pub fn radius_m(&self) -> f64 {
        self.radius.value
    }

    /// Largest tractive or braking force the contact patch can carry (N).
    pub fn grip_force(&self, normal_force_n: f64) -> f64 {
        self.grip * normal_force_n
    }

    /// Rolling drag for a given normal load (N).
    pub fn rolling_force(&self, normal_force_n: f64) -> f64 {
        self.rolling_resistance * normal_force_n
    }
}
