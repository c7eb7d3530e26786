//! Vehicle chassis: mass, aerodynamics and the set of wheelsets.

use crate::ambient::Ambient;
use crate::drive::Drive;
use crate::error::{ComponentError, ComponentResult};
use crate::limit::{LimitKind, LimitReason};
use ev_core::numeric::{ensure_non_negative, ensure_positive};
use ev_core::units::{Area, Mass};

/// Allowed deviation of the summed weight fractions from one.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Chassis with its ordered list of driven and free wheelsets.
///
/// ## Model
///
/// ```text
/// F_aero = ½ · CdA · ρ(T, p) · v²
/// F_roll = Σ_drives w_i · m · g · Crr_i
/// ```
///
/// Tractive force is shared evenly between driven wheelsets; freewheels carry
/// weight and contribute rolling drag only.
#[derive(Clone, Debug, PartialEq)]
pub struct Body {
    pub mass: Mass,
    /// Drag coefficient times frontal area
    pub cda: Area,
    pub drives: Vec<Drive>,
}

impl Body {
    pub fn new(mass: Mass, cda: Area, drives: Vec<Drive>) -> ComponentResult<Self> {
        ensure_positive(mass.value, "body mass")?;
        ensure_non_negative(cda.value, "body CdA")?;
        if !drives.iter().any(Drive::is_driven) {
            return Err(ComponentError::InvalidArg {
                what: "body needs at least one driven wheelset",
            });
        }
        let weight: f64 = drives.iter().map(|d| d.weight_fraction).sum();
        if (weight - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ComponentError::OutOfRange {
                what: "sum of drive weight fractions",
                value: weight,
            });
        }

        Ok(Self { mass, cda, drives })
    }

    pub fn mass_kg(&self) -> f64 {
        self.mass.value
    }

    pub fn aero_drag_n(&self, speed_mps: f64, ambient: &Ambient) -> f64 {
        0.5 * self.cda.value * ambient.air_density_kg_m3() * speed_mps * speed_mps
    }

    /// Rolling drag summed over every wheelset, driven or not (N).
    pub fn rolling_drag_n(&self) -> f64 {
        let mass = self.mass_kg();
        self.drives.iter().map(|d| d.rolling_drag(mass)).sum()
    }

    pub fn driven(&self) -> impl Iterator<Item = &Drive> {
        self.drives.iter().filter(|d| d.is_driven())
    }

    pub fn driven_count(&self) -> usize {
        self.driven().count()
    }

    /// Share of a total tractive force carried by each driven wheelset (N).
    pub fn split_force(&self, total_force_n: f64) -> f64 {
        total_force_n / self.driven_count() as f64
    }

    /// Check that every driven wheelset can carry its share of a force.
    pub fn check_grip(&self, total_force_n: f64) -> Result<(), LimitReason> {
        let share = self.split_force(total_force_n).abs();
        let mass = self.mass_kg();
        match self.driven().find(|d| share > d.grip_limit(mass)) {
            Some(drive) => Err(LimitReason::on(LimitKind::TireGrip, &drive.name)),
            None => Ok(()),
        }
    }
}
