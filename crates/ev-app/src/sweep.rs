//! Steady-speed sweeps. Each speed gets its own simulator, so points are
//! evaluated in parallel against the shared vehicle.

use ev_components::Vehicle;
use ev_sim::{PowerBreakdown, SimOptions, Simulator};
use rayon::prelude::*;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// Largest acceleration tolerated while holding a speed (m/s²).
pub const HOLD_ACCEL_TOLERANCE_MPS2: f64 = 0.01;

/// Where the power goes while holding one speed.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedPower {
    pub speed_mps: f64,
    pub power: PowerBreakdown,
}

/// One point of an efficiency-versus-speed curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyPoint {
    pub speed_mps: f64,
    /// Chemical power drawn from the pack (W)
    pub power_w: f64,
    pub wh_per_km: f64,
}

/// Power attribution for holding each speed for one tick.
pub fn power_at_speeds(
    vehicle: &Vehicle,
    speeds_mps: &[f64],
    options: &SimOptions,
) -> AppResult<Vec<SpeedPower>> {
    speeds_mps
        .par_iter()
        .map(|&speed_mps| hold_speed(vehicle, speed_mps, options))
        .collect()
}

fn hold_speed(vehicle: &Vehicle, speed_mps: f64, options: &SimOptions) -> AppResult<SpeedPower> {
    let options = SimOptions {
        initial_speed_mps: speed_mps,
        ..options.clone()
    };
    let mut sim = Simulator::with_options(vehicle, options)?;
    let out = sim.tick(0.0);
    if out.accel.abs() > HOLD_ACCEL_TOLERANCE_MPS2 {
        debug!(speed_mps, accel = out.accel, limit = ?out.limit, "cannot hold speed");
        return Err(AppError::CannotHoldSpeed {
            speed_mps,
            accel_mps2: out.accel,
        });
    }
    Ok(SpeedPower {
        speed_mps,
        power: sim.power_use().clone(),
    })
}

/// Energy per distance at constant speed. Speeds must be positive.
pub fn efficiency_curve(
    vehicle: &Vehicle,
    speeds_mps: &[f64],
    options: &SimOptions,
) -> AppResult<Vec<EfficiencyPoint>> {
    if let Some(bad) = speeds_mps.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
        return Err(AppError::InvalidInput(format!(
            "efficiency speeds must be positive, got {bad}"
        )));
    }
    let points = power_at_speeds(vehicle, speeds_mps, options)?
        .into_iter()
        .map(|point| {
            let power_w = point.power.total();
            EfficiencyPoint {
                speed_mps: point.speed_mps,
                power_w,
                // J/m to Wh/km
                wh_per_km: power_w / point.speed_mps / 3.6,
            }
        })
        .collect();
    Ok(points)
}
