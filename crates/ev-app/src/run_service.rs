//! Scenario runs: speed-schedule playback and full-throttle acceleration.

use ev_components::Vehicle;
use ev_core::units::constants::{KPH_100_MPS, QUARTER_MILE_M};
use ev_project::schema::ScheduleDef;
use ev_sim::{SimOptions, Simulator};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::limits::{LimitSpan, LimitTracker};

/// Largest mismatch between requested and achieved acceleration a schedule
/// tolerates (m/s²).
pub const SCHEDULE_ACCEL_TOLERANCE_MPS2: f64 = 0.01;

/// Outcome of playing back a speed schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleResult {
    pub name: String,
    /// Mean chemical power drawn over each segment (W)
    pub segment_power_w: Vec<f64>,
    pub distance_m: f64,
    pub duration_s: f64,
    /// Net charge drawn at nominal voltage (J)
    pub energy_j: f64,
    /// Energy needed from the wall to replace the charge drawn (J)
    pub grid_energy_j: f64,
    pub final_state_of_charge: f64,
}

impl ScheduleResult {
    /// Net consumption per distance, Wh/km. Zero when the vehicle never moved.
    pub fn wh_per_km(&self) -> f64 {
        if self.distance_m > 0.0 {
            self.energy_j / 3.6 / self.distance_m
        } else {
            0.0
        }
    }
}

/// Follow a schedule from rest: each segment asks for the constant acceleration
/// that reaches its speed by the end of the interval.
///
/// Fails when any tick misses its acceleration by more than
/// [`SCHEDULE_ACCEL_TOLERANCE_MPS2`] or the battery runs out.
pub fn run_schedule(
    vehicle: &Vehicle,
    schedule: &ScheduleDef,
    options: &SimOptions,
) -> AppResult<ScheduleResult> {
    if !(schedule.interval_s >= options.interval_s) {
        return Err(AppError::InvalidInput(format!(
            "schedule '{}' interval {} s is shorter than the tick {} s",
            schedule.name, schedule.interval_s, options.interval_s
        )));
    }

    let mut sim = Simulator::with_options(vehicle, options.clone())?;
    let ticks_per_segment = ((schedule.interval_s / sim.interval_s()).round() as usize).max(1);
    let mut segment_power_w = Vec::with_capacity(schedule.speeds_mps.len());
    let coulombs_at_start = sim.coulombs_used();

    for (segment, &speed) in schedule.speeds_mps.iter().enumerate() {
        let accel = (speed - sim.speed_mps()) / schedule.interval_s;
        let mut energy = 0.0;
        for _ in 0..ticks_per_segment {
            let out = sim.tick(accel);
            if (out.accel - accel).abs() > SCHEDULE_ACCEL_TOLERANCE_MPS2 {
                let cause = out
                    .limit
                    .map(|reason| format!(" ({reason})"))
                    .unwrap_or_default();
                return Err(AppError::ScheduleFailed {
                    schedule: schedule.name.clone(),
                    segment,
                    message: format!(
                        "vehicle failed to accelerate at {accel:.2} m/s² (only {:.2}){cause}",
                        out.accel
                    ),
                });
            }
            if sim.is_depleted() {
                return Err(AppError::ScheduleFailed {
                    schedule: schedule.name.clone(),
                    segment,
                    message: "battery depleted before end of schedule".to_string(),
                });
            }
            energy += sim.power_use().total();
        }
        segment_power_w.push(energy / ticks_per_segment as f64);
    }

    let result = ScheduleResult {
        name: schedule.name.clone(),
        segment_power_w,
        distance_m: sim.distance_m(),
        duration_s: sim.time_s(),
        energy_j: (sim.coulombs_used() - coulombs_at_start) * vehicle.battery.voltage_v(),
        grid_energy_j: sim.grid_energy_j(),
        final_state_of_charge: sim.state_of_charge(),
    };
    info!(
        schedule = %result.name,
        distance_m = result.distance_m,
        energy_j = result.energy_j,
        "schedule complete"
    );
    Ok(result)
}

/// Settings for a full-throttle run.
#[derive(Debug, Clone)]
pub struct AccelOptions {
    pub sim: SimOptions,
    /// Requested acceleration, large enough that some constraint always binds
    pub request_mps2: f64,
    /// Achieved acceleration below which the vehicle is at top speed
    pub settled_mps2: f64,
    /// Simulated-time cap on the run
    pub max_time_s: f64,
}

impl Default for AccelOptions {
    fn default() -> Self {
        Self {
            sim: SimOptions::default(),
            request_mps2: 10_000.0,
            settled_mps2: 0.01,
            max_time_s: 600.0,
        }
    }
}

/// Standing-start performance figures.
#[derive(Debug, Clone, PartialEq)]
pub struct AccelProfile {
    pub top_speed_mps: f64,
    /// Time at which acceleration fell below the settle threshold (s)
    pub time_to_top_speed_s: f64,
    /// `None` when the vehicle tops out below 100 km/h
    pub time_to_100_kph_s: Option<f64>,
    pub quarter_mile_s: f64,
    pub peak_accel_mps2: f64,
    /// What limited acceleration over the run
    pub limits: Vec<LimitSpan>,
}

/// Full throttle from rest until both top speed and the quarter mile are
/// reached.
pub fn run_acceleration_profile(
    vehicle: &Vehicle,
    options: &AccelOptions,
) -> AppResult<AccelProfile> {
    let mut sim = Simulator::with_options(vehicle, options.sim.clone())?;
    let dt = sim.interval_s();
    let mut tracker = LimitTracker::new();
    let mut peak_accel: f64 = 0.0;
    let mut time_to_100 = None;
    let mut quarter_mile = None;
    let mut top_speed = None;

    while top_speed.is_none() || quarter_mile.is_none() {
        if sim.time_s() >= options.max_time_s {
            return Err(AppError::ProfileTimeout {
                limit_s: options.max_time_s,
            });
        }
        let out = sim.tick(options.request_mps2);
        tracker.record(out.limit.as_ref(), dt);
        peak_accel = peak_accel.max(out.accel);

        if time_to_100.is_none() && top_speed.is_none() && sim.speed_mps() > KPH_100_MPS {
            time_to_100 = Some(sim.time_s());
        }
        if quarter_mile.is_none() && sim.distance_m() > QUARTER_MILE_M {
            quarter_mile = Some(sim.time_s());
        }
        if top_speed.is_none() && out.accel < options.settled_mps2 {
            debug!(
                speed_mps = sim.speed_mps(),
                time_s = sim.time_s(),
                limit = ?out.limit,
                "reached top speed"
            );
            top_speed = Some((sim.speed_mps(), sim.time_s()));
        }
    }

    let (top_speed_mps, time_to_top_speed_s) = top_speed.unwrap_or_default();
    let profile = AccelProfile {
        top_speed_mps,
        time_to_top_speed_s,
        time_to_100_kph_s: time_to_100,
        quarter_mile_s: quarter_mile.unwrap_or_default(),
        peak_accel_mps2: peak_accel,
        limits: tracker.finish(),
    };
    info!(
        vehicle = %vehicle.name,
        top_speed_mps = profile.top_speed_mps,
        quarter_mile_s = profile.quarter_mile_s,
        "acceleration run complete"
    );
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(distance_m: f64, energy_j: f64) -> ScheduleResult {
        ScheduleResult {
            name: "trace".to_string(),
            segment_power_w: vec![],
            distance_m,
            duration_s: 0.0,
            energy_j,
            grid_energy_j: energy_j,
            final_state_of_charge: 1.0,
        }
    }

    #[test]
    fn consumption_per_km() {
        // 150 Wh over 1 km
        assert!((result(1_000.0, 540_000.0).wh_per_km() - 150.0).abs() < 1e-9);
        assert_eq!(result(0.0, 1_000.0).wh_per_km(), 0.0);
    }

    #[test]
    fn accel_defaults_request_full_throttle() {
        let options = AccelOptions::default();
        assert!(options.request_mps2 > 100.0);
        assert_eq!(options.settled_mps2, 0.01);
    }
}
