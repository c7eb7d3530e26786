//! Per-tick constrained operating-point simulator.

use crate::error::{SimError, SimResult};
use crate::options::{RegenPolicy, SimOptions};
use crate::power::{PowerBreakdown, labels};
use ev_components::{
    BatteryDemand, BatteryResponse, BatteryState, Constrained, Drive, DriveTransfer, LimitKind,
    LimitReason, MotorDemand, MotorResponse, MotorState, Vehicle,
};
use tracing::{debug, trace, warn};

/// Acceleration the start-up check asks for (m/s²).
pub const STARTUP_PROBE_MPS2: f64 = 1.0;

/// Resolution of the regen/friction split search (N).
const BRAKE_FORCE_TOLERANCE_N: f64 = 0.1;

/// Grid used to find any feasible regen share when regenerating nothing fails.
const BRAKE_SHARE_STEPS: u32 = 16;

/// Result of the operating-point search for one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct OperatingPoint {
    /// Best feasible acceleration found (m/s²)
    pub accel: f64,
    /// Last constraint encountered; `None` when the target itself is feasible
    pub limit: Option<LimitReason>,
}

/// What one tick achieved.
#[derive(Clone, Debug, PartialEq)]
pub struct TickOutcome {
    /// Acceleration applied over the tick (m/s²)
    pub accel: f64,
    /// Why the requested acceleration was not met, if it was not
    pub limit: Option<LimitReason>,
}

/// A driven wheelset and its motor's run state.
#[derive(Clone, Debug)]
struct DriveState<'a> {
    drive: &'a Drive,
    motor: MotorState<'a>,
}

/// Per-drive slice of an evaluated operating point.
#[derive(Clone, Debug)]
struct DrivePlan {
    slot: usize,
    transfer: DriveTransfer,
    demand: MotorDemand,
    response: MotorResponse,
}

/// Drivetrain and pack response to a total wheel force.
#[derive(Clone, Debug)]
struct Drivetrain {
    drives: Vec<DrivePlan>,
    battery_demand: BatteryDemand,
    battery: BatteryResponse,
}

/// Everything a feasible acceleration implies for one tick. Evaluating and
/// committing share this, so the committed point is the one that was checked.
#[derive(Clone, Debug)]
struct Plan {
    accel: f64,
    aero_n: f64,
    rolling_n: f64,
    /// Force taken by the friction brakes (N), never positive
    brake_n: f64,
    drivetrain: Drivetrain,
}

/// Simulation of one vehicle over a sequence of fixed-interval ticks.
///
/// The vehicle is borrowed for the whole run; all mutable state (kinematics,
/// battery charge, motor thermal load, the power ledger) lives here.
///
/// ## Model
///
/// For an acceleration `a` at speed `v`:
///
/// ```text
/// F_req   = m·a + F_aero(v)          checked against tire grip
/// F_total = F_req + F_roll           split evenly over driven wheelsets
/// P_bus   = Σ P_elec(drive) + P_acc  checked against the pack
/// ```
///
/// ## Sign Conventions
///
/// - Positive force/power: propulsion, battery discharging
/// - Negative force/power: braking, battery charging
#[derive(Clone, Debug)]
pub struct Simulator<'a> {
    vehicle: &'a Vehicle,
    options: SimOptions,
    time_s: f64,
    speed_mps: f64,
    distance_m: f64,
    bus_voltage_v: f64,
    battery_power_w: f64,
    battery_current_a: f64,
    power_use: PowerBreakdown,
    battery: BatteryState<'a>,
    drives: Vec<DriveState<'a>>,
}

impl<'a> Simulator<'a> {
    /// Start a run with default options.
    ///
    /// # Errors
    /// [`SimError::CannotMove`] when the vehicle cannot accelerate from rest.
    pub fn new(vehicle: &'a Vehicle) -> SimResult<Self> {
        Self::with_options(vehicle, SimOptions::default())
    }

    pub fn with_options(vehicle: &'a Vehicle, options: SimOptions) -> SimResult<Self> {
        options.validate()?;
        let battery =
            BatteryState::with_state_of_charge(&vehicle.battery, options.initial_state_of_charge)?;
        let drives: Vec<DriveState<'a>> = vehicle
            .body
            .drives
            .iter()
            .filter_map(|drive| {
                drive.motor.as_ref().map(|motor| DriveState {
                    drive,
                    motor: MotorState::new(motor),
                })
            })
            .collect();
        if drives.is_empty() {
            return Err(SimError::InvalidArg {
                what: "vehicle has no driven wheelset",
            });
        }

        let initial_speed = options.initial_speed_mps;
        let mut sim = Self {
            vehicle,
            options,
            time_s: 0.0,
            speed_mps: 0.0,
            distance_m: 0.0,
            bus_voltage_v: vehicle.battery.voltage_v(),
            battery_power_w: 0.0,
            battery_current_a: 0.0,
            power_use: PowerBreakdown::new(),
            battery,
            drives,
        };

        // Probe from rest regardless of the starting speed
        let probe = sim.find_operating_point(STARTUP_PROBE_MPS2);
        if probe.accel <= 0.0 {
            let reason = sim
                .can_operate(STARTUP_PROBE_MPS2)
                .err()
                .or(probe.limit)
                .unwrap_or_else(|| LimitReason::new(LimitKind::CannotHold));
            warn!(vehicle = %vehicle.name, %reason, "vehicle cannot move");
            return Err(SimError::CannotMove { reason });
        }
        debug!(
            vehicle = %vehicle.name,
            probe_accel = probe.accel,
            "simulator ready"
        );

        sim.speed_mps = initial_speed;
        Ok(sim)
    }

    pub fn vehicle(&self) -> &'a Vehicle {
        self.vehicle
    }

    pub fn options(&self) -> &SimOptions {
        &self.options
    }

    pub fn interval_s(&self) -> f64 {
        self.options.interval_s
    }

    pub fn time_s(&self) -> f64 {
        self.time_s
    }

    pub fn speed_mps(&self) -> f64 {
        self.speed_mps
    }

    pub fn distance_m(&self) -> f64 {
        self.distance_m
    }

    /// Terminal voltage after sag during the last tick (V).
    pub fn bus_voltage_v(&self) -> f64 {
        self.bus_voltage_v
    }

    /// Terminal power exchanged with the pack during the last tick (W).
    pub fn battery_power_w(&self) -> f64 {
        self.battery_power_w
    }

    pub fn battery_current_a(&self) -> f64 {
        self.battery_current_a
    }

    /// Where the pack's power went during the last tick.
    pub fn power_use(&self) -> &PowerBreakdown {
        &self.power_use
    }

    pub fn coulombs_used(&self) -> f64 {
        self.battery.coulombs_used()
    }

    pub fn charge_throughput_c(&self) -> f64 {
        self.battery.throughput_c()
    }

    pub fn state_of_charge(&self) -> f64 {
        self.battery.state_of_charge()
    }

    pub fn is_depleted(&self) -> bool {
        self.battery.is_depleted()
    }

    /// Energy needed from the grid to replace what the run drew (J).
    pub fn grid_energy_j(&self) -> f64 {
        self.battery.grid_energy_j()
    }

    /// Thermal overload accumulated by a drive's motor (s).
    pub fn motor_overload_s(&self, drive: &str) -> Option<f64> {
        self.drives
            .iter()
            .find(|d| d.drive.name == drive)
            .map(|d| d.motor.overload_s())
    }

    /// Check whether an acceleration is feasible at the current state.
    pub fn can_operate(&self, accel: f64) -> Result<(), LimitReason> {
        self.evaluate(accel).map(|_| ())
    }

    /// Search for the feasible acceleration closest to `target`.
    ///
    /// Assumes feasibility is monotone in acceleration magnitude between zero
    /// and the target. When nothing in that range is feasible the vehicle
    /// holds its speed or coasts, whichever is nearer the target; when neither
    /// is feasible the result is [`LimitKind::CannotHold`].
    pub fn find_operating_point(&self, target: f64) -> OperatingPoint {
        let mut limit = match self.evaluate(target) {
            Ok(_) => {
                return OperatingPoint {
                    accel: target,
                    limit: None,
                };
            }
            Err(reason) => reason,
        };

        let mut best = None;
        let mut guess = target / 2.0;
        let mut step = target / 4.0;
        while step.abs() > self.options.tolerance_mps2 {
            match self.evaluate(guess) {
                Ok(_) => {
                    best = Some(guess);
                    guess += step;
                }
                Err(reason) => {
                    limit = reason;
                    guess -= step;
                }
            }
            step /= 2.0;
        }

        if let Some(accel) = best {
            trace!(target_accel = target, accel, %limit, "operating point limited");
            return OperatingPoint {
                accel,
                limit: Some(limit),
            };
        }

        let coast = self.coast_accel();
        let mut fallbacks = [0.0, coast];
        fallbacks.sort_by(|a, b| (a - target).abs().total_cmp(&(b - target).abs()));
        let mut last = limit.clone();
        for accel in fallbacks {
            match self.evaluate(accel) {
                Ok(_) => {
                    debug!(
                        target_accel = target,
                        accel,
                        %limit,
                        "no operating point toward target"
                    );
                    return OperatingPoint {
                        accel,
                        limit: Some(limit),
                    };
                }
                Err(reason) => last = reason,
            }
        }

        warn!(
            target_accel = target,
            reason = %last,
            time_s = self.time_s,
            "cannot hold position"
        );
        OperatingPoint {
            accel: coast,
            limit: Some(LimitReason::new(LimitKind::CannotHold)),
        }
    }

    /// Advance one interval toward a target acceleration.
    ///
    /// The target is clamped so the vehicle never reverses; a tick whose target
    /// was raised by that clamp reports [`LimitKind::Stopped`] unless something
    /// else limited it.
    pub fn tick(&mut self, target: f64) -> TickOutcome {
        let floor = -self.speed_mps / self.options.interval_s;
        let stopping = target < floor;
        let mut point = self.find_operating_point(target.max(floor));
        if stopping && point.limit.is_none() {
            point.limit = Some(LimitReason::new(LimitKind::Stopped));
        }

        let cannot_hold = matches!(
            &point.limit,
            Some(reason) if reason.kind == LimitKind::CannotHold
        );
        if cannot_hold {
            self.advance_unpowered(point.accel);
            return TickOutcome {
                accel: point.accel,
                limit: point.limit,
            };
        }

        match self.evaluate(point.accel).and_then(|plan| self.operate(&plan)) {
            Ok(()) => TickOutcome {
                accel: point.accel,
                limit: point.limit,
            },
            Err(reason) => {
                warn!(%reason, accel = point.accel, "commit rejected a checked operating point");
                let coast = self.coast_accel();
                self.advance_unpowered(coast);
                TickOutcome {
                    accel: coast,
                    limit: Some(reason),
                }
            }
        }
    }

    /// Natural deceleration with no tractive force, stopping at rest.
    fn coast_accel(&self) -> f64 {
        let v = self.speed_mps;
        if v <= 0.0 {
            return 0.0;
        }
        let body = &self.vehicle.body;
        let drag = body.aero_drag_n(v, &self.vehicle.ambient) + body.rolling_drag_n();
        (-drag / body.mass_kg()).max(-v / self.options.interval_s)
    }

    fn evaluate(&self, accel: f64) -> Result<Plan, LimitReason> {
        let body = &self.vehicle.body;
        let v = self.speed_mps;
        let aero = body.aero_drag_n(v, &self.vehicle.ambient);
        let rolling = body.rolling_drag_n();

        let required = body.mass_kg() * accel + aero;
        body.check_grip(required)?;

        let total = required + rolling;
        let (drivetrain, brake_n) = match self.drivetrain(accel, total) {
            Ok(drivetrain) => (drivetrain, 0.0),
            Err(reason) if total < 0.0 && self.regen_overflow_braked(&reason) => {
                self.blend_friction_brakes(accel, total)?
            }
            Err(reason) => return Err(reason),
        };

        Ok(Plan {
            accel,
            aero_n: aero,
            rolling_n: rolling,
            brake_n,
            drivetrain,
        })
    }

    fn regen_overflow_braked(&self, reason: &LimitReason) -> bool {
        self.options.regen == RegenPolicy::FrictionBrakes
            && (reason.kind.is_motor() || reason.kind.is_battery())
    }

    /// Largest share of a braking force the drivetrain can regenerate; the
    /// friction brakes take the rest.
    ///
    /// Regenerating nothing leaves the pack carrying the accessories alone. A
    /// depleted pack cannot, and then only the upper shares are feasible.
    fn blend_friction_brakes(
        &self,
        accel: f64,
        total_n: f64,
    ) -> Result<(Drivetrain, f64), LimitReason> {
        let (mut feasible, mut infeasible) = match self.drivetrain(accel, 0.0) {
            Ok(drivetrain) => ((0.0, drivetrain), 1.0),
            Err(reason) => self.highest_regen_share(accel, total_n).ok_or(reason)?,
        };
        while (infeasible - feasible.0) * total_n.abs() > BRAKE_FORCE_TOLERANCE_N {
            let mid = 0.5 * (feasible.0 + infeasible);
            match self.drivetrain(accel, total_n * mid) {
                Ok(drivetrain) => feasible = (mid, drivetrain),
                Err(_) => infeasible = mid,
            }
        }
        let (fraction, drivetrain) = feasible;
        Ok((drivetrain, total_n * (1.0 - fraction)))
    }

    /// Scan down from full regen for the first feasible share. Returns it with
    /// the infeasible share just above.
    fn highest_regen_share(&self, accel: f64, total_n: f64) -> Option<((f64, Drivetrain), f64)> {
        let mut infeasible = 1.0;
        for step in (1..BRAKE_SHARE_STEPS).rev() {
            let share = f64::from(step) / f64::from(BRAKE_SHARE_STEPS);
            match self.drivetrain(accel, total_n * share) {
                Ok(drivetrain) => return Some(((share, drivetrain), infeasible)),
                Err(_) => infeasible = share,
            }
        }
        None
    }

    /// Push a total wheel force through every driven wheelset and the pack.
    fn drivetrain(&self, accel: f64, wheel_force_n: f64) -> Result<Drivetrain, LimitReason> {
        let v = self.speed_mps;
        let dt = self.options.interval_s;
        let next_v = v + accel * dt;
        let share = self.vehicle.body.split_force(wheel_force_n);

        let mut drives = Vec::with_capacity(self.drives.len());
        let mut electrical_w = 0.0;
        for (slot, state) in self.drives.iter().enumerate() {
            let drive = state.drive;
            let transfer = drive.transfer(v, share);
            let demand = MotorDemand {
                shaft_speed_rad_s: transfer.shaft_speed_rad_s,
                next_shaft_speed_rad_s: drive.shaft_speed(next_v),
                torque_nm: transfer.shaft_torque_nm,
                dt_s: dt,
            };
            let response = state
                .motor
                .check(&demand)
                .map_err(|reason| reason.within(&drive.name))?;
            electrical_w += response.electrical_power_w;
            drives.push(DrivePlan {
                slot,
                transfer,
                demand,
                response,
            });
        }

        let battery_demand = BatteryDemand {
            power_w: electrical_w + self.vehicle.accessory_power_w(),
            dt_s: dt,
        };
        let battery = self.battery.check(&battery_demand)?;
        Ok(Drivetrain {
            drives,
            battery_demand,
            battery,
        })
    }

    /// Commit a checked plan: component state, ledger, kinematics.
    fn operate(&mut self, plan: &Plan) -> Result<(), LimitReason> {
        let drivetrain = &plan.drivetrain;
        for drive_plan in &drivetrain.drives {
            let state = &mut self.drives[drive_plan.slot];
            state
                .motor
                .commit(&drive_plan.demand)
                .map_err(|reason| reason.within(&state.drive.name))?;
        }
        let battery = self.battery.commit(&drivetrain.battery_demand)?;

        let v = self.speed_mps;
        let mut ledger = PowerBreakdown::new();
        ledger.set(&[labels::AERODYNAMIC], plan.aero_n * v);
        ledger.set(&[labels::ROLLING_RESISTANCE], plan.rolling_n * v);
        ledger.set(&[labels::ACCESSORY], self.vehicle.accessory_power_w());
        ledger.set(
            &[labels::ACCELERATION],
            self.vehicle.body.mass_kg() * plan.accel * v,
        );
        ledger.set(&[labels::FRICTION_BRAKES], -plan.brake_n * v);
        for drive_plan in &drivetrain.drives {
            let name = self.drives[drive_plan.slot].drive.name.as_str();
            ledger.set(
                &[labels::DRIVETRAIN, name, labels::GEAR_FRICTION],
                drive_plan.transfer.gear_loss_w,
            );
            ledger.set(
                &[labels::DRIVETRAIN, name, labels::MOTOR_LOSS],
                drive_plan.response.loss_w,
            );
        }
        ledger.set(
            &[labels::BATTERY, labels::INTERNAL_RESISTANCE],
            battery.internal_loss_w,
        );

        self.power_use = ledger;
        self.bus_voltage_v = battery.bus_voltage_v;
        self.battery_power_w = battery.terminal_power_w;
        self.battery_current_a = battery.current_a;
        self.advance(plan.accel);
        Ok(())
    }

    /// Advance kinematics with no power exchanged; the battery is untouched.
    fn advance_unpowered(&mut self, accel: f64) {
        let body = &self.vehicle.body;
        let v = self.speed_mps;
        let mut ledger = PowerBreakdown::new();
        ledger.set(
            &[labels::AERODYNAMIC],
            body.aero_drag_n(v, &self.vehicle.ambient) * v,
        );
        ledger.set(&[labels::ROLLING_RESISTANCE], body.rolling_drag_n() * v);
        ledger.set(&[labels::ACCELERATION], body.mass_kg() * accel * v);

        self.power_use = ledger;
        self.bus_voltage_v = self.vehicle.battery.voltage_v();
        self.battery_power_w = 0.0;
        self.battery_current_a = 0.0;
        self.advance(accel);
    }

    fn advance(&mut self, accel: f64) {
        let dt = self.options.interval_s;
        self.distance_m += self.speed_mps * dt;
        self.speed_mps = (self.speed_mps + accel * dt).max(0.0);
        self.time_s += dt;
    }
}
