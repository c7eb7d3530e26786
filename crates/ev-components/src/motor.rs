//! Traction motor model.

use crate::common::{EPSILON_SHAFT_SPEED, transfer};
use crate::error::{ComponentError, ComponentResult};
use crate::limit::{LimitKind, LimitReason};
use crate::traits::Constrained;
use ev_core::numeric::{ensure_finite, ensure_fraction, ensure_positive};
use ev_core::units::{AngularVelocity, Power, Torque};

/// Accumulated full-overload time after which the motor is considered too hot (s).
pub const THERMAL_BUDGET_S: f64 = 20.0;

/// One point of a torque/power envelope.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotorRating {
    pub torque: Torque,
    pub power: Power,
}

impl MotorRating {
    pub fn new(torque: Torque, power: Power) -> Self {
        Self { torque, power }
    }
}

/// Electric traction motor.
///
/// ## Model
///
/// Available shaft torque at speed ω is capped by both envelopes:
///
/// ```text
/// τ_max(ω) = min(τ_peak, P_peak / |ω|)
/// ```
///
/// Operation above the continuous rating is allowed for a limited time. The
/// overload fraction measures how far into the continuous-to-peak gap the point
/// sits; its time integral is tracked by [`MotorState`] and may not exceed
/// [`THERMAL_BUDGET_S`].
///
/// ## Sign Conventions
///
/// - Positive shaft power drives the wheels; electrical draw is `P / η`
/// - Negative shaft power is regenerative; electrical return is `P · η`
#[derive(Clone, Debug, PartialEq)]
pub struct Motor {
    /// Component name for limit attribution
    pub name: String,
    pub peak: MotorRating,
    pub continuous: MotorRating,
    pub max_shaft_speed: AngularVelocity,
    /// Electrical ↔ mechanical conversion efficiency (0 < eta <= 1)
    pub efficiency: f64,
}

impl Motor {
    /// Create a new motor.
    ///
    /// # Errors
    /// Returns error if any rating is non-positive, a peak rating is below its
    /// continuous counterpart, or the efficiency is outside (0,1].
    pub fn new(
        name: String,
        peak: MotorRating,
        continuous: MotorRating,
        max_shaft_speed: AngularVelocity,
        efficiency: f64,
    ) -> ComponentResult<Self> {
        ensure_positive(continuous.torque.value, "motor continuous torque")?;
        ensure_positive(continuous.power.value, "motor continuous power")?;
        ensure_finite(peak.torque.value, "motor peak torque")?;
        ensure_finite(peak.power.value, "motor peak power")?;
        ensure_positive(max_shaft_speed.value, "motor max shaft speed")?;
        ensure_fraction(efficiency, "motor efficiency")?;

        if peak.torque.value < continuous.torque.value {
            return Err(ComponentError::InvalidArg {
                what: "motor peak torque must not be below continuous torque",
            });
        }
        if peak.power.value < continuous.power.value {
            return Err(ComponentError::InvalidArg {
                what: "motor peak power must not be below continuous power",
            });
        }

        Ok(Self {
            name,
            peak,
            continuous,
            max_shaft_speed,
            efficiency,
        })
    }

    /// Largest torque magnitude available at a shaft speed (N·m).
    pub fn max_torque(&self, shaft_speed_rad_s: f64) -> f64 {
        let omega = shaft_speed_rad_s.abs();
        if omega < EPSILON_SHAFT_SPEED {
            return self.peak.torque.value;
        }
        self.peak.torque.value.min(self.peak.power.value / omega)
    }

    /// Electrical power exchanged with the bus for a shaft power (W).
    pub fn electrical_power(&self, shaft_power_w: f64) -> f64 {
        transfer(shaft_power_w, self.efficiency)
    }

    /// Fraction of the continuous-to-peak gap in use, the larger of the torque
    /// and power axes. Zero at or below the continuous rating.
    pub fn overload(&self, torque_nm: f64, power_w: f64) -> f64 {
        let axis = |value: f64, cont: f64, peak: f64| -> f64 {
            let value = value.abs();
            if value <= cont {
                0.0
            } else if peak > cont {
                (value - cont) / (peak - cont)
            } else {
                // Peak equals continuous: anything above is already past peak.
                1.0
            }
        };
        let t = axis(
            torque_nm,
            self.continuous.torque.value,
            self.peak.torque.value,
        );
        let p = axis(power_w, self.continuous.power.value, self.peak.power.value);
        t.max(p)
    }

    /// Headroom below the continuous rating in [0, 1]; drives thermal recovery.
    pub fn underload(&self, torque_nm: f64, power_w: f64) -> f64 {
        let t = torque_nm.abs() / self.continuous.torque.value;
        let p = power_w.abs() / self.continuous.power.value;
        (1.0 - t.max(p)).clamp(0.0, 1.0)
    }
}

/// Request made of a motor for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotorDemand {
    /// Shaft speed at the start of the tick (rad/s)
    pub shaft_speed_rad_s: f64,
    /// Shaft speed the tick would end at (rad/s)
    pub next_shaft_speed_rad_s: f64,
    /// Requested shaft torque (N·m), negative when absorbing
    pub torque_nm: f64,
    /// Tick duration (s)
    pub dt_s: f64,
}

/// Power flows through a motor for an accepted demand.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MotorResponse {
    /// Mechanical power at the shaft (W), positive toward the wheels
    pub shaft_power_w: f64,
    /// Electrical power at the bus (W), positive when drawing
    pub electrical_power_w: f64,
    /// Conversion loss (W), never negative
    pub loss_w: f64,
}

/// Per-run motor state: the thermal overload accumulator.
#[derive(Clone, Debug)]
pub struct MotorState<'a> {
    motor: &'a Motor,
    overload_s: f64,
}

impl<'a> MotorState<'a> {
    pub fn new(motor: &'a Motor) -> Self {
        Self {
            motor,
            overload_s: 0.0,
        }
    }

    pub fn motor(&self) -> &'a Motor {
        self.motor
    }

    /// Equivalent seconds of full overload accumulated so far.
    pub fn overload_s(&self) -> f64 {
        self.overload_s
    }

    fn evaluate(&self, demand: &MotorDemand) -> Result<(MotorResponse, f64), LimitReason> {
        let motor = self.motor;
        let omega = demand.shaft_speed_rad_s;
        let torque = demand.torque_nm;

        let omega_max = motor.max_shaft_speed.value;
        let next = demand.next_shaft_speed_rad_s.abs();
        if next > omega_max && next > omega.abs() {
            return Err(LimitReason::on(LimitKind::MotorSpeed, &motor.name));
        }

        if torque.abs() > motor.peak.torque.value {
            return Err(LimitReason::on(LimitKind::MotorTorque, &motor.name));
        }

        let shaft_power = omega * torque;
        if shaft_power.abs() > motor.peak.power.value {
            return Err(LimitReason::on(LimitKind::MotorPower, &motor.name));
        }

        let overload = motor.overload(torque, shaft_power);
        if overload > 0.0 && self.overload_s + overload * demand.dt_s > THERMAL_BUDGET_S {
            return Err(LimitReason::on(LimitKind::MotorThermal, &motor.name));
        }

        let electrical = motor.electrical_power(shaft_power);
        let response = MotorResponse {
            shaft_power_w: shaft_power,
            electrical_power_w: electrical,
            loss_w: (electrical - shaft_power).abs(),
        };
        Ok((response, overload))
    }
}

impl Constrained for MotorState<'_> {
    type Demand = MotorDemand;
    type Response = MotorResponse;

    fn name(&self) -> &str {
        &self.motor.name
    }

    fn check(&self, demand: &MotorDemand) -> Result<MotorResponse, LimitReason> {
        self.evaluate(demand).map(|(response, _)| response)
    }

    fn commit(&mut self, demand: &MotorDemand) -> Result<MotorResponse, LimitReason> {
        let (response, overload) = self.evaluate(demand)?;
        if overload > 0.0 {
            self.overload_s += overload * demand.dt_s;
        } else {
            let underload = self
                .motor
                .underload(demand.torque_nm, response.shaft_power_w);
            self.overload_s = (self.overload_s - underload * demand.dt_s).max(0.0);
        }
        Ok(response)
    }
}
