//! Wheelset drive: motor + gearing + tire, or a free-rolling axle.

use crate::error::{ComponentError, ComponentResult};
use crate::motor::Motor;
use crate::tire::Tire;
use ev_core::numeric::{ensure_finite, ensure_fraction};
use ev_core::units::constants::G_MPS2;

/// One wheelset of the vehicle.
///
/// A drive with a motor converts between force at the contact patch and torque
/// at the motor shaft through its gear ratio and wheel radius. A drive without a
/// motor is a freewheel: it carries weight and rolls with drag, nothing more.
///
/// ## Model
///
/// ```text
/// ω_shaft = (v / r_wheel) · G
/// τ_shaft = F·r / (G·η)      delivering force to the road
/// τ_shaft = F·r·η / G        absorbing force from the road
/// ```
///
/// Gear-mesh loss is the gap between shaft and wheel power, which is
/// `|ω·τ|·(1 − η)` when delivering.
#[derive(Clone, Debug, PartialEq)]
pub struct Drive {
    pub name: String,
    /// Absent for a freewheel axle
    pub motor: Option<Motor>,
    pub tire: Tire,
    /// Motor revolutions per wheel revolution
    pub gear_ratio: f64,
    /// Mechanical efficiency of the gear train (0 < eta <= 1)
    pub efficiency: f64,
    /// Share of vehicle weight carried by this wheelset (0 < w <= 1)
    pub weight_fraction: f64,
}

/// Force/torque/power conversion through a drive for one operating point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DriveTransfer {
    pub shaft_speed_rad_s: f64,
    pub shaft_torque_nm: f64,
    /// Power at the motor shaft (W)
    pub shaft_power_w: f64,
    /// Power at the contact patch (W)
    pub wheel_power_w: f64,
    /// Gear-mesh loss (W), never negative
    pub gear_loss_w: f64,
}

impl Drive {
    /// Create a motor-driven wheelset.
    pub fn driven(
        name: String,
        motor: Motor,
        tire: Tire,
        gear_ratio: f64,
        efficiency: f64,
        weight_fraction: f64,
    ) -> ComponentResult<Self> {
        let result = (|| -> ComponentResult<()> {
            if ensure_finite(gear_ratio, "drive gear ratio")? == 0.0 {
                return Err(ComponentError::InvalidArg {
                    what: "drive gearing must not be zero",
                });
            }
            ensure_fraction(efficiency, "drive efficiency")?;
            ensure_fraction(weight_fraction, "drive weight fraction")?;
            Ok(())
        })();
        result.map_err(|e| e.in_drive(&name))?;

        Ok(Self {
            name,
            motor: Some(motor),
            tire,
            gear_ratio,
            efficiency,
            weight_fraction,
        })
    }

    /// Create a free-rolling axle.
    pub fn freewheel(name: String, tire: Tire, weight_fraction: f64) -> ComponentResult<Self> {
        ensure_fraction(weight_fraction, "drive weight fraction")
            .map_err(|e| ComponentError::from(e).in_drive(&name))?;
        Ok(Self {
            name,
            motor: None,
            tire,
            gear_ratio: 1.0,
            efficiency: 1.0,
            weight_fraction,
        })
    }

    pub fn is_driven(&self) -> bool {
        self.motor.is_some()
    }

    /// Normal force on this wheelset's tires (N).
    pub fn normal_force(&self, vehicle_mass_kg: f64) -> f64 {
        self.weight_fraction * vehicle_mass_kg * G_MPS2
    }

    /// Largest force the tires can transmit (N).
    pub fn grip_limit(&self, vehicle_mass_kg: f64) -> f64 {
        self.tire.grip_force(self.normal_force(vehicle_mass_kg))
    }

    /// Rolling drag of this wheelset (N).
    pub fn rolling_drag(&self, vehicle_mass_kg: f64) -> f64 {
        self.tire.rolling_force(self.normal_force(vehicle_mass_kg))
    }

    pub fn shaft_speed(&self, vehicle_speed_mps: f64) -> f64 {
        (vehicle_speed_mps / self.tire.radius_m()) * self.gear_ratio
    }

    /// Shaft torque for a force at the wheel (N·m), efficiency by direction.
    pub fn shaft_torque(&self, wheel_force_n: f64) -> f64 {
        let lever = wheel_force_n * self.tire.radius_m() / self.gear_ratio;
        if wheel_force_n > 0.0 {
            lever / self.efficiency
        } else {
            lever * self.efficiency
        }
    }

    /// Convert a wheel force at a vehicle speed into shaft quantities.
    pub fn transfer(&self, vehicle_speed_mps: f64, wheel_force_n: f64) -> DriveTransfer {
        let shaft_speed = self.shaft_speed(vehicle_speed_mps);
        let shaft_torque = self.shaft_torque(wheel_force_n);
        let shaft_power = shaft_speed * shaft_torque;
        let wheel_power = wheel_force_n * vehicle_speed_mps;
        DriveTransfer {
            shaft_speed_rad_s: shaft_speed,
            shaft_torque_nm: shaft_torque,
            shaft_power_w: shaft_power,
            wheel_power_w: wheel_power,
            gear_loss_w: shaft_power - wheel_power,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ComponentError;
    use crate::motor::MotorRating;
    use ev_core::units::{m, nm, rad_per_s, watts};

    fn motor() -> Motor {
        Motor::new(
            "m".into(),
            MotorRating::new(nm(200.0), watts(100_000.0)),
            MotorRating::new(nm(100.0), watts(50_000.0)),
            rad_per_s(1_200.0),
            0.95,
        )
        .unwrap()
    }

    fn drive(eta: f64) -> Drive {
        Drive::driven(
            "rear".into(),
            motor(),
            Tire::new(1.0, 0.01, m(0.3)).unwrap(),
            9.0,
            eta,
            0.5,
        )
        .unwrap()
    }

    #[test]
    fn drive_validation() {
        let tire = Tire::new(1.0, 0.01, m(0.3)).unwrap();
        let err = Drive::driven("front".into(), motor(), tire.clone(), 0.0, 0.9, 0.5).unwrap_err();
        assert!(err.to_string().contains("front"));
        assert!(Drive::driven("f".into(), motor(), tire.clone(), 9.0, 1.5, 0.5).is_err());
        assert!(Drive::driven("f".into(), motor(), tire.clone(), 9.0, 0.9, 0.0).is_err());
        assert!(Drive::freewheel("f".into(), tire.clone(), 1.2).is_err());
        let fw = Drive::freewheel("f".into(), tire, 0.4).unwrap();
        assert!(!fw.is_driven());
    }

    #[test]
    fn weight_fraction_errors_are_out_of_range() {
        let tire = Tire::new(1.0, 0.01, m(0.3)).unwrap();
        let err = Drive::freewheel("rear".into(), tire, 1.2).unwrap_err();
        match err {
            ComponentError::InDrive { name, source } => {
                assert_eq!(name, "rear");
                assert_eq!(
                    *source,
                    ComponentError::OutOfRange {
                        what: "drive weight fraction",
                        value: 1.2,
                    }
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn shaft_kinematics() {
        let d = drive(1.0);
        assert!((d.shaft_speed(3.0) - 90.0).abs() < 1e-9);
        assert!((d.shaft_torque(300.0) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn gear_loss_delivering_matches_mesh_formula() {
        let d = drive(0.9);
        let t = d.transfer(10.0, 1_000.0);
        let mesh = (t.shaft_speed_rad_s * t.shaft_torque_nm).abs() * (1.0 - 0.9);
        assert!((t.gear_loss_w - mesh).abs() < 1e-6);
        assert!(t.shaft_power_w > t.wheel_power_w);
    }

    #[test]
    fn gear_loss_absorbing_is_positive() {
        let d = drive(0.9);
        let t = d.transfer(10.0, -1_000.0);
        assert!(t.shaft_power_w < 0.0);
        assert!((t.shaft_power_w + 9_000.0).abs() < 1e-6);
        assert!((t.gear_loss_w - 1_000.0).abs() < 1e-6);
    }

    #[test]
    fn grip_and_rolling_use_weight_share() {
        let d = drive(0.9);
        assert!((d.normal_force(1_000.0) - 4_905.0).abs() < 1e-9);
        assert!((d.grip_limit(1_000.0) - 4_905.0).abs() < 1e-9);
        assert!((d.rolling_drag(1_000.0) - 49.05).abs() < 1e-9);
    }
}
