//! Vehicle description file schema.
//!
//! Plain SI values with unit-suffixed field names; physical validation happens
//! when the description is compiled into component models.

use ev_core::units::constants::{STD_PRESSURE_PA, STD_TEMPERATURE_K};
use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleFile {
    pub version: u32,
    pub name: String,
    pub body: BodyDef,
    pub battery: BatteryDef,
    #[serde(default)]
    pub accessory_power_w: f64,
    #[serde(default)]
    pub ambient: AmbientDef,
    #[serde(default)]
    pub schedules: Vec<ScheduleDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BodyDef {
    pub mass_kg: f64,
    pub cda_m2: f64,
    pub drives: Vec<DriveDef>,
}

/// One wheelset. Without a motor it is a freewheel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriveDef {
    pub name: String,
    pub weight_fraction: f64,
    pub tire: TireDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motor: Option<MotorDef>,
    #[serde(default = "default_unity")]
    pub gear_ratio: f64,
    #[serde(default = "default_unity")]
    pub efficiency: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TireDef {
    pub grip: f64,
    pub rolling_resistance: f64,
    pub radius_m: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MotorDef {
    /// Defaults to "<drive> motor"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub peak_torque_nm: f64,
    pub peak_power_w: f64,
    pub continuous_torque_nm: f64,
    pub continuous_power_w: f64,
    pub max_shaft_speed_rad_s: f64,
    pub efficiency: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum BatteryDef {
    Pack {
        nominal_voltage_v: f64,
        internal_resistance_ohm: f64,
        capacity_ah: f64,
        max_current_a: f64,
        #[serde(default = "default_unity")]
        charger_efficiency: f64,
    },
    Cells {
        cell: CellDef,
        series: u32,
        parallel: u32,
        #[serde(default = "default_unity")]
        charger_efficiency: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellDef {
    pub nominal_voltage_v: f64,
    pub internal_resistance_ohm: f64,
    pub capacity_ah: f64,
    pub max_current_a: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmbientDef {
    pub temperature_k: f64,
    pub pressure_pa: f64,
}

impl Default for AmbientDef {
    fn default() -> Self {
        Self {
            temperature_k: STD_TEMPERATURE_K,
            pressure_pa: STD_PRESSURE_PA,
        }
    }
}

/// Speed trace: one target speed per interval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleDef {
    pub name: String,
    pub interval_s: f64,
    pub speeds_mps: Vec<f64>,
}

fn default_unity() -> f64 {
    1.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let yaml = r#"
version: 1
name: minimal
body:
  mass_kg: 1200.0
  cda_m2: 0.55
  drives:
    - name: front
      weight_fraction: 1.0
      tire: { grip: 1.0, rolling_resistance: 0.01, radius_m: 0.3 }
      motor:
        peak_torque_nm: 250.0
        peak_power_w: 100000.0
        continuous_torque_nm: 120.0
        continuous_power_w: 50000.0
        max_shaft_speed_rad_s: 1200.0
        efficiency: 0.92
battery:
  type: Pack
  nominal_voltage_v: 350.0
  internal_resistance_ohm: 0.1
  capacity_ah: 150.0
  max_current_a: 400.0
"#;
        let file: VehicleFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.accessory_power_w, 0.0);
        assert_eq!(file.ambient, AmbientDef::default());
        assert!(file.schedules.is_empty());
        let drive = &file.body.drives[0];
        assert_eq!(drive.gear_ratio, 1.0);
        assert_eq!(drive.efficiency, 1.0);
        assert!(drive.motor.as_ref().unwrap().name.is_none());
        assert!(matches!(
            file.battery,
            BatteryDef::Pack {
                charger_efficiency, ..
            } if charger_efficiency == 1.0
        ));
    }
}
