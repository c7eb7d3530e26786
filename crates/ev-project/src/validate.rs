//! Structural validation of vehicle files.
//!
//! Checks what the component constructors cannot see: versions, names and
//! references, schedule shape. Physical ranges are enforced when compiling.

use crate::schema::{BatteryDef, LATEST_VERSION, ScheduleDef, VehicleFile};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing value: {field} ({reason})")]
    Missing { field: String, reason: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(file: &VehicleFile) -> Result<(), ValidationError> {
    if file.version == 0 || file.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: file.version,
        });
    }
    if file.name.trim().is_empty() {
        return Err(ValidationError::Missing {
            field: "name".to_string(),
            reason: "vehicle needs a name".to_string(),
        });
    }

    let drives = &file.body.drives;
    if drives.is_empty() {
        return Err(ValidationError::Missing {
            field: "body.drives".to_string(),
            reason: "vehicle needs at least one wheelset".to_string(),
        });
    }
    if !drives.iter().any(|d| d.motor.is_some()) {
        return Err(ValidationError::Missing {
            field: "body.drives[].motor".to_string(),
            reason: "vehicle needs at least one driven wheelset".to_string(),
        });
    }
    let mut drive_names = HashSet::new();
    for drive in drives {
        if !drive_names.insert(drive.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: drive.name.clone(),
                context: "body.drives".to_string(),
            });
        }
    }

    if let BatteryDef::Cells {
        series, parallel, ..
    } = &file.battery
    {
        if *series == 0 || *parallel == 0 {
            return Err(ValidationError::InvalidValue {
                field: "battery.series/parallel".to_string(),
                value: format!("{series}s{parallel}p"),
                reason: "cell counts must be positive".to_string(),
            });
        }
    }

    let mut schedule_names = HashSet::new();
    for schedule in &file.schedules {
        if !schedule_names.insert(schedule.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: schedule.name.clone(),
                context: "schedules".to_string(),
            });
        }
        validate_schedule(schedule)?;
    }

    Ok(())
}

fn validate_schedule(schedule: &ScheduleDef) -> Result<(), ValidationError> {
    if !(schedule.interval_s.is_finite() && schedule.interval_s > 0.0) {
        return Err(ValidationError::InvalidValue {
            field: format!("schedules.{}.interval_s", schedule.name),
            value: schedule.interval_s.to_string(),
            reason: "interval must be positive".to_string(),
        });
    }
    if schedule.speeds_mps.is_empty() {
        return Err(ValidationError::Missing {
            field: format!("schedules.{}.speeds_mps", schedule.name),
            reason: "schedule has no speeds".to_string(),
        });
    }
    if let Some(speed) = schedule
        .speeds_mps
        .iter()
        .find(|s| !(s.is_finite() && **s >= 0.0))
    {
        return Err(ValidationError::InvalidValue {
            field: format!("schedules.{}.speeds_mps", schedule.name),
            value: speed.to_string(),
            reason: "speeds must be finite and non-negative".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::*;

    fn file() -> VehicleFile {
        let tire = TireDef {
            grip: 1.0,
            rolling_resistance: 0.01,
            radius_m: 0.3,
        };
        VehicleFile {
            version: LATEST_VERSION,
            name: "car".to_string(),
            body: BodyDef {
                mass_kg: 1_500.0,
                cda_m2: 0.6,
                drives: vec![
                    DriveDef {
                        name: "front".to_string(),
                        weight_fraction: 0.5,
                        tire: tire.clone(),
                        motor: None,
                        gear_ratio: 1.0,
                        efficiency: 1.0,
                    },
                    DriveDef {
                        name: "rear".to_string(),
                        weight_fraction: 0.5,
                        tire,
                        motor: Some(MotorDef {
                            name: None,
                            peak_torque_nm: 300.0,
                            peak_power_w: 150_000.0,
                            continuous_torque_nm: 150.0,
                            continuous_power_w: 75_000.0,
                            max_shaft_speed_rad_s: 1_500.0,
                            efficiency: 0.9,
                        }),
                        gear_ratio: 9.0,
                        efficiency: 0.95,
                    },
                ],
            },
            battery: BatteryDef::Pack {
                nominal_voltage_v: 350.0,
                internal_resistance_ohm: 0.1,
                capacity_ah: 200.0,
                max_current_a: 600.0,
                charger_efficiency: 0.9,
            },
            accessory_power_w: 500.0,
            ambient: AmbientDef::default(),
            schedules: vec![ScheduleDef {
                name: "ramp".to_string(),
                interval_s: 1.0,
                speeds_mps: vec![0.0, 5.0, 10.0],
            }],
        }
    }

    #[test]
    fn valid_file_passes() {
        assert!(validate_project(&file()).is_ok());
    }

    #[test]
    fn version_is_checked() {
        let mut f = file();
        f.version = LATEST_VERSION + 1;
        assert!(matches!(
            validate_project(&f),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn duplicate_drive_names_rejected() {
        let mut f = file();
        f.body.drives[0].name = "rear".to_string();
        assert!(matches!(
            validate_project(&f),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn needs_a_motor() {
        let mut f = file();
        f.body.drives[1].motor = None;
        assert!(matches!(
            validate_project(&f),
            Err(ValidationError::Missing { .. })
        ));
    }

    #[test]
    fn schedule_shape_checked() {
        let mut f = file();
        f.schedules[0].interval_s = 0.0;
        assert!(validate_project(&f).is_err());

        let mut f = file();
        f.schedules[0].speeds_mps.push(-1.0);
        assert!(validate_project(&f).is_err());

        let mut f = file();
        f.schedules[0].speeds_mps.clear();
        assert!(validate_project(&f).is_err());
    }

    #[test]
    fn cell_counts_checked() {
        let mut f = file();
        f.battery = BatteryDef::Cells {
            cell: CellDef {
                nominal_voltage_v: 3.6,
                internal_resistance_ohm: 0.02,
                capacity_ah: 3.0,
                max_current_a: 15.0,
            },
            series: 96,
            parallel: 0,
            charger_efficiency: 0.9,
        };
        assert!(validate_project(&f).is_err());
    }
}
