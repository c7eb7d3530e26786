//! Runtime compilation of a `VehicleFile` into component models.

use ev_components::{
    Ambient, BatteryCell, BatteryPack, Body, Drive, Motor, MotorRating, Tire, Vehicle,
};
use ev_core::units::{amp_hours, amps, k, kg, m, m2, nm, ohms, pa, rad_per_s, volts, watts};
use ev_project::schema::{AmbientDef, BatteryDef, BodyDef, DriveDef, MotorDef, VehicleFile};
use std::path::Path;
use tracing::debug;

use crate::error::AppResult;
use crate::project_service;

/// A vehicle file together with the vehicle compiled from it.
#[derive(Debug, Clone)]
pub struct LoadedVehicle {
    pub file: VehicleFile,
    pub vehicle: Vehicle,
}

/// Compile a vehicle definition into an immutable [`Vehicle`].
pub fn compile_vehicle(file: &VehicleFile) -> AppResult<Vehicle> {
    let body = build_body(&file.body)?;
    let battery = build_battery(&file.battery)?;
    let ambient = build_ambient(&file.ambient)?;
    let vehicle = Vehicle::new(
        file.name.clone(),
        body,
        battery,
        watts(file.accessory_power_w),
        ambient,
    )?;
    debug!(
        vehicle = %vehicle.name,
        driven = vehicle.body.driven_count(),
        pack_v = vehicle.battery.voltage_v(),
        pack_max_w = vehicle.battery.max_power_w(),
        "compiled vehicle"
    );
    Ok(vehicle)
}

/// Load, validate and compile a vehicle file.
pub fn load_vehicle(path: &Path) -> AppResult<LoadedVehicle> {
    let file = project_service::load_project(path)?;
    let vehicle = compile_vehicle(&file)?;
    Ok(LoadedVehicle { file, vehicle })
}

pub fn build_body(def: &BodyDef) -> AppResult<Body> {
    let drives = def
        .drives
        .iter()
        .map(build_drive)
        .collect::<AppResult<Vec<_>>>()?;
    Ok(Body::new(kg(def.mass_kg), m2(def.cda_m2), drives)?)
}

fn build_drive(def: &DriveDef) -> AppResult<Drive> {
    let tire = Tire::new(
        def.tire.grip,
        def.tire.rolling_resistance,
        m(def.tire.radius_m),
    )
    .map_err(|e| e.in_drive(&def.name))?;

    let drive = match &def.motor {
        Some(motor) => {
            let motor = build_motor(&def.name, motor).map_err(|e| e.in_drive(&def.name))?;
            Drive::driven(
                def.name.clone(),
                motor,
                tire,
                def.gear_ratio,
                def.efficiency,
                def.weight_fraction,
            )?
        }
        None => Drive::freewheel(def.name.clone(), tire, def.weight_fraction)?,
    };
    Ok(drive)
}

fn build_motor(
    drive_name: &str,
    def: &MotorDef,
) -> Result<Motor, ev_components::ComponentError> {
    let name = def
        .name
        .clone()
        .unwrap_or_else(|| format!("{drive_name} motor"));
    Motor::new(
        name,
        MotorRating::new(nm(def.peak_torque_nm), watts(def.peak_power_w)),
        MotorRating::new(nm(def.continuous_torque_nm), watts(def.continuous_power_w)),
        rad_per_s(def.max_shaft_speed_rad_s),
        def.efficiency,
    )
}

pub fn build_battery(def: &BatteryDef) -> AppResult<BatteryPack> {
    let pack = match def {
        BatteryDef::Pack {
            nominal_voltage_v,
            internal_resistance_ohm,
            capacity_ah,
            max_current_a,
            charger_efficiency,
        } => BatteryPack::new(
            volts(*nominal_voltage_v),
            ohms(*internal_resistance_ohm),
            amp_hours(*capacity_ah),
            amps(*max_current_a),
            *charger_efficiency,
        )?,
        BatteryDef::Cells {
            cell,
            series,
            parallel,
            charger_efficiency,
        } => {
            let cell = BatteryCell::new(
                volts(cell.nominal_voltage_v),
                ohms(cell.internal_resistance_ohm),
                amp_hours(cell.capacity_ah),
                amps(cell.max_current_a),
            )?;
            BatteryPack::from_cells(&cell, *series, *parallel, *charger_efficiency)?
        }
    };
    Ok(pack)
}

fn build_ambient(def: &AmbientDef) -> AppResult<Ambient> {
    Ok(Ambient::new(k(def.temperature_k), pa(def.pressure_pa))?)
}
