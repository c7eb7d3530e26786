//! Vehicle file loading, saving, validation, and introspection.

use ev_project::schema::{ScheduleDef, VehicleFile};
use ev_project::ProjectError;
use std::path::Path;

use crate::error::{AppError, AppResult};
use crate::runtime_compile;

/// Summary of a schedule for listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSummary {
    pub name: String,
    pub segment_count: usize,
    pub duration_s: f64,
    pub top_speed_mps: f64,
}

/// Load a vehicle file, YAML or JSON by extension.
pub fn load_project(path: &Path) -> AppResult<VehicleFile> {
    Ok(ev_project::load(path)?)
}

/// Save a vehicle file, JSON for `.json` paths and YAML otherwise.
pub fn save_project(path: &Path, file: &VehicleFile) -> AppResult<()> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let saved = if is_json {
        ev_project::save_json(path, file)
    } else {
        ev_project::save_yaml(path, file)
    };
    saved.map_err(|e| match e {
        ProjectError::Io(source) => AppError::ProjectFileWrite {
            path: path.to_path_buf(),
            source,
        },
        other => other.into(),
    })
}

/// Structural validation plus a trial compile, so physically impossible
/// parameters are reported before any run starts.
pub fn validate_project(file: &VehicleFile) -> AppResult<()> {
    ev_project::validate_project(file)?;
    runtime_compile::compile_vehicle(file)?;
    Ok(())
}

pub fn list_schedules(file: &VehicleFile) -> Vec<ScheduleSummary> {
    file.schedules
        .iter()
        .map(|schedule| ScheduleSummary {
            name: schedule.name.clone(),
            segment_count: schedule.speeds_mps.len(),
            duration_s: schedule.interval_s * schedule.speeds_mps.len() as f64,
            top_speed_mps: schedule.speeds_mps.iter().copied().fold(0.0, f64::max),
        })
        .collect()
}

/// Get a schedule by name.
pub fn get_schedule<'a>(file: &'a VehicleFile, name: &str) -> AppResult<&'a ScheduleDef> {
    file.schedules
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| AppError::ScheduleNotFound(name.to_string()))
}
