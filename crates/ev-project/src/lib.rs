//! ev-project: vehicle description file format and validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_project};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<VehicleFile> {
    let content = std::fs::read_to_string(path)?;
    let file: VehicleFile = serde_yaml::from_str(&content)?;
    validate_project(&file)?;
    Ok(file)
}

pub fn save_yaml(path: &std::path::Path, file: &VehicleFile) -> ProjectResult<()> {
    validate_project(file)?;
    let content = serde_yaml::to_string(file)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<VehicleFile> {
    let content = std::fs::read_to_string(path)?;
    let file: VehicleFile = serde_json::from_str(&content)?;
    validate_project(&file)?;
    Ok(file)
}

pub fn save_json(path: &std::path::Path, file: &VehicleFile) -> ProjectResult<()> {
    validate_project(file)?;
    let content = serde_json::to_string_pretty(file)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Load by file extension: `.json` as JSON, anything else as YAML.
pub fn load(path: &std::path::Path) -> ProjectResult<VehicleFile> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => load_json(path),
        _ => load_yaml(path),
    }
}
