//! Error types for the ev-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the backend crates and gives
/// the CLI a single error surface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to write project file: {path}")]
    ProjectFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error("Vehicle compilation failed: {0}")]
    Compile(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Schedule '{schedule}' failed at segment {segment}: {message}")]
    ScheduleFailed {
        schedule: String,
        segment: usize,
        message: String,
    },

    #[error("Vehicle can not maintain speed {speed_mps:.2} m/s (achieved {accel_mps2:.3} m/s²)")]
    CannotHoldSpeed { speed_mps: f64, accel_mps2: f64 },

    #[error("Acceleration run did not finish within {limit_s} s of simulated time")]
    ProfileTimeout { limit_s: f64 },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ev-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<ev_project::ProjectError> for AppError {
    fn from(err: ev_project::ProjectError) -> Self {
        match err {
            ev_project::ProjectError::Validation(e) => AppError::Validation(e.to_string()),
            other => AppError::Project(other.to_string()),
        }
    }
}

impl From<ev_project::ValidationError> for AppError {
    fn from(err: ev_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<ev_components::ComponentError> for AppError {
    fn from(err: ev_components::ComponentError) -> Self {
        AppError::Compile(err.to_string())
    }
}

impl From<ev_sim::SimError> for AppError {
    fn from(err: ev_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ev_components::{LimitKind, LimitReason};

    #[test]
    fn sim_errors_keep_their_message() {
        let err: AppError = ev_sim::SimError::CannotMove {
            reason: LimitReason::new(LimitKind::BatteryCharge),
        }
        .into();
        assert!(matches!(err, AppError::Simulation(_)));
        assert!(err.to_string().contains("battery charge depleted"));
    }

    #[test]
    fn project_validation_maps_to_validation() {
        let err: AppError = ev_project::ProjectError::Validation(
            ev_project::ValidationError::UnsupportedVersion { version: 9 },
        )
        .into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
