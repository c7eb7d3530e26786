//! Shared application service layer for evflow.
//!
//! Compiles vehicle files into component models and drives the simulator
//! through the standard scenarios: schedule playback, standing-start
//! acceleration, and steady-speed power and efficiency sweeps.

pub mod error;
pub mod limits;
pub mod project_service;
pub mod run_service;
pub mod runtime_compile;
pub mod sweep;

pub use error::{AppError, AppResult};
pub use limits::{LimitSpan, LimitTracker, summarize_limits};
pub use project_service::{
    ScheduleSummary, get_schedule, list_schedules, load_project, save_project, validate_project,
};
pub use run_service::{
    AccelOptions, AccelProfile, ScheduleResult, run_acceleration_profile, run_schedule,
};
pub use runtime_compile::{LoadedVehicle, compile_vehicle, load_vehicle};
pub use sweep::{EfficiencyPoint, SpeedPower, efficiency_curve, power_at_speeds};
