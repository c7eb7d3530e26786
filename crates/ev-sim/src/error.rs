//! Error types for simulation runs.

use ev_components::{ComponentError, LimitReason};
use thiserror::Error;

/// Errors raised while setting up a simulation run.
///
/// Per-tick infeasibility is not an error: it is reported through
/// [`LimitReason`] on each tick's outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Vehicle cannot move: {reason}")]
    CannotMove { reason: LimitReason },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<ComponentError> for SimError {
    fn from(e: ComponentError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ev_components::LimitKind;

    #[test]
    fn cannot_move_names_the_limit() {
        let err = SimError::CannotMove {
            reason: LimitReason::new(LimitKind::BatteryCharge),
        };
        assert_eq!(err.to_string(), "Vehicle cannot move: battery charge depleted");
    }

    #[test]
    fn component_errors_become_backend() {
        let err: SimError = ComponentError::InvalidArg { what: "bad" }.into();
        assert!(matches!(err, SimError::Backend { .. }));
    }
}
