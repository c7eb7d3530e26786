//! Error types for component construction.

use ev_core::error::EvError;
use thiserror::Error;

/// Errors raised while validating a component's static parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComponentError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Out of range: {what} = {value}")]
    OutOfRange { what: &'static str, value: f64 },

    #[error("Non-physical value: {what}")]
    NonPhysical { what: &'static str },

    #[error("Drive '{name}': {source}")]
    InDrive {
        name: String,
        #[source]
        source: Box<ComponentError>,
    },
}

pub type ComponentResult<T> = Result<T, ComponentError>;

impl ComponentError {
    /// Attach the owning drive's name to a nested error.
    pub fn in_drive(self, name: &str) -> Self {
        ComponentError::InDrive {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}

impl From<EvError> for ComponentError {
    fn from(e: EvError) -> Self {
        match e {
            EvError::NonFinite { what, .. } => ComponentError::NonPhysical { what },
            EvError::OutOfRange { what, value } => ComponentError::OutOfRange { what, value },
        }
    }
}
