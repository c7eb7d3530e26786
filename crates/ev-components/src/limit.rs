//! Limiting causes reported when an operating point is infeasible.
//!
//! These are search signals, not failures of the simulation: the solver treats
//! them as boundaries and reports the last one it hit so callers can tell why a
//! requested acceleration was not achieved. Reasons compare structurally, so a
//! scenario runner can group consecutive ticks limited by the same cause.

use thiserror::Error;

/// Closed set of physical constraints that can bound an operating point.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LimitKind {
    #[error("tire grip")]
    TireGrip,

    #[error("motor torque")]
    MotorTorque,

    #[error("motor power")]
    MotorPower,

    #[error("motor shaft speed")]
    MotorSpeed,

    #[error("motor temperature")]
    MotorThermal,

    #[error("battery current")]
    BatteryCurrent,

    #[error("battery charge depleted")]
    BatteryCharge,

    #[error("battery full")]
    BatteryFull,

    #[error("battery power")]
    BatteryPower,

    #[error("cannot hold position")]
    CannotHold,

    /// Braking harder than this would reverse the vehicle within one tick
    #[error("vehicle stopped")]
    Stopped,
}

impl LimitKind {
    pub fn is_battery(self) -> bool {
        matches!(
            self,
            LimitKind::BatteryCurrent
                | LimitKind::BatteryCharge
                | LimitKind::BatteryFull
                | LimitKind::BatteryPower
        )
    }

    pub fn is_motor(self) -> bool {
        matches!(
            self,
            LimitKind::MotorTorque
                | LimitKind::MotorPower
                | LimitKind::MotorSpeed
                | LimitKind::MotorThermal
        )
    }
}

/// A limiting cause plus the component it came from, when there is more than one
/// candidate (drives on a multi-axle vehicle).
#[derive(Error, Debug, Clone, PartialEq, Eq, Hash)]
#[error("{kind}{}", on_component(.component))]
pub struct LimitReason {
    pub kind: LimitKind,
    pub component: Option<String>,
}

fn on_component(component: &Option<String>) -> String {
    match component {
        Some(name) => format!(" ({name})"),
        None => String::new(),
    }
}

impl LimitReason {
    pub fn new(kind: LimitKind) -> Self {
        Self {
            kind,
            component: None,
        }
    }

    pub fn on(kind: LimitKind, component: impl Into<String>) -> Self {
        Self {
            kind,
            component: Some(component.into()),
        }
    }

    /// Qualify a reason with its owning component. An inner name already set is
    /// kept as a path, `outer: inner`.
    pub fn within(mut self, component: &str) -> Self {
        self.component = Some(match self.component.take() {
            Some(inner) => format!("{component}: {inner}"),
            None => component.to_string(),
        });
        self
    }
}

impl From<LimitKind> for LimitReason {
    fn from(kind: LimitKind) -> Self {
        LimitReason::new(kind)
    }
}
