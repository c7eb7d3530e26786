//! Physical component models for the EV simulator.
//!
//! Static models ([`Tire`], [`Motor`], [`BatteryPack`], [`Drive`], [`Body`],
//! [`Vehicle`]) validate their parameters at construction and are immutable
//! afterwards. Per-run state ([`MotorState`], [`BatteryState`]) borrows a static
//! model and implements [`Constrained`], so the simulator can probe a demand
//! before committing it.

pub mod ambient;
pub mod battery;
pub mod body;
pub mod common;
pub mod drive;
pub mod error;
pub mod limit;
pub mod motor;
pub mod tire;
pub mod traits;
pub mod vehicle;

pub use ambient::Ambient;
pub use battery::{BatteryCell, BatteryDemand, BatteryPack, BatteryResponse, BatteryState};
pub use body::Body;
pub use drive::{Drive, DriveTransfer};
pub use error::{ComponentError, ComponentResult};
pub use limit::{LimitKind, LimitReason};
pub use motor::{Motor, MotorDemand, MotorRating, MotorResponse, MotorState, THERMAL_BUDGET_S};
pub use tire::Tire;
pub use traits::Constrained;
pub use vehicle::Vehicle;
