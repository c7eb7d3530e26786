//! Complete vehicle configuration.

use crate::ambient::Ambient;
use crate::battery::BatteryPack;
use crate::body::Body;
use crate::drive::Drive;
use crate::error::ComponentResult;
use ev_core::numeric::ensure_non_negative;
use ev_core::units::Power;

/// Immutable description of one vehicle in its environment.
///
/// A simulator borrows the vehicle for the length of a run, so one vehicle can
/// back many concurrent runs.
#[derive(Clone, Debug, PartialEq)]
pub struct Vehicle {
    pub name: String,
    pub body: Body,
    pub battery: BatteryPack,
    /// Constant electrical load drawn from the bus (HVAC, electronics)
    pub accessory_power: Power,
    pub ambient: Ambient,
}

impl Vehicle {
    pub fn new(
        name: String,
        body: Body,
        battery: BatteryPack,
        accessory_power: Power,
        ambient: Ambient,
    ) -> ComponentResult<Self> {
        ensure_non_negative(accessory_power.value, "accessory power")?;
        Ok(Self {
            name,
            body,
            battery,
            accessory_power,
            ambient,
        })
    }

    pub fn accessory_power_w(&self) -> f64 {
        self.accessory_power.value
    }

    pub fn drive(&self, name: &str) -> Option<&Drive> {
        self.body.drives.iter().find(|d| d.name == name)
    }
}
