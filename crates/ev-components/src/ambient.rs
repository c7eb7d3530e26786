//! Ambient air conditions.

use crate::common::air_density;
use crate::error::ComponentResult;
use ev_core::numeric::{ensure_non_negative, ensure_positive};
use ev_core::units::constants::{STD_PRESSURE_PA, STD_TEMPERATURE_K};
use ev_core::units::{Pressure, Temperature, k, pa};

/// Air the vehicle drives through.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ambient {
    pub temperature: Temperature,
    pub pressure: Pressure,
}

impl Ambient {
    pub fn new(temperature: Temperature, pressure: Pressure) -> ComponentResult<Self> {
        ensure_positive(temperature.value, "ambient temperature")?;
        ensure_non_negative(pressure.value, "ambient pressure")?;
        Ok(Self {
            temperature,
            pressure,
        })
    }

    /// 20 °C at sea-level pressure.
    pub fn standard() -> Self {
        Self {
            temperature: k(STD_TEMPERATURE_K),
            pressure: pa(STD_PRESSURE_PA),
        }
    }

    pub fn air_density_kg_m3(&self) -> f64 {
        air_density(self.temperature.value, self.pressure.value)
    }
}

impl Default for Ambient {
    fn default() -> Self {
        Self::standard()
    }
}
