//! Common utilities for component calculations.

use ev_core::units::constants::{GAS_CONSTANT, MOLAR_MASS_AIR};

/// Shaft speeds below this are treated as stalled (rad/s).
pub const EPSILON_SHAFT_SPEED: f64 = 1e-9;

/// Energy transfer through a lossy stage, by direction of flow.
///
/// Positive `amount` flows toward the wheels, so the upstream side must supply
/// more than is delivered. Negative `amount` flows back from the wheels and the
/// upstream side receives less than was put in.
pub fn transfer(amount: f64, efficiency: f64) -> f64 {
    if amount > 0.0 {
        amount / efficiency
    } else {
        amount * efficiency
    }
}

/// Ideal-gas density of dry air (kg/m³) from temperature (K) and pressure (Pa).
pub fn air_density(temperature_k: f64, pressure_pa: f64) -> f64 {
    (pressure_pa * MOLAR_MASS_AIR) / (temperature_k * GAS_CONSTANT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_direction() {
        assert_eq!(transfer(90.0, 0.9), 100.0);
        assert_eq!(transfer(-100.0, 0.9), -90.0);
        assert_eq!(transfer(0.0, 0.9), 0.0);
    }

    #[test]
    fn test_air_density_sea_level() {
        let rho = air_density(288.15, 101_325.0);
        assert!((rho - 1.225).abs() < 1e-3);
    }
}
