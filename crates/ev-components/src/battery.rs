//! Battery pack model with internal-resistance voltage sag.

use crate::error::{ComponentError, ComponentResult};
use crate::limit::{LimitKind, LimitReason};
use crate::traits::Constrained;
use ev_core::numeric::{ensure_finite, ensure_fraction, ensure_non_negative, ensure_positive};
use ev_core::units::{Charge, Current, Resistance, Voltage};

/// Electrical characteristics of a single cell.
#[derive(Clone, Debug, PartialEq)]
pub struct BatteryCell {
    pub nominal_voltage: Voltage,
    pub internal_resistance: Resistance,
    pub capacity: Charge,
    pub max_current: Current,
}

impl BatteryCell {
    pub fn new(
        nominal_voltage: Voltage,
        internal_resistance: Resistance,
        capacity: Charge,
        max_current: Current,
    ) -> ComponentResult<Self> {
        validate_electrical(
            nominal_voltage.value,
            internal_resistance.value,
            capacity.value,
            max_current.value,
        )?;
        Ok(Self {
            nominal_voltage,
            internal_resistance,
            capacity,
            max_current,
        })
    }
}

fn validate_electrical(
    voltage_v: f64,
    resistance_ohm: f64,
    capacity_c: f64,
    max_current_a: f64,
) -> ComponentResult<()> {
    ensure_positive(voltage_v, "battery nominal voltage")?;
    ensure_non_negative(resistance_ohm, "battery internal resistance")?;
    ensure_positive(capacity_c, "battery capacity")?;
    ensure_positive(max_current_a, "battery max current")?;
    Ok(())
}

/// Battery pack modeled as an ideal source `V0` in series with resistance `R`.
///
/// ## Model
///
/// For a terminal power `P` the pack current solves `P = I·(V0 − I·R)`. The
/// physically valid root keeps the terminal voltage near `V0`:
///
/// ```text
/// I = 2P / (V0 + sqrt(V0² − 4·P·R))
/// ```
///
/// with `P` signed, so the current carries the sign of the power and a charging
/// current raises the terminal voltage above `V0`. No real root exists when
/// `4·P·R > V0²`; the pack cannot deliver that power at any current and the
/// request is infeasible. The largest deliverable power is `V0² / (4R)`.
/// Charging always has a root and is bounded by the current limit instead.
///
/// ## Sign Conventions
///
/// - Positive power / current: discharge
/// - Negative power / current: regenerative charge
#[derive(Clone, Debug, PartialEq)]
pub struct BatteryPack {
    pub nominal_voltage: Voltage,
    pub internal_resistance: Resistance,
    pub capacity: Charge,
    pub max_current: Current,
    /// Wall-to-pack efficiency of the charger (0 < eta <= 1)
    pub charger_efficiency: f64,
}

impl BatteryPack {
    pub fn new(
        nominal_voltage: Voltage,
        internal_resistance: Resistance,
        capacity: Charge,
        max_current: Current,
        charger_efficiency: f64,
    ) -> ComponentResult<Self> {
        validate_electrical(
            nominal_voltage.value,
            internal_resistance.value,
            capacity.value,
            max_current.value,
        )?;
        ensure_fraction(charger_efficiency, "charger efficiency")?;
        Ok(Self {
            nominal_voltage,
            internal_resistance,
            capacity,
            max_current,
            charger_efficiency,
        })
    }

    /// Build a pack from `series` × `parallel` identical cells.
    pub fn from_cells(
        cell: &BatteryCell,
        series: u32,
        parallel: u32,
        charger_efficiency: f64,
    ) -> ComponentResult<Self> {
        if series == 0 || parallel == 0 {
            return Err(ComponentError::InvalidArg {
                what: "battery series and parallel counts must be positive",
            });
        }
        let s = f64::from(series);
        let p = f64::from(parallel);
        Self::new(
            cell.nominal_voltage * s,
            cell.internal_resistance * (s / p),
            cell.capacity * p,
            cell.max_current * p,
            charger_efficiency,
        )
    }

    pub fn voltage_v(&self) -> f64 {
        self.nominal_voltage.value
    }

    pub fn resistance_ohm(&self) -> f64 {
        self.internal_resistance.value
    }

    pub fn capacity_c(&self) -> f64 {
        self.capacity.value
    }

    /// Stored energy at nominal voltage (J).
    pub fn energy_capacity_j(&self) -> f64 {
        self.capacity.value * self.nominal_voltage.value
    }

    /// Largest terminal power the pack can deliver (W), `V0² / 4R`.
    pub fn max_power_w(&self) -> f64 {
        let v0 = self.voltage_v();
        let r = self.resistance_ohm();
        if r == 0.0 {
            f64::INFINITY
        } else {
            v0 * v0 / (4.0 * r)
        }
    }

    /// Pack current for a terminal power, or `None` when the power exceeds what
    /// the pack can deliver.
    pub fn current_at_power(&self, power_w: f64) -> Option<f64> {
        let v0 = self.voltage_v();
        let r = self.resistance_ohm();
        let discriminant = v0 * v0 - 4.0 * power_w * r;
        if !(discriminant >= 0.0) {
            return None;
        }
        Some(2.0 * power_w / (v0 + discriminant.sqrt()))
    }

    /// Terminal voltage while carrying a current (V).
    pub fn terminal_voltage(&self, current_a: f64) -> f64 {
        self.voltage_v() - current_a * self.resistance_ohm()
    }
}

/// Request made of the pack for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatteryDemand {
    /// Terminal power (W), positive when discharging
    pub power_w: f64,
    /// Tick duration (s)
    pub dt_s: f64,
}

/// Electrical operating point of the pack for an accepted demand.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BatteryResponse {
    pub current_a: f64,
    /// Terminal (bus) voltage after sag
    pub bus_voltage_v: f64,
    /// Terminal power actually exchanged (W)
    pub terminal_power_w: f64,
    /// `I²R` dissipated inside the pack (W)
    pub internal_loss_w: f64,
    /// Power at the ideal source, `I·V0` (W)
    pub chemical_power_w: f64,
}

/// Per-run battery state: coulomb counter and grid energy.
#[derive(Clone, Debug)]
pub struct BatteryState<'a> {
    pack: &'a BatteryPack,
    /// Net charge drawn since full (C); regeneration lowers it
    coulombs_used: f64,
    /// Total charge moved in either direction (C)
    throughput_c: f64,
    /// Energy that must come from the grid to replace what was drawn (J)
    grid_energy_j: f64,
}

impl<'a> BatteryState<'a> {
    /// Fresh state at full charge.
    pub fn new(pack: &'a BatteryPack) -> Self {
        Self {
            pack,
            coulombs_used: 0.0,
            throughput_c: 0.0,
            grid_energy_j: 0.0,
        }
    }

    /// State starting at a given state of charge in [0, 1].
    pub fn with_state_of_charge(pack: &'a BatteryPack, soc: f64) -> ComponentResult<Self> {
        ensure_finite(soc, "initial state of charge")?;
        if !(0.0..=1.0).contains(&soc) {
            return Err(ComponentError::OutOfRange {
                what: "initial state of charge",
                value: soc,
            });
        }
        let mut state = Self::new(pack);
        state.coulombs_used = (1.0 - soc) * pack.capacity_c();
        Ok(state)
    }

    pub fn pack(&self) -> &'a BatteryPack {
        self.pack
    }

    pub fn coulombs_used(&self) -> f64 {
        self.coulombs_used
    }

    pub fn throughput_c(&self) -> f64 {
        self.throughput_c
    }

    pub fn grid_energy_j(&self) -> f64 {
        self.grid_energy_j
    }

    pub fn state_of_charge(&self) -> f64 {
        1.0 - self.coulombs_used / self.pack.capacity_c()
    }

    pub fn is_depleted(&self) -> bool {
        self.coulombs_used >= self.pack.capacity_c()
    }
}

impl Constrained for BatteryState<'_> {
    type Demand = BatteryDemand;
    type Response = BatteryResponse;

    fn name(&self) -> &str {
        "battery"
    }

    fn check(&self, demand: &BatteryDemand) -> Result<BatteryResponse, LimitReason> {
        let pack = self.pack;
        let current = pack
            .current_at_power(demand.power_w)
            .ok_or_else(|| LimitReason::new(LimitKind::BatteryPower))?;

        if current.abs() > pack.max_current.value {
            return Err(LimitReason::new(LimitKind::BatteryCurrent));
        }

        let projected = self.coulombs_used + current * demand.dt_s;
        if projected > pack.capacity_c() {
            return Err(LimitReason::new(LimitKind::BatteryCharge));
        }
        if current < 0.0 && projected < 0.0 {
            return Err(LimitReason::new(LimitKind::BatteryFull));
        }

        let r = pack.resistance_ohm();
        Ok(BatteryResponse {
            current_a: current,
            bus_voltage_v: pack.terminal_voltage(current),
            terminal_power_w: demand.power_w,
            internal_loss_w: current * current * r,
            chemical_power_w: current * pack.voltage_v(),
        })
    }

    fn commit(&mut self, demand: &BatteryDemand) -> Result<BatteryResponse, LimitReason> {
        let response = self.check(demand)?;
        let charge = response.current_a * demand.dt_s;
        self.coulombs_used += charge;
        self.throughput_c += charge.abs();
        self.grid_energy_j +=
            response.chemical_power_w * demand.dt_s / self.pack.charger_efficiency;
        Ok(response)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use ev_core::units::{amps, coulomb, ohms, volts};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn current_sign_follows_power(v0 in 50.0_f64..800.0, r in 0.0_f64..1.0, frac in -0.99_f64..0.99) {
            let pack = BatteryPack::new(volts(v0), ohms(r), coulomb(1e5), amps(1e4), 1.0).unwrap();
            let p_max = if r == 0.0 { 1e6 } else { pack.max_power_w() };
            let p = frac * p_max;
            let i = pack.current_at_power(p).unwrap();
            prop_assert!(i * p >= 0.0);
            let delivered = i * pack.terminal_voltage(i);
            prop_assert!((delivered - p).abs() <= 1e-6 * p_max.max(1.0));
        }
    }
}
