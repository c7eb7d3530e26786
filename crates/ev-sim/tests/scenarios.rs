//! Reference-vehicle scenarios with closed-form answers.

use ev_components::{
    Ambient, BatteryPack, Body, Drive, LimitKind, Motor, MotorRating, Tire, Vehicle,
};
use ev_core::numeric::{Tolerances, nearly_equal};
use ev_core::units::{amps, coulomb, kg, m, m2, nm, ohms, rad_per_s, volts, watts};
use ev_sim::{RegenPolicy, SimOptions, Simulator, labels};

struct Params {
    mass_kg: f64,
    cda_m2: f64,
    crr: f64,
    gear_ratio: f64,
    drive_efficiency: f64,
    motor: MotorRating,
    motor_max_speed: f64,
    motor_efficiency: f64,
    pack_voltage: f64,
    pack_resistance: f64,
    pack_max_current: f64,
    accessory_w: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            mass_kg: 1_500.0,
            cda_m2: 0.6,
            crr: 0.01,
            gear_ratio: 9.0,
            drive_efficiency: 0.95,
            motor: MotorRating::new(nm(300.0), watts(150_000.0)),
            motor_max_speed: 1_500.0,
            motor_efficiency: 0.9,
            pack_voltage: 350.0,
            pack_resistance: 0.1,
            pack_max_current: 600.0,
            accessory_w: 500.0,
        }
    }
}

fn build(params: Params) -> Vehicle {
    let motor = Motor::new(
        "rear motor".into(),
        params.motor,
        params.motor,
        rad_per_s(params.motor_max_speed),
        params.motor_efficiency,
    )
    .unwrap();
    let tire = Tire::new(1.0, params.crr, m(0.3)).unwrap();
    let rear = Drive::driven(
        "rear".into(),
        motor,
        tire,
        params.gear_ratio,
        params.drive_efficiency,
        1.0,
    )
    .unwrap();
    let body = Body::new(kg(params.mass_kg), m2(params.cda_m2), vec![rear]).unwrap();
    let pack = BatteryPack::new(
        volts(params.pack_voltage),
        ohms(params.pack_resistance),
        coulomb(1.0e7),
        amps(params.pack_max_current),
        1.0,
    )
    .unwrap();
    Vehicle::new(
        "reference".into(),
        body,
        pack,
        watts(params.accessory_w),
        Ambient::standard(),
    )
    .unwrap()
}

fn at_speed(speed_mps: f64) -> SimOptions {
    SimOptions {
        initial_speed_mps: speed_mps,
        ..SimOptions::default()
    }
}

fn assert_ledger_balances(sim: &Simulator<'_>) {
    let chemical = sim.battery_current_a() * sim.vehicle().battery.voltage_v();
    let total = sim.power_use().total();
    let tol = Tolerances {
        abs: 1e-6,
        rel: 1e-6,
    };
    assert!(
        nearly_equal(total, chemical, tol),
        "ledger {total} W vs chemical {chemical} W"
    );
}

#[test]
fn grip_limited_launch_reaches_one_g() {
    let car = build(Params {
        cda_m2: 0.0,
        crr: 0.0,
        gear_ratio: 1.0,
        motor: MotorRating::new(nm(10_000.0), watts(1.0e7)),
        motor_max_speed: 10_000.0,
        pack_voltage: 400.0,
        pack_resistance: 0.01,
        pack_max_current: 1.0e5,
        accessory_w: 0.0,
        ..Params::default()
    });
    let mut sim = Simulator::new(&car).unwrap();

    let out = sim.tick(20.0);
    assert!((out.accel - 9.81).abs() < 0.01, "accel = {}", out.accel);
    let limit = out.limit.unwrap();
    assert_eq!(limit.kind, LimitKind::TireGrip);
    assert_eq!(limit.component.as_deref(), Some("rear"));
}

#[test]
fn battery_power_ceiling_limits_acceleration() {
    let car = build(Params {
        mass_kg: 1_000.0,
        cda_m2: 0.0,
        crr: 0.0,
        gear_ratio: 5.0,
        drive_efficiency: 1.0,
        motor: MotorRating::new(nm(1_000.0), watts(500_000.0)),
        motor_max_speed: 2_000.0,
        motor_efficiency: 1.0,
        pack_voltage: 100.0,
        pack_resistance: 0.1,
        pack_max_current: 1_000.0,
        accessory_w: 0.0,
    });
    assert!((car.battery.max_power_w() - 25_000.0).abs() < 1e-9);

    let mut sim = Simulator::with_options(&car, at_speed(30.0)).unwrap();
    let out = sim.tick(5.0);

    // 25 kW at 30 m/s moves 1000 kg at no more than 0.833 m/s²
    assert!(out.accel < 5.0);
    assert!(out.accel <= 25_000.0 / 30.0 / 1_000.0);
    assert!(out.accel > 0.82, "accel = {}", out.accel);
    assert_eq!(out.limit.unwrap().kind, LimitKind::BatteryPower);
    assert!(sim.bus_voltage_v() < 100.0);
}

#[test]
fn steady_speed_power_matches_drag_power() {
    let car = build(Params::default());
    let mut sim = Simulator::with_options(&car, at_speed(20.0)).unwrap();

    let out = sim.tick(0.0);
    assert_eq!(out.accel, 0.0);
    assert!(out.limit.is_none());

    let rho = Ambient::standard().air_density_kg_m3();
    let aero = 0.5 * 0.6 * rho * 20.0 * 20.0;
    let rolling = 1_500.0 * 9.81 * 0.01;
    let expected = (aero + rolling) * 20.0 / (0.9 * 0.95) + 500.0;
    assert!(
        (sim.battery_power_w() - expected).abs() < 1e-6,
        "{} vs {expected}",
        sim.battery_power_w()
    );

    let ledger = sim.power_use();
    assert!((ledger.value(&[labels::AERODYNAMIC]).unwrap() - aero * 20.0).abs() < 1e-9);
    assert!((ledger.value(&[labels::ROLLING_RESISTANCE]).unwrap() - rolling * 20.0).abs() < 1e-9);
    assert_eq!(ledger.value(&[labels::ACCESSORY]), Some(500.0));
    assert_eq!(ledger.value(&[labels::ACCELERATION]), Some(0.0));
    assert!(ledger.value(&[labels::DRIVETRAIN, "rear", labels::GEAR_FRICTION]).unwrap() > 0.0);
    assert!(ledger.value(&[labels::DRIVETRAIN, "rear", labels::MOTOR_LOSS]).unwrap() > 0.0);
    assert!(ledger.value(&[labels::BATTERY, labels::INTERNAL_RESISTANCE]).unwrap() > 0.0);
    assert_ledger_balances(&sim);
}

#[test]
fn cruise_charge_accounting() {
    let car = build(Params::default());
    let mut sim = Simulator::with_options(&car, at_speed(20.0)).unwrap();

    sim.tick(0.0);
    let power = sim.battery_power_w();
    let current = car.battery.current_at_power(power).unwrap();
    let used_after_one = sim.coulombs_used();

    let n = 1_000;
    for _ in 1..n {
        let out = sim.tick(0.0);
        assert!(out.limit.is_none());
    }
    let expected = n as f64 * sim.interval_s() * current;
    assert!((used_after_one - current * 1e-3).abs() < 1e-12);
    assert!((sim.coulombs_used() - expected).abs() < 1e-9 * expected);
    assert_eq!(sim.speed_mps(), 20.0);
    assert!((sim.distance_m() - 20.0).abs() < 1e-9);
    assert!((sim.grid_energy_j() - expected * 350.0).abs() < 1e-6 * expected * 350.0);
}

#[test]
fn regenerative_braking_balances() {
    let car = build(Params::default());
    let opts = SimOptions {
        initial_state_of_charge: 0.5,
        ..at_speed(20.0)
    };
    let mut sim = Simulator::with_options(&car, opts).unwrap();
    let used_before = sim.coulombs_used();

    let out = sim.tick(-2.0);
    assert_eq!(out.accel, -2.0);
    assert!(out.limit.is_none());
    assert!(sim.battery_current_a() < 0.0);
    assert!(sim.battery_power_w() < 0.0);
    assert!(sim.bus_voltage_v() > 350.0);
    assert!(sim.coulombs_used() < used_before);
    assert_eq!(sim.power_use().value(&[labels::FRICTION_BRAKES]), Some(0.0));
    assert_ledger_balances(&sim);
}

#[test]
fn hard_braking_uses_friction_brakes() {
    let car = build(Params::default());
    let opts = SimOptions {
        initial_state_of_charge: 0.5,
        ..at_speed(20.0)
    };
    let mut sim = Simulator::with_options(&car, opts).unwrap();

    // Needs ~370 N·m of regen torque from a 300 N·m motor
    let out = sim.tick(-8.0);
    assert_eq!(out.accel, -8.0);
    assert!(out.limit.is_none());
    let brakes = sim.power_use().value(&[labels::FRICTION_BRAKES]).unwrap();
    assert!(brakes > 0.0);
    assert!(sim.battery_current_a() < 0.0);
    assert_ledger_balances(&sim);
}

#[test]
fn hard_braking_infeasible_without_friction_brakes() {
    let car = build(Params::default());
    let opts = SimOptions {
        initial_state_of_charge: 0.5,
        regen: RegenPolicy::Infeasible,
        ..at_speed(20.0)
    };
    let mut sim = Simulator::with_options(&car, opts).unwrap();

    let out = sim.tick(-8.0);
    assert!(out.accel > -8.0);
    assert!(out.accel < 0.0);
    let limit = out.limit.unwrap();
    assert!(limit.kind.is_motor(), "limit = {limit}");
    assert_eq!(limit.component.as_deref(), Some("rear: rear motor"));
    assert_ledger_balances(&sim);
}

#[test]
fn full_pack_sends_braking_to_friction_brakes() {
    let car = build(Params::default());
    let mut sim = Simulator::with_options(&car, at_speed(20.0)).unwrap();

    let out = sim.tick(-2.0);
    assert_eq!(out.accel, -2.0);
    assert!(out.limit.is_none());
    // A full pack takes no charge, only what covers the accessory load
    assert!(sim.coulombs_used() >= 0.0);
    assert!(sim.power_use().value(&[labels::FRICTION_BRAKES]).unwrap() > 0.0);
    assert_ledger_balances(&sim);
}

#[test]
fn motor_speed_limit_caps_top_speed() {
    let car = build(Params {
        motor_max_speed: 600.0,
        ..Params::default()
    });
    // 600 rad/s at 9:1 on a 0.3 m wheel is 20 m/s
    let mut sim = Simulator::with_options(&car, at_speed(19.999)).unwrap();
    let out = sim.tick(2.0);
    assert!(out.accel < 2.0);
    assert_eq!(out.limit.unwrap().kind, LimitKind::MotorSpeed);
    assert!(sim.speed_mps() <= 20.0 + 1e-9);
}

#[test]
fn holds_speed_at_motor_speed_cap() {
    let car = build(Params {
        motor_max_speed: 600.0,
        ..Params::default()
    });
    let mut sim = Simulator::with_options(&car, at_speed(20.0)).unwrap();
    for _ in 0..1_000 {
        let out = sim.tick(2.0);
        assert_eq!(out.accel, 0.0);
        assert_eq!(out.limit.unwrap().kind, LimitKind::MotorSpeed);
    }
    assert_eq!(sim.speed_mps(), 20.0);
    assert!(sim.battery_power_w() > 0.0);
    assert_ledger_balances(&sim);
}
