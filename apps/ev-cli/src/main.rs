use clap::{Parser, Subcommand};
use ev_app::{AccelOptions, AppResult, LoadedVehicle};
use ev_sim::{RegenPolicy, SimOptions};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "ev-cli")]
#[command(about = "evflow CLI - Electric vehicle performance and energy simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a vehicle file and check that it compiles
    Validate {
        /// Path to the vehicle YAML or JSON file
        vehicle_path: PathBuf,
    },
    /// Standing-start acceleration run
    Accel {
        /// Path to the vehicle YAML or JSON file
        vehicle_path: PathBuf,
        #[command(flatten)]
        sim: SimArgs,
    },
    /// Play back speed schedules from the vehicle file
    Schedule {
        /// Path to the vehicle YAML or JSON file
        vehicle_path: PathBuf,
        /// Schedule to run (defaults to all)
        #[arg(short, long)]
        name: Option<String>,
        #[command(flatten)]
        sim: SimArgs,
    },
    /// Power breakdown while holding each speed
    Power {
        /// Path to the vehicle YAML or JSON file
        vehicle_path: PathBuf,
        /// Speeds in m/s, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        speeds: Vec<f64>,
        #[command(flatten)]
        sim: SimArgs,
    },
    /// Energy per distance at constant speed
    Efficiency {
        /// Path to the vehicle YAML or JSON file
        vehicle_path: PathBuf,
        /// Lowest speed in m/s
        #[arg(long, default_value_t = 5.0)]
        from: f64,
        /// Highest speed in m/s
        #[arg(long, default_value_t = 40.0)]
        to: f64,
        /// Speed step in m/s
        #[arg(long, default_value_t = 5.0)]
        step: f64,
        #[command(flatten)]
        sim: SimArgs,
    },
}

#[derive(clap::Args)]
struct SimArgs {
    /// Time step in seconds
    #[arg(long, default_value_t = 1e-3)]
    dt: f64,
    /// Starting state of charge, 0 to 1
    #[arg(long, default_value_t = 1.0)]
    soc: f64,
    /// Treat braking beyond regeneration as infeasible instead of using friction brakes
    #[arg(long)]
    no_friction_brakes: bool,
}

impl SimArgs {
    fn options(&self) -> SimOptions {
        SimOptions {
            interval_s: self.dt,
            initial_state_of_charge: self.soc,
            regen: if self.no_friction_brakes {
                RegenPolicy::Infeasible
            } else {
                RegenPolicy::FrictionBrakes
            },
            ..SimOptions::default()
        }
    }
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { vehicle_path } => cmd_validate(&vehicle_path),
        Commands::Accel { vehicle_path, sim } => cmd_accel(&vehicle_path, &sim),
        Commands::Schedule {
            vehicle_path,
            name,
            sim,
        } => cmd_schedule(&vehicle_path, name.as_deref(), &sim),
        Commands::Power {
            vehicle_path,
            speeds,
            sim,
        } => cmd_power(&vehicle_path, &speeds, &sim),
        Commands::Efficiency {
            vehicle_path,
            from,
            to,
            step,
            sim,
        } => cmd_efficiency(&vehicle_path, from, to, step, &sim),
    }
}

fn load(vehicle_path: &Path) -> AppResult<LoadedVehicle> {
    info!(path = %vehicle_path.display(), "loading vehicle");
    ev_app::load_vehicle(vehicle_path)
}

fn cmd_validate(vehicle_path: &Path) -> AppResult<()> {
    println!("Validating vehicle: {}", vehicle_path.display());
    let file = ev_app::load_project(vehicle_path)?;
    ev_app::validate_project(&file)?;
    println!("✓ Vehicle is valid");

    let schedules = ev_app::list_schedules(&file);
    if !schedules.is_empty() {
        println!("Schedules:");
        for s in schedules {
            println!(
                "  {} - {} segments, {:.1} s, up to {:.1} m/s",
                s.name, s.segment_count, s.duration_s, s.top_speed_mps
            );
        }
    }
    Ok(())
}

fn cmd_accel(vehicle_path: &Path, sim: &SimArgs) -> AppResult<()> {
    let loaded = load(vehicle_path)?;
    println!("Acceleration run: {}", loaded.vehicle.name);

    let options = AccelOptions {
        sim: sim.options(),
        ..AccelOptions::default()
    };
    let profile = ev_app::run_acceleration_profile(&loaded.vehicle, &options)?;

    match profile.time_to_100_kph_s {
        Some(t) => println!("  0-100 km/h:   {t:.2} s"),
        None => println!("  0-100 km/h:   not reached"),
    }
    println!("  Quarter mile: {:.2} s", profile.quarter_mile_s);
    println!(
        "  Top speed:    {:.1} m/s ({:.1} km/h) at {:.1} s",
        profile.top_speed_mps,
        profile.top_speed_mps * 3.6,
        profile.time_to_top_speed_s
    );
    println!("  Peak accel:   {:.2} m/s²", profile.peak_accel_mps2);
    println!("  Limited by:");
    for span in &profile.limits {
        let reason = span
            .reason
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "nothing".to_string());
        println!(
            "    {:>8.2} s +{:>7.2} s  {}",
            span.start_s, span.duration_s, reason
        );
    }
    Ok(())
}

fn cmd_schedule(vehicle_path: &Path, name: Option<&str>, sim: &SimArgs) -> AppResult<()> {
    let loaded = load(vehicle_path)?;
    let schedules = match name {
        Some(name) => vec![ev_app::get_schedule(&loaded.file, name)?],
        None => loaded.file.schedules.iter().collect(),
    };
    if schedules.is_empty() {
        println!("No schedules found in vehicle file");
        return Ok(());
    }

    let options = sim.options();
    for schedule in schedules {
        let result = ev_app::run_schedule(&loaded.vehicle, schedule, &options)?;
        println!("✓ Schedule {}", result.name);
        println!("  Distance:    {:.1} m", result.distance_m);
        println!("  Energy:      {:.1} Wh", result.energy_j / 3_600.0);
        println!("  Grid energy: {:.1} Wh", result.grid_energy_j / 3_600.0);
        println!("  Consumption: {:.1} Wh/km", result.wh_per_km());
        println!("  Final SoC:   {:.2} %", result.final_state_of_charge * 100.0);
        println!("  Mean power per segment:");
        for (i, (power, speed)) in result
            .segment_power_w
            .iter()
            .zip(&schedule.speeds_mps)
            .enumerate()
        {
            println!("    {i:>3}  {speed:>6.1} m/s  {:>10.1} W", power);
        }
    }
    Ok(())
}

fn cmd_power(vehicle_path: &Path, speeds: &[f64], sim: &SimArgs) -> AppResult<()> {
    let loaded = load(vehicle_path)?;
    let points = ev_app::power_at_speeds(&loaded.vehicle, speeds, &sim.options())?;

    for point in points {
        println!(
            "At {:.1} m/s: {:.1} W total",
            point.speed_mps,
            point.power.total()
        );
        for (label, node) in point.power.sections() {
            println!("  {label:<40} {:>12.1} W", node.total());
            for (path, value) in node.leaves() {
                if !path.is_empty() {
                    println!("    {path:<38} {value:>12.1} W");
                }
            }
        }
    }
    Ok(())
}

fn cmd_efficiency(
    vehicle_path: &Path,
    from: f64,
    to: f64,
    step: f64,
    sim: &SimArgs,
) -> AppResult<()> {
    if !(step > 0.0) || to < from {
        return Err(ev_app::AppError::InvalidInput(format!(
            "speed range {from}..{to} step {step} is empty"
        )));
    }
    let count = ((to - from) / step).floor() as usize + 1;
    let speeds: Vec<f64> = (0..count).map(|i| from + step * i as f64).collect();

    let loaded = load(vehicle_path)?;
    let points = ev_app::efficiency_curve(&loaded.vehicle, &speeds, &sim.options())?;

    println!("{:>10} {:>12} {:>10}", "speed m/s", "power W", "Wh/km");
    for p in points {
        println!("{:>10.1} {:>12.1} {:>10.1}", p.speed_mps, p.power_w, p.wh_per_km);
    }
    Ok(())
}
