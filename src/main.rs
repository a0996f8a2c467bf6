use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use elevator_sim::simulation::{
    Dispatcher, Fleet, FleetConfig, FloorRange, ScoringKind, DEFAULT_CAPACITY, DEFAULT_NUM_CARS,
};

/// Pickups issued when no `--random` count is given
const DEMO_PICKUPS: [(i32, i32); 4] = [(10, 12), (1, 7), (2, 5), (1, 9)];

/// Floors random pickups are drawn from when no range is configured
const DEFAULT_RANDOM_FLOORS: FloorRange = FloorRange {
    lowest: 1,
    highest: 15,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Policy {
    /// Closest car to the pickup floor
    Nearest,
    /// Closest car, penalising cars moving away from the pickup
    DirectionAware,
}

impl From<Policy> for ScoringKind {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::Nearest => ScoringKind::Nearest,
            Policy::DirectionAware => ScoringKind::DirectionAware,
        }
    }
}

#[derive(Parser)]
#[command(name = "elevator_sim")]
#[command(about = "Multi-car elevator dispatch simulation")]
struct Cli {
    /// Number of cars in the fleet
    #[arg(long, default_value_t = DEFAULT_NUM_CARS)]
    cars: usize,

    /// Maximum queued requests per car
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    capacity: usize,

    /// Simulated travel time per floor in milliseconds
    #[arg(long, default_value = "1000")]
    floor_delay_ms: u64,

    /// Lowest served floor (requires --highest-floor)
    #[arg(long, allow_negative_numbers = true, requires = "highest_floor")]
    lowest_floor: Option<i32>,

    /// Highest served floor (requires --lowest-floor)
    #[arg(long, allow_negative_numbers = true, requires = "lowest_floor")]
    highest_floor: Option<i32>,

    /// Car scoring policy
    #[arg(long, value_enum, default_value_t = Policy::Nearest)]
    policy: Policy,

    /// Issue this many random pickups instead of the scripted demo
    #[arg(long)]
    random: Option<usize>,

    /// Seed for random pickups, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Pause between pickups in milliseconds
    #[arg(long, default_value = "3000")]
    interval_ms: u64,

    /// Give up waiting for the fleet to drain after this many seconds
    #[arg(long, default_value = "120")]
    timeout_secs: u64,
}

impl Cli {
    fn floor_range(&self) -> Option<FloorRange> {
        match (self.lowest_floor, self.highest_floor) {
            (Some(lowest), Some(highest)) => Some(FloorRange::new(lowest, highest)),
            _ => None,
        }
    }

    fn fleet_config(&self) -> FleetConfig {
        FleetConfig {
            num_cars: self.cars,
            capacity: self.capacity,
            floor_delay: Duration::from_millis(self.floor_delay_ms),
            floor_range: self.floor_range(),
            start_floors: Vec::new(),
            scoring: self.policy.into(),
        }
    }

    fn pickups(&self) -> Result<Vec<(i32, i32)>> {
        let Some(count) = self.random else {
            return Ok(DEMO_PICKUPS.to_vec());
        };

        let range = self.floor_range().unwrap_or(DEFAULT_RANDOM_FLOORS);
        if range.lowest > range.highest {
            anyhow::bail!("cannot draw random pickups from empty floor range {}", range);
        }
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok((0..count)
            .map(|_| {
                (
                    rng.random_range(range.lowest..=range.highest),
                    rng.random_range(range.lowest..=range.highest),
                )
            })
            .collect())
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,elevator_sim=info"),
    )
    .init();

    let cli = Cli::parse();
    run_headless(&cli)
}

/// Drive the fleet from the console: issue pickups, print moves, report a summary
fn run_headless(cli: &Cli) -> Result<()> {
    let config = cli.fleet_config();
    config
        .validate()
        .context("Invalid fleet configuration")?;
    let pickups = cli.pickups()?;

    println!("Running elevator simulation in headless mode...");
    println!(
        "Cars: {}, Capacity: {}, Delay: {}ms per floor, Pickups: {}",
        config.num_cars,
        config.capacity,
        cli.floor_delay_ms,
        pickups.len()
    );
    println!();

    let (observer_tx, observer_rx) = crossbeam_channel::unbounded();
    let mut fleet = Fleet::from_config(&config, Some(observer_tx))?;

    let printer = thread::Builder::new()
        .name("observer".to_string())
        .spawn(move || {
            for observation in observer_rx.iter() {
                println!(
                    "Car {} at floor {} ({})",
                    observation.car_id, observation.floor, observation.direction
                );
            }
        })
        .context("Failed to spawn observer thread")?;

    fleet.start()?;
    let dispatcher = fleet.dispatcher();

    let mut accepted = 0usize;
    let mut rejected = 0usize;
    for (index, (source, destination)) in pickups.iter().copied().enumerate() {
        if index > 0 {
            thread::sleep(Duration::from_millis(cli.interval_ms));
        }
        match dispatcher.request_pickup(source, destination) {
            Ok(car_id) => {
                accepted += 1;
                println!("Pickup {} -> {} assigned to car {}", source, destination, car_id);
            }
            Err(err) => {
                rejected += 1;
                warn!("Pickup {} -> {} rejected: {}", source, destination, err);
            }
        }
    }

    let drained = fleet.wait_idle(Duration::from_secs(cli.timeout_secs));
    if !drained {
        warn!(
            "Fleet did not drain within {}s, shutting down anyway",
            cli.timeout_secs
        );
    }

    println!();
    println!("=== Final State ===");
    print_summary(&dispatcher);
    log_statistics(&dispatcher, pickups.len(), accepted, rejected);

    drop(dispatcher);
    fleet.shutdown();
    drop(fleet);

    if printer.join().is_err() {
        warn!("Observer thread panicked");
    }
    Ok(())
}

/// Print a per-car table of the fleet state
fn print_summary(dispatcher: &Dispatcher) {
    println!("=== Elevator Fleet Summary ===");
    if let Some(range) = dispatcher.floor_range() {
        println!("Floors: {}", range);
    }
    for status in dispatcher.fleet_status() {
        println!(
            "  Car {}: floor={}, direction={}, pending={}/{}, completed={}, floors_travelled={}",
            status.id,
            status.floor,
            status.direction,
            status.pending,
            status.capacity,
            status.completed,
            status.floors_travelled
        );
    }
}

fn log_statistics(dispatcher: &Dispatcher, requested: usize, accepted: usize, rejected: usize) {
    let statuses = dispatcher.fleet_status();
    let completed: u64 = statuses.iter().map(|s| s.completed).sum();
    let travelled: u64 = statuses.iter().map(|s| s.floors_travelled).sum();

    info!("=== SIMULATION COMPLETE ===");
    info!("Pickups requested: {}", requested);
    info!("Pickups accepted: {}", accepted);
    info!("Pickups rejected: {}", rejected);
    info!("Requests completed: {}", completed);
    info!("Floors travelled: {}", travelled);
}
