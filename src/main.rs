use anyhow::{bail, Result};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;

use bottleneck_control::{
    backend::MemorySimulator,
    config::{ControlConfig, Validate},
    simulation::{BottleneckController, LightState, StepTimings, VehicleId},
};

#[derive(Parser)]
#[command(name = "bottleneck-control")]
#[command(about = "Runs the toll plaza and ramp meter controllers over a synthetic corridor")]
struct Args {
    /// Controller configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of simulation steps to run
    #[arg(long, default_value_t = 3000)]
    steps: u64,

    /// Simulated seconds per step
    #[arg(long, default_value_t = 0.5)]
    step_length: f64,

    /// Length of every corridor edge
    #[arg(long, default_value_t = 100.0)]
    edge_length: f64,

    /// Free-flow speed in distance units per second
    #[arg(long, default_value_t = 10.0)]
    speed: f64,

    /// Probability that a vehicle enters the corridor on a given step
    #[arg(long, default_value_t = 0.3)]
    inflow: f64,

    /// Random seed for reproducible runs (overrides the config seed)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Enable verbose logging for detailed controller progress
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Info })
        .init();
    info!("Starting bottleneck controller (synthetic corridor)");

    if !(0.0..=1.0).contains(&args.inflow) {
        bail!("Inflow must be a probability in [0, 1], got {}", args.inflow);
    }
    if args.edge_length <= 0.0 || args.speed <= 0.0 {
        bail!("Edge length and speed must be positive");
    }

    let mut config = match &args.config {
        Some(path) => ControlConfig::load_from_file(path)?,
        None => ControlConfig::default(),
    };
    if args.seed.is_some() {
        config.random.seed = args.seed;
    }
    config.validate()?;
    if config.network.edges.is_empty() {
        bail!("The corridor needs at least one edge in network.edges");
    }

    let mut sim = MemorySimulator::new(args.step_length).with_signal(&config.toll.signal_id);
    let mut controller = BottleneckController::from_config(&config, &sim)?;
    let mut rng = match config.random.seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
        None => StdRng::from_entropy(),
    };

    let mut corridor = Corridor {
        edges: config.network.edges.iter().map(|e| e.0.clone()).collect(),
        entry_lanes: config.toll.lanes.max(1),
        max_lanes: config.network.max_lanes,
        toll_edge: config.toll.entry_edge.0.clone(),
        edge_length: args.edge_length,
        advance: args.speed * args.step_length,
        spawned: 0,
        exited: 0,
    };

    let mut timings = StepTimings::new(500);
    let mut signal_changes = 0;

    info!(
        "Running {} steps of {:.2}s over {} edges of length {:.0}",
        args.steps, args.step_length, corridor.edges.len(), args.edge_length
    );

    for _ in 0..args.steps {
        if rng.gen_bool(args.inflow) {
            corridor.spawn(&mut sim, &mut rng);
        }

        timings.start_step();
        let report = controller.step(&mut sim)?;
        timings.end_step();

        if let Some(toll) = &report.toll {
            if toll.signal_pushed {
                signal_changes += 1;
                log::debug!("Step {}: toll signal {}", report.step, toll.signal);
            }
        }

        let lights: Option<Vec<LightState>> = controller
            .toll()
            .map(|toll| toll.signal_state().lights().collect());
        corridor.advance(&mut sim, lights.as_deref());

        if report.step % 500 == 0 {
            info!(
                "Step {}: {} vehicles, {} locked at toll, {} locked at ramp, avg step {:.1}µs",
                report.step,
                report.vehicles_indexed,
                controller.toll().map_or(0, |t| t.suppression().len()),
                controller.ramp().map_or(0, |r| r.suppression().len()),
                timings.average_step_time().as_secs_f64() * 1e6
            );
        }
    }

    info!("Simulation completed!");
    info!("Vehicles: {} spawned, {} exited, {} still in corridor", corridor.spawned, corridor.exited, sim.vehicle_count());
    info!("Toll signal updates: {}", signal_changes);
    info!("Average controller step: {:.1}µs", timings.average_step_time().as_secs_f64() * 1e6);

    Ok(())
}

/// Straight chain of equal-length edges walked at constant speed.
struct Corridor {
    edges: Vec<String>,
    entry_lanes: usize,
    max_lanes: usize,
    toll_edge: String,
    edge_length: f64,
    advance: f64,
    spawned: u64,
    exited: u64,
}

impl Corridor {
    fn spawn(&mut self, sim: &mut MemorySimulator, rng: &mut StdRng) {
        let lane = rng.gen_range(0..self.entry_lanes.min(self.max_lanes));
        sim.spawn(&format!("veh{}", self.spawned), &self.edges[0], lane, 0.0);
        self.spawned += 1;
    }

    /// Moves every vehicle forward, holding those facing a red toll light at
    /// the end of the toll edge.
    fn advance(&mut self, sim: &mut MemorySimulator, toll_lights: Option<&[LightState]>) {
        let moves: Vec<(VehicleId, String, usize, f64)> = sim
            .vehicles()
            .map(|(id, v)| (id.clone(), v.edge.0.clone(), v.lane, v.position))
            .collect();

        for (id, edge, lane, position) in moves {
            let mut next = position + self.advance;

            let held = edge == self.toll_edge
                && toll_lights
                    .and_then(|lights| lights.get(lane))
                    .map_or(false, |light| *light == LightState::Closed);
            if held {
                next = next.min(self.edge_length);
            }

            if next <= self.edge_length {
                sim.place(&id, &edge, lane, next);
                continue;
            }

            let following = self
                .edges
                .iter()
                .position(|e| *e == edge)
                .and_then(|i| self.edges.get(i + 1));
            match following {
                Some(next_edge) => {
                    sim.place(&id, next_edge, lane, next - self.edge_length);
                }
                None => {
                    sim.remove_vehicle(&id);
                    self.exited += 1;
                }
            }
        }
    }
}
