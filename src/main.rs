use anyhow::Result;
use clap::{Parser, ValueEnum};

use signal_sim::simulation::{ControlMode, FixedBaseline, SimConfig, SimWorld};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Fixed-timer signal cycle
    Fixed,
    /// Adaptive pressure-based controller
    Adaptive,
    /// Run fixed first, then adaptive, and report the improvement
    Compare,
}

#[derive(Parser)]
#[command(name = "signal_sim")]
#[command(about = "Traffic signal simulation comparing fixed and adaptive control")]
struct Cli {
    /// Which control strategy to run
    #[arg(long, value_enum, default_value_t = Mode::Compare)]
    mode: Mode,

    /// Number of simulation ticks per run
    #[arg(long, default_value = "18000")]
    ticks: u32,

    /// Real-time delta per tick in seconds
    #[arg(long, default_value = "0.016")]
    delta: f32,

    /// Simulation speed multiplier
    #[arg(long, default_value = "1.0")]
    speed: f32,

    /// RNG seed for reproducible arrival sequences
    #[arg(long)]
    seed: Option<u64>,

    /// Seconds of simulated time between progress summaries
    #[arg(long, default_value = "30.0")]
    summary_interval: f32,
}

/// Outcome of a single headless run.
struct RunResult {
    snapshot: FixedBaseline,
    improvement: Option<f32>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.mode {
        Mode::Fixed => {
            run_mode(ControlMode::Fixed, &cli)?;
        }
        Mode::Adaptive => {
            let result = run_mode(ControlMode::Adaptive, &cli)?;
            report_improvement(&result);
        }
        Mode::Compare => {
            println!("=== Fixed-timer run ===");
            run_mode(ControlMode::Fixed, &cli)?;
            println!();
            println!("=== Adaptive run ===");
            let result = run_mode(ControlMode::Adaptive, &cli)?;
            report_improvement(&result);
        }
    }

    Ok(())
}

fn run_mode(mode: ControlMode, cli: &Cli) -> Result<RunResult> {
    let config = SimConfig::default();
    let mut world = match cli.seed {
        Some(seed) => SimWorld::new_with_seed(mode, config, seed)?,
        None => SimWorld::new(mode, config)?,
    };
    world.set_speed_multiplier(cli.speed);

    let summary_every = ((cli.summary_interval / (cli.delta * cli.speed)).ceil() as u32).max(1);

    for tick in 1..=cli.ticks {
        world.tick(cli.delta);
        if tick % summary_every == 0 {
            println!("{}", world.summary());
        }
    }

    // Read the improvement before ending the run, which may overwrite the
    // baseline when the mode is fixed.
    let improvement = world.improvement_vs_baseline();
    let snapshot = world.end_run()?;

    println!("--- Run complete ---");
    println!(
        "simulated {:.1}s | {} cars exited | avg wait {:.1}s | throughput {}/min",
        snapshot.simulation_time, snapshot.total_cars, snapshot.avg_wait_time, snapshot.throughput
    );

    Ok(RunResult {
        snapshot,
        improvement,
    })
}

fn report_improvement(result: &RunResult) {
    match result.improvement {
        Some(improvement) => println!(
            "Adaptive vs fixed baseline: {:+.1}% average wait ({:.1}s adaptive)",
            improvement, result.snapshot.avg_wait_time
        ),
        None => println!("No fixed baseline available for comparison"),
    }
}
