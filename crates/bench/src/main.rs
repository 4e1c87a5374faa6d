//! Demo harness: tune a simulated GEMM kernel with any search strategy.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use gridtune_search::Strategy;
use gridtune_tuner::{SimulatedRunner, TuningSession};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gridtune", about = "GridTune demo: search a simulated kernel space")]
struct Cli {
    #[arg(long, value_enum, default_value = "full")]
    strategy: StrategyArg,

    /// Fraction of the space to visit (sampling strategies).
    #[arg(long, default_value_t = 0.5)]
    fraction: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Initial temperature for annealing.
    #[arg(long, default_value_t = 4.0)]
    max_temperature: f64,

    /// Number of particles for PSO.
    #[arg(long, default_value_t = 5)]
    swarms: usize,

    #[arg(long, default_value_t = 0.5)]
    inertia: f64,

    #[arg(long, default_value_t = 1.5)]
    cognitive: f64,

    #[arg(long, default_value_t = 1.5)]
    social: f64,

    /// Simulated work-group thread limit.
    #[arg(long, default_value_t = 1024)]
    max_local_threads: usize,

    /// Write the full report as JSON.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Debug)]
enum StrategyArg {
    Full,
    Random,
    Annealing,
    Pso,
}

fn strategy_from_args(cli: &Cli) -> Strategy {
    match cli.strategy {
        StrategyArg::Full => Strategy::Full,
        StrategyArg::Random => Strategy::Random {
            fraction: cli.fraction,
            seed: cli.seed,
        },
        StrategyArg::Annealing => Strategy::Annealing {
            fraction: cli.fraction,
            max_temperature: cli.max_temperature,
            seed: cli.seed,
        },
        StrategyArg::Pso => Strategy::Pso {
            fraction: cli.fraction,
            swarms: cli.swarms,
            w: cli.inertia,
            c1: cli.cognitive,
            c2: cli.social,
            seed: cli.seed,
        },
    }
}

fn gemm_session() -> Result<TuningSession> {
    let mut session = TuningSession::new();
    session.add_parameter("TS", vec![8, 16, 32, 64, 128])?;
    session.add_parameter("WPT", vec![1, 2, 4, 8])?;
    session.add_parameter("VW", vec![1, 2, 4, 8])?;
    session.add_constraint(&["TS", "WPT"], |v| v[0] % v[1] == 0)?;
    session.add_constraint(&["TS", "VW"], |v| v[0] >= v[1])?;
    session.set_global_size(&[4096, 4096]);
    session.set_local_size(&[1, 1]);
    session.mul_local_size(0, "TS")?;
    session.div_global_size(0, "WPT")?;
    Ok(session)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let strategy = strategy_from_args(&cli);

    let session = gemm_session()?;
    let mut runner = SimulatedRunner::new(vec![
        ("TS".into(), 32.0),
        ("WPT".into(), 2.0),
        ("VW".into(), 4.0),
    ])
    .with_max_local_threads(cli.max_local_threads);

    let report = session.tune(&strategy, &mut runner)?;

    println!(
        "evaluated {} of {} configurations ({} infeasible)",
        report.evaluations,
        report.space_size,
        report.infeasible_count()
    );
    match report.best() {
        Some(best) => {
            let params: Vec<String> = best
                .parameters
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            println!(
                "best: [{}] at {:.6} s",
                params.join(", "),
                best.cost.energy()
            );
        }
        None => println!("no feasible configuration found"),
    }

    if let Some(path) = &cli.output {
        report.save(path)?;
        println!("report written to {}", path.display());
    }
    Ok(())
}
