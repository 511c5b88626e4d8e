use std::{error::Error, fs, path::PathBuf, time::Duration};

use clap::Parser;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

use routing_sim::{
    config::{SimulationConfig, parse_delay},
    network::generator::seeded_topology,
    playback::{EventPlayer, ListenerError, PlaybackListener, play_to_end},
    protocol::{Algorithm, ProtocolEvent, render_table, spawn_simulation},
};

#[derive(Parser, Debug)]
#[command(name = "routing-sim")]
#[command(version, about = "Distance-vector and link-state routing simulator", long_about = None)]
struct Args {
    /// Scenario file (JSON). Without one the built-in A-D network is used.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Protocol to run: dv or ls (overrides config)
    #[arg(short, long)]
    algorithm: Option<Algorithm>,

    /// Distance-vector round limit (overrides config)
    #[arg(short = 'i', long)]
    max_iterations: Option<u32>,

    /// Pause between replayed events, e.g. "250ms" (overrides config)
    #[arg(short, long, value_parser = parse_delay)]
    delay: Option<Duration>,

    /// Generate a random connected network with this many routers instead
    #[arg(long)]
    random: Option<usize>,

    /// Seed for --random. When omitted, a random seed is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Probability of a link between two routers beyond the spanning tree
    #[arg(long, default_value = "0.3")]
    link_probability: f64,

    /// Highest link cost of a generated network
    #[arg(long, default_value = "10")]
    max_cost: u32,

    /// Only print the table of this router
    #[arg(short, long)]
    node: Option<String>,

    /// Replay the event trace on stdout at the configured pace
    #[arg(short, long)]
    replay: bool,

    /// Write the full report (tables, events, logs) as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Args {
    fn apply(&self, config: &mut SimulationConfig) {
        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations;
        }
        if let Some(delay) = self.delay {
            config.delay = delay;
        }
    }
}

/// Prints each replayed event the way the trace view shows it.
struct ConsoleListener;

impl PlaybackListener for ConsoleListener {
    fn on_event(&mut self, event: &ProtocolEvent, index: usize, total: usize) -> Result<(), ListenerError> {
        println!("[{:>4}/{}] {}", index + 1, total, event);
        Ok(())
    }

    fn on_finished(&mut self) {
        println!("Playback finished.");
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,routing_sim=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    args.apply(&mut config);

    let topology = match args.random {
        Some(nodes) => {
            let seed = args.seed.unwrap_or_else(rand::random);
            info!(seed, nodes, "generating random topology");
            seeded_topology(seed, nodes, args.link_probability, args.max_cost)?
        }
        None => config.build_topology()?,
    };
    info!(%topology, algorithm = %config.algorithm, "starting simulation");

    let rt = Runtime::new()?;
    let (algorithm, max_iterations) = (config.algorithm, config.max_iterations);
    let report = rt.block_on(async move {
        spawn_simulation(topology, algorithm, max_iterations).await
    })?;

    match &args.node {
        Some(node) => match report.routing_table(node) {
            Some(table) => print!("{}", render_table(&node.as_str().into(), table)),
            None => return Err(format!("Unknown router: {node}").into()),
        },
        None => print!("{}", report.render_tables()),
    }

    match report.converged_iteration {
        Some(iteration) if report.algorithm == Algorithm::DistanceVector => {
            println!("\nConverged after {iteration} iterations.")
        }
        Some(_) => println!("\nLink state tables computed."),
        None => println!("\nNo convergence within {max_iterations} iterations."),
    }

    if args.replay {
        let player = EventPlayer::new(report.events.clone(), ConsoleListener).with_delay(config.delay);
        rt.block_on(play_to_end(player));
    }

    if let Some(path) = &args.report {
        fs::write(path, serde_json::to_string_pretty(&report)?)?;
        info!(path = %path.display(), "report written");
    }

    Ok(())
}
