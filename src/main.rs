use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use habitat::config::{self, SimConfig};
use habitat::{MetricsCollector, RunLimit, SimError, TracingSink, World};
use tracing::{error, info};

#[derive(Parser, Debug, PartialEq)]
#[command(
    name = "habitat",
    version,
    about = "Run a headless plant / herbivore / predator simulation and print per-tick metrics as JSON lines"
)]
struct Cli {
    /// JSON configuration file; defaults apply to missing fields.
    config_path: Option<PathBuf>,

    /// Maximum number of ticks to run.
    #[arg(long, default_value_t = 100)]
    steps: u64,

    /// Override the configured seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Stop early once no herbivores or predators are left.
    #[arg(long)]
    until_extinct: bool,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn simulate(cli: &Cli) -> Result<(), SimError> {
    let mut sim_config = match &cli.config_path {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = cli.seed {
        sim_config.seed = seed;
    }
    info!(
        width = sim_config.width,
        height = sim_config.height,
        seed = sim_config.seed,
        "building world"
    );

    let mut world = World::with_sink(sim_config, Box::new(TracingSink))?;
    let mut metrics = MetricsCollector::new(config::METRICS_WINDOW);
    let limit = RunLimit {
        max_steps: cli.steps,
        stop_on_extinction: cli.until_extinct,
    };
    let outcome = habitat::run::run(&mut world, &mut metrics, limit)?;

    for sample in metrics.history() {
        println!("{}", serde_json::to_string(sample)?);
    }
    let window = metrics.window();
    info!(
        ticks = outcome.ticks,
        stop = ?outcome.stop,
        samples = window.samples,
        plants = window.plants,
        herbivores = window.herbivores,
        predators = window.predators,
        births = window.births,
        deaths = window.deaths,
        "done"
    );
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    match simulate(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
