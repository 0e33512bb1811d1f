use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use morrigan_gp::config::{AppConfig, ConfigManager};
use morrigan_gp::data::PopulationStore;
use morrigan_gp::engines::evaluation::{fitness, SimulatorGateway};
use morrigan_gp::engines::generation::{ConsoleProgressCallback, EvolutionEngine};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "morrigan-gp", version, about = "Evolve tank programs against the Morrigan simulator")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Populations directory, overriding the configuration
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Random seed, overriding the configuration
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create generation 0 from random programs
    Init,
    /// Evaluate the latest generation and write the next one
    Step {
        /// Number of consecutive cycles
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        count: u32,
        /// Print each cycle's report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration, or write it to a file
    Config {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut manager = ConfigManager::load(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let (root, seed) = (cli.root, cli.seed);
    manager.update(|c| {
        if let Some(root) = root {
            c.population.root = root;
        }
        if seed.is_some() {
            c.evolution.seed = seed;
        }
    })?;

    match cli.command {
        Command::Config { output } => match output {
            Some(path) => manager
                .save_to_file(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?,
            None => print!("{}", manager.to_toml()?),
        },
        Command::Init => {
            let mut engine = build_engine(manager.get());
            let dir = engine
                .initialize_population()
                .context("Failed to initialize population")?;
            log::info!("Generation 0 written to {}", dir.display());
        }
        Command::Step { count, json } => {
            let mut engine = build_engine(manager.get());
            let mut progress = ConsoleProgressCallback;
            for cycle in 1..=count {
                let report = engine
                    .step(&mut progress)
                    .with_context(|| format!("Cycle {}/{} failed", cycle, count))?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                }
            }
        }
    }

    Ok(())
}

fn build_engine(config: &AppConfig) -> EvolutionEngine<SimulatorGateway> {
    EvolutionEngine::new(
        PopulationStore::new(&config.population.root, config.population.size),
        config.evolution.clone(),
        SimulatorGateway::new(config.evaluator.clone()),
        fitness::model_for(&config.fitness.policy),
    )
}
