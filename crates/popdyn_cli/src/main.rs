//! popdyn - runs the population-dynamics notebook scenarios from the shell.
//!
//! Results are written as JSON to stdout (or `--output`); logs go to stderr.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use popdyn_core::{notebook, Scenario, ScenarioOutput};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "popdyn")]
#[command(about = "Run deterministic and stochastic population-dynamics scenarios")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scenario described in a JSON file
    Run {
        /// Path to a scenario JSON file (a single scenario or an array)
        scenario: PathBuf,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run the built-in notebook sequence
    Notebook {
        /// Only run the scenario with this name
        #[arg(long)]
        only: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },
    /// List the built-in notebook scenarios
    List,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Override the seed of every stochastic scenario
    #[arg(long)]
    seed: Option<u64>,

    /// Write JSON here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "popdyn=info,popdyn_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run { scenario, output } => {
            let scenarios = load_scenarios(&scenario)?;
            run_all(scenarios, &output)
        }
        Command::Notebook { only, output } => {
            let mut scenarios = notebook();
            if let Some(name) = only {
                scenarios.retain(|s| s.name == name);
                if scenarios.is_empty() {
                    bail!("No notebook scenario named '{name}'. Try `popdyn list`.");
                }
            }
            run_all(scenarios, &output)
        }
        Command::List => {
            let mut stdout = std::io::stdout().lock();
            for scenario in notebook() {
                writeln!(
                    stdout,
                    "{:<26} generations={:<4} replicates={:<3} stochastic={}",
                    scenario.name,
                    scenario.generations,
                    scenario.replicates,
                    scenario.model.is_stochastic()
                )?;
            }
            Ok(())
        }
    }
}

fn load_scenarios(path: &Path) -> Result<Vec<Scenario>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    parse_scenarios(&text).with_context(|| format!("Invalid scenario file {}", path.display()))
}

/// Accepts either one scenario object or an array of them.
fn parse_scenarios(text: &str) -> Result<Vec<Scenario>> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else {
        Ok(vec![serde_json::from_value(value)?])
    }
}

fn run_all(mut scenarios: Vec<Scenario>, args: &OutputArgs) -> Result<()> {
    if let Some(seed) = args.seed {
        for scenario in &mut scenarios {
            if scenario.model.is_stochastic() {
                scenario.seed = Some(seed);
            }
        }
    }

    let mut outputs: Vec<ScenarioOutput> = Vec::with_capacity(scenarios.len());
    for scenario in &scenarios {
        if scenario.model.is_stochastic() && scenario.seed.is_none() {
            warn!(scenario = %scenario.name, "no seed given; results will not be reproducible");
        }
        outputs.push(scenario.run()?);
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&outputs)?
    } else {
        serde_json::to_string(&outputs)?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} scenario result(s) to {}", outputs.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{json}")?;
        }
    }
    Ok(())
}
