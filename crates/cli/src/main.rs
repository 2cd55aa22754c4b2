//! Waypoint CLI - drive the progression engine against a JSON data directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use waypoint_core::{Decision, EngineConfig, StepId, TrainingId, UserId};
use waypoint_progress::{EngineError, Navigator, RequiredScoresMet};
use waypoint_storage::JsonStorage;

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "Training-path progression engine", long_about = None)]
struct Cli {
    /// Data directory
    #[arg(long, global = true, default_value = ".waypoint")]
    data: PathBuf,

    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Pair {
    /// Training ID
    #[arg(long)]
    training: u64,

    /// Learner ID
    #[arg(long)]
    user: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Enter a training
    Start {
        #[command(flatten)]
        pair: Pair,
    },
    /// Move on from a step
    Next {
        #[command(flatten)]
        pair: Pair,
        /// Step the learner just left
        #[arg(long)]
        from: u64,
    },
    /// Record the training outcome
    Finish {
        #[command(flatten)]
        pair: Pair,
    },
    /// List the steps with the learner's results
    Steps {
        #[command(flatten)]
        pair: Pair,
    },
    /// Reset achievements after a structure change
    Reset {
        #[command(flatten)]
        pair: Pair,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(cli.config.as_deref()).await?;
    let storage = JsonStorage::new(&cli.data)
        .await
        .with_context(|| format!("opening data directory {}", cli.data.display()))?;
    let navigator = Navigator::new(Arc::new(storage)).with_config(config);

    let outcome = match cli.command {
        Commands::Start { pair } => {
            let (training, user) = pair.ids();
            navigator.start(training, user).await.map(|d| print_decision(&d))
        }
        Commands::Next { pair, from } => {
            let (training, user) = pair.ids();
            navigator
                .next(training, user, StepId(from))
                .await
                .map(|d| print_decision(&d))
        }
        Commands::Finish { pair } => {
            let (training, user) = pair.ids();
            navigator
                .finish(training, user, &RequiredScoresMet)
                .await
                .map(|d| print_decision(&d))
        }
        Commands::Steps { pair } => {
            let (training, user) = pair.ids();
            navigator.steps(training, user).await.map(|steps| {
                println!("Steps ({})", steps.len());
                for step in steps {
                    println!(
                        "  {:>3} | {} | {:<6} | {} | best {} | attempts {}",
                        step.position,
                        step.id,
                        step.typology,
                        step.name,
                        step.best_score.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string()),
                        step.attempts,
                    );
                }
            })
        }
        Commands::Reset { pair } => {
            let (training, user) = pair.ids();
            navigator.reset_achievements(training, user).await.map(|()| {
                info!("Achievements reset for user {} on training {}", user, training);
            })
        }
    };

    if let Err(err) = outcome {
        fail(&err);
    }
    Ok(())
}

impl Pair {
    fn ids(&self) -> (TrainingId, UserId) {
        (TrainingId(self.training), UserId(self.user))
    }
}

async fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}

fn print_decision(decision: &Decision) {
    match serde_json::to_string_pretty(decision) {
        Ok(json) => println!("{}", json),
        Err(err) => eprintln!("Failed to render decision: {}", err),
    }
}

fn fail(err: &EngineError) -> ! {
    eprintln!("{}", err.user_message());
    std::process::exit(1);
}
