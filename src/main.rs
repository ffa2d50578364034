use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    ConfigCommand, MealCommand, PlanCommand, ProfileCommand, StatsCommand, WeightCommand,
};
use config::Config;
use fueltrack_core::{AutomergeStore, DocumentStore};

#[derive(Parser)]
#[command(name = "fueltrack")]
#[command(version)]
#[command(about = "Plan meals, log what you eat and track your weight", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the meal plan for a day
    Plan(PlanCommand),

    /// Log and review eaten meals
    Meal(MealCommand),

    /// Record and list body weight
    Weight(WeightCommand),

    /// Manage the user profile and goals
    Profile(ProfileCommand),

    /// Calorie, macro and weight statistics
    Stats(StatsCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::load(cli.config)?;
    init_tracing(&config.log_level.value);

    let Some(command) = cli.command else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    let store: Arc<dyn DocumentStore> =
        Arc::new(AutomergeStore::new(config.data_dir.value.clone()));
    tracing::debug!("Using data directory {}", config.data_dir.value.display());

    match command {
        Commands::Plan(cmd) => cmd.run(store, &config).await?,
        Commands::Meal(cmd) => cmd.run(store, &config).await?,
        Commands::Weight(cmd) => cmd.run(store, &config).await?,
        Commands::Profile(cmd) => cmd.run(store, &config).await?,
        Commands::Stats(cmd) => cmd.run(store, &config).await?,
        Commands::Config(cmd) => cmd.run(&config)?,
    }

    Ok(())
}

/// Logs go to stderr so JSON output on stdout stays parseable.
fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
