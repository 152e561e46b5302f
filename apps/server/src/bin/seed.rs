//! Loads deterministic sample data into the configured store.
//!
//! Usage:
//!   cargo run --bin fittrack-seed -- --reset [--users 5] [--workouts-per-user 4]

use anyhow::Context;
use clap::Parser;
use fittrack::{
    config::{Config, StoreBackend},
    logging,
    services::{seed, SeedPlan},
    state::AppState,
};
use tracing::info;

#[derive(Parser, Debug)]
#[clap(name = "fittrack-seed")]
#[clap(about = "Insert sample users, goals, workouts and exercises")]
struct Args {
    /// Clear every collection before inserting
    #[clap(long)]
    reset: bool,

    /// Number of users to create
    #[clap(short, long, default_value = "5")]
    users: usize,

    /// Workouts logged per user
    #[clap(short, long, default_value = "4")]
    workouts_per_user: usize,

    /// Database connection URL (overrides configuration)
    #[clap(short, long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_simple_logging();
    let args = Args::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(url) = args.database_url {
        config.database.url = url;
    }
    if config.database.backend == StoreBackend::Memory {
        anyhow::bail!("Seeding the in-memory store has no lasting effect; configure postgres");
    }

    let state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?;

    let plan = SeedPlan {
        reset: args.reset,
        users: args.users,
        workouts_per_user: args.workouts_per_user,
    };
    info!(?plan, "Seeding");

    let report = seed(&state.documents, &plan)
        .await
        .context("Seeding failed; rerun with --reset if the data already exists")?;

    info!(
        exercises = report.exercises,
        users = report.users,
        goals = report.goals,
        workouts = report.workouts,
        "Seed complete"
    );
    Ok(())
}
