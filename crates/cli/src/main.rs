mod cli;
mod commands;
mod exit;

use clap::Parser;
use kontera_ledger::PostingEngine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();

    if let Err(err) = run(cli).await {
        eprintln!("error: {err:#}");
        std::process::exit(exit::code_for(&err));
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let pool = kontera_storage::create_db(&cli.db).await?;
    let engine = PostingEngine::new(pool.clone());

    match cli.command {
        Commands::Company(cmd) => commands::company(&pool, cmd).await,
        Commands::Verification(cmd) => commands::verification(&pool, &engine, cmd).await,
        Commands::Sie(cmd) => commands::sie(&pool, &engine, cmd).await,
        Commands::Close { company, fiscal_year, date } => {
            commands::close(&pool, &engine, company, fiscal_year, date).await
        }
        Commands::Rules(cmd) => commands::rules(&pool, &engine, cmd).await,
        Commands::Report(cmd) => commands::report(&pool, cmd).await,
    }
}
