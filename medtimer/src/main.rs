//! Medtimer - a single-user daily medication tracker.
//!
//! Add medications with a scheduled time, mark doses taken, and keep an eye
//! on adherence and streaks from a small reactive dashboard.
//!
//! Architecture:
//! - The server holds the one in-memory session and serves the dashboard
//! - CLI is a thin client that talks to the server via HTTP
//! - All tracking logic lives in `tracker`, free of any I/O

mod cli;
mod config;
mod models;
mod server;
mod snapshot;
mod tracker;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    execute(cli).await
}
