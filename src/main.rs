mod builder;
mod cli;
mod compile;
mod config;
mod manager;
mod model;
mod plan;
mod policy;
mod remote;
mod storage;
mod tools;

use std::process;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::Config;

const LOG_ENV: &str = "COACH_LOG";

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(cli.verbose >= 2)
        .init();

    tracing::debug!(verbosity = cli.verbose, "coach started");

    let config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&cli, &config) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
