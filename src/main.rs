//! Bunder Bot - Telegram partner-matching and weather assistant.

use clap::Parser;
use std::process::ExitCode;

use bunderbot::cli::Commands;
use bunderbot::{config, logging};

#[tokio::main]
async fn main() -> ExitCode {
    // Env files first so RUST_LOG from .env applies to logging
    config::load_env_files();

    let args = Commands::parse();

    let _guard = match logging::init(args.verbose) {
        Ok((guard, _)) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match args.run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
