// src/main.rs
mod cli;
mod config;
mod editor;
mod error;
mod gateway;
mod hex_codec;
mod inspector;
mod models;
mod normalizer;
mod store;

use clap::Parser;

fn main() -> Result<(), error::AppError> {
    env_logger::init();
    log::info!("Starting keychain-inspector");

    let cli_args = cli::Cli::parse();
    let config = config::load_config();

    if let Err(e) = cli::handle_cli_command(cli_args, config) {
        log::error!("Command failed: {:#?}", e);
        eprintln!("Error: {}", e);
        return Err(e);
    }

    log::info!("keychain-inspector finished successfully.");
    Ok(())
}
