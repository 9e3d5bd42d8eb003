// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intervox - an AI-driven job interview engine.
//!
//! This is the binary entry point for the Intervox server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;
mod store;

/// Intervox - an AI-driven job interview engine.
#[derive(Parser, Debug)]
#[command(name = "intervox", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Intervox interview server.
    Serve,
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match intervox_config::load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("intervox: invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("intervox serve: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            print_config(config);
        }
        None => {
            println!("intervox: use --help for available commands");
        }
    }
}

/// Prints the effective configuration as TOML with the API key redacted.
fn print_config(config: intervox_config::IntervoxConfig) {
    match toml::to_string_pretty(&redacted(config)) {
        Ok(rendered) => println!("{rendered}"),
        Err(e) => eprintln!("intervox config: failed to render: {e}"),
    }
}

fn redacted(mut config: intervox_config::IntervoxConfig) -> intervox_config::IntervoxConfig {
    if config.gemini.api_key.is_some() {
        config.gemini.api_key = Some("<redacted>".to_string());
    }
    config
}
