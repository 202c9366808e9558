// SPDX-FileCopyrightText: 2026 Ekkle Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ekkle -- WhatsApp sales-automation backend.
//!
//! This is the binary entry point for the Ekkle service.

use clap::{Parser, Subcommand};

mod serve;

/// Ekkle -- WhatsApp sales-automation backend.
#[derive(Parser, Debug)]
#[command(name = "ekkle", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the webhook gateway and worker pool.
    Serve,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match ekkle_config::load_and_validate() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ekkle: {e}");
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("ekkle serve: {e}");
                std::process::exit(1);
            }
        }
        None => {
            println!("ekkle: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn binary_loads_config_defaults() {
        let config = ekkle_config::load_and_validate_str("").expect("default config valid");
        assert_eq!(config.queue.concurrency, 5);
    }
}
