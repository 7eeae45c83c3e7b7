// SPDX-FileCopyrightText: 2026 Telewatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telewatch - an account monitoring daemon with remote login delegation.
//!
//! This is the binary entry point for the Telewatch daemon.

use clap::{Parser, Subcommand};

mod doctor;
mod remote;
mod serve;
mod shutdown;

/// Telewatch - an account monitoring daemon with remote login delegation.
#[derive(Parser, Debug)]
#[command(name = "telewatch", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Telewatch daemon.
    Serve,
    /// Run diagnostic checks against the Telewatch environment.
    Doctor {
        /// Run additional intensive checks.
        #[arg(long)]
        deep: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match telewatch_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            telewatch_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Doctor { deep }) => doctor::run_doctor(&config, deep).await,
        None => {
            println!("telewatch: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
