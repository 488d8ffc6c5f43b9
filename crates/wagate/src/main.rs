// SPDX-FileCopyrightText: 2026 Wagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wagate - a multi-tenant WhatsApp-to-webhook gateway.
//!
//! This is the binary entry point for the gateway daemon.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod backend;
mod config;
mod serve;

/// Wagate - a multi-tenant WhatsApp-to-webhook gateway.
#[derive(Parser, Debug)]
#[command(name = "wagate", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway daemon.
    Serve {
        /// Path to an explicit config file (skips the XDG lookup).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the effective configuration and exit.
    Config {
        /// Path to an explicit config file (skips the XDG lookup).
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { config } => match config::load(config.as_deref()) {
            Ok(cfg) => serve::run(cfg).await,
            Err(e) => Err(wagate_core::WagateError::Config(e.to_string())),
        },
        Commands::Config { config } => match config::load(config.as_deref()) {
            Ok(cfg) => {
                match serde_json::to_string_pretty(&cfg) {
                    Ok(rendered) => println!("{rendered}"),
                    Err(e) => println!("failed to render config: {e}"),
                }
                Ok(())
            }
            Err(e) => Err(wagate_core::WagateError::Config(e.to_string())),
        },
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }
}
