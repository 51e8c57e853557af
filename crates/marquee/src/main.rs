// SPDX-FileCopyrightText: 2026 Marquee Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Marquee - a JSON HTTP API for a movie catalog.
//!
//! This is the binary entry point.

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use figment::Figment;
use marquee_config::MarqueeConfig;

use crate::serve::ServeArgs;

/// Marquee - a JSON HTTP API for a movie catalog.
#[derive(Parser, Debug)]
#[command(name = "marquee", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this TOML file instead of the default search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the API server (the default).
    Serve(ServeArgs),
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let base = marquee_config::build_figment(cli.config.as_deref());

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => {
            let config = load_or_exit(args.apply(base));
            if let Err(e) = serve::init_logging(&config.log) {
                eprintln!("marquee: {e}");
                std::process::exit(1);
            }
            if let Err(e) = serve::run_serve(config).await {
                marquee_log::fatal(&e);
            }
        }
        Commands::Config => {
            let config = load_or_exit(base);
            match marquee_config::to_toml(&config) {
                Ok(text) => print!("{text}"),
                Err(e) => {
                    eprintln!("marquee: failed to render configuration: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}

/// Loads and validates configuration, rendering every problem and exiting
/// on failure.
fn load_or_exit(figment: Figment) -> MarqueeConfig {
    match marquee_config::load_and_validate(figment) {
        Ok(config) => config,
        Err(errors) => {
            marquee_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}
