// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! elm-watch — watch mode for an Elm-like single-shot compiler.

mod cli;
mod commands;
mod exit;
mod render;
mod term;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use exit::ExitCode;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let result = match cli.command {
        Command::Make { targets, debug, optimize } => commands::make::run(targets, debug, optimize).await,
        Command::Hot { targets, port } => commands::hot::run(targets, port).await,
    };

    match result {
        Ok(()) => std::process::exit(ExitCode::Success.as_i32()),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(err.code.as_i32());
        }
    }
}

fn init_logging(log_level: Option<&str>) {
    let filter = log_level
        .map(EnvFilter::new)
        .or_else(|| std::env::var("RUST_LOG").ok().map(EnvFilter::new))
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}
