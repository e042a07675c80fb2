// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level `clap` surface: `elm-watch make` and `elm-watch hot`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "elm-watch", version, about = "Watch mode for an Elm-like compiler")]
pub struct Cli {
    /// Override the `RUST_LOG` filter (defaults to `info`).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile each target once and exit.
    Make {
        /// Target output names from `elm-watch.json`; all enabled targets if empty.
        targets: Vec<String>,

        /// Compile in debug mode (adds the Elm debugger).
        #[arg(long)]
        debug: bool,

        /// Compile in optimize mode (enables dead-code elimination).
        #[arg(long, conflicts_with = "debug")]
        optimize: bool,
    },

    /// Watch the filesystem and recompile on change, serving live reload.
    Hot {
        /// Target output names from `elm-watch.json`; all enabled targets if empty.
        targets: Vec<String>,

        /// Port to bind the WebSocket server to (defaults to the persisted
        /// port, or an ephemeral one on first run).
        #[arg(long)]
        port: Option<u16>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn make_parses_targets_and_mode_flags() {
        let cli = Cli::parse_from(["elm-watch", "make", "main", "admin", "--debug"]);
        match cli.command {
            Command::Make { targets, debug, optimize } => {
                assert_eq!(targets, vec!["main", "admin"]);
                assert!(debug);
                assert!(!optimize);
            }
            Command::Hot { .. } => panic!("expected Make"),
        }
    }

    #[test]
    fn debug_and_optimize_conflict() {
        let result = Cli::try_parse_from(["elm-watch", "make", "--debug", "--optimize"]);
        assert!(result.is_err());
    }

    #[test]
    fn hot_parses_port_override() {
        let cli = Cli::parse_from(["elm-watch", "hot", "--port", "9000"]);
        match cli.command {
            Command::Hot { targets, port } => {
                assert!(targets.is_empty());
                assert_eq!(port, Some(9000));
            }
            Command::Make { .. } => panic!("expected Hot"),
        }
    }

    #[test]
    fn log_level_is_a_global_flag() {
        let cli = Cli::parse_from(["elm-watch", "--log-level", "debug", "hot"]);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}
