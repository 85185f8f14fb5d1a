/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use clap::{builder::TypedValueParser, Parser, Subcommand};

use crate::{tune, EngineConfig, TTable, Variant, MAX_DEPTH};

/// Command-line interface of the engine.
#[derive(Debug, Clone, Parser)]
#[command(version, about, rename_all = "lower")]
pub struct Cli {
    /// Size of the transposition table, in megabytes.
    #[arg(
        long,
        global = true,
        default_value_t = TTable::DEFAULT_SIZE,
        value_parser = clap::value_parser!(u64).range(TTable::MIN_SIZE as u64..=TTable::MAX_SIZE as u64).map(|mb| mb as usize)
    )]
    pub hash: usize,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The [`EngineConfig`] requested on the command line.
    pub fn config(&self) -> EngineConfig {
        let mut config = EngineConfig {
            hash_mb: self.hash,
            ..Default::default()
        };

        if let Command::Search { depth, variant, .. } = &self.command {
            config.depth = *depth;
            config.variant = *variant;
        }

        config
    }
}

/// A command to be sent to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Search a position with iterative deepening and print the best move.
    Search {
        /// FEN of the position to search. Defaults to the starting position.
        #[arg(short, long)]
        fen: Option<String>,

        /// Depth of the final iteration.
        #[arg(
            short,
            long,
            default_value_t = tune::default_depth!(),
            value_parser = clap::value_parser!(u8).range(1..=MAX_DEPTH as i64)
        )]
        depth: u8,

        /// Search algorithm to use.
        #[arg(short, long, value_enum, default_value_t)]
        variant: Variant,

        /// Moves to play from the position before searching, in UCI notation (like `e2e4`).
        #[arg(short, long, num_args = 1..)]
        moves: Vec<String>,
    },

    /// Performs a perft on a position at the supplied depth, printing total node count.
    Perft {
        depth: usize,

        /// FEN of the position. Defaults to the starting position.
        #[arg(short, long)]
        fen: Option<String>,
    },

    /// Performs a split perft on a position at the supplied depth.
    #[command(alias = "sperft")]
    Splitperft {
        depth: usize,

        /// FEN of the position. Defaults to the starting position.
        #[arg(short, long)]
        fen: Option<String>,
    },

    /// Run a benchmark: a fixed-depth search on a series of positions.
    Bench {
        /// Override the default benchmark depth.
        #[arg(
            short,
            long,
            value_parser = clap::value_parser!(u8).range(1..=MAX_DEPTH as i64)
        )]
        depth: Option<u8>,

        /// Search algorithm to benchmark.
        #[arg(short, long, value_enum, default_value_t)]
        variant: Variant,
    },

    /// Print a static evaluation of a position, relative to the side to move.
    Eval {
        /// FEN of the position. Defaults to the starting position.
        #[arg(short, long)]
        fen: Option<String>,

        /// If set, the contribution of every piece will be printed too.
        #[arg(short, long, default_value = "false")]
        pretty: bool,
    },
}
