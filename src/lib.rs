/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Board representation, move generation, and magic bitboards.
mod board;

/// Command-line interface.
mod cli;

/// Repetition and fifty-move rule detection.
mod draw;

/// Owner of the search caches; entry point for every command.
mod engine;

/// Evaluation of chess positions.
mod eval;

/// Killer move heuristic.
mod killers;

/// Piece-Square tables.
mod psqt;

/// Scores and scored moves.
mod score;

/// Main engine logic; all search related code.
mod search;

/// Transposition table.
mod ttable;

/// Tunable search parameters.
mod tune;

pub use board::*;
pub use cli::*;
pub use draw::*;
pub use engine::*;
pub use eval::*;
pub use killers::*;
pub use psqt::*;
pub use score::*;
pub use search::*;
pub use ttable::*;
