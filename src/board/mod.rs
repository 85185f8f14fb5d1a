/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Precomputed attack tables for knights, kings and pawns.
mod attacks;

/// Sets of squares as 64-bit integers.
mod bitboard;

/// Castling rights and the non-placement state of a position.
mod context;

/// Magic-hashed attack lookup for sliding pieces.
pub mod magic;

/// Pseudo-legal move generation and move ordering.
mod movegen;

/// Move encoding.
mod moves;

/// Perft: counting nodes of the legal move tree.
mod perft;

/// Colors, piece kinds and pieces.
mod piece;

/// Piece placement, FEN parsing, and applying/reverting moves.
mod position;

/// Compile-time PRNG used for Zobrist keys.
mod prng;

/// Compile-time per-color descriptors.
mod side;

/// Squares, files and ranks.
mod square;

/// Zobrist hashing of positions.
mod zobrist;

pub use attacks::*;
pub use bitboard::*;
pub use context::*;
pub use magic::MagicTables;
pub use movegen::*;
pub use moves::*;
pub use perft::*;
pub use piece::*;
pub use position::*;
pub use prng::*;
pub use side::*;
pub use square::*;
pub use zobrist::*;
