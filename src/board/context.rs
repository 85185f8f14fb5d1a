/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Result};

use super::{Board, Color, Square, ZobristKey};

/// The set of castling moves still available to both players, as four bits (`KQkq`).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: Self = Self(0);
    pub const WHITE_SHORT: Self = Self(1);
    pub const WHITE_LONG: Self = Self(2);
    pub const BLACK_SHORT: Self = Self(4);
    pub const BLACK_LONG: Self = Self(8);
    pub const ALL: Self = Self(15);

    /// Number of distinct sets of rights; one Zobrist key exists for each.
    pub const COUNT: usize = 16;

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// `true` if every right in `other` is held.
    #[inline(always)]
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline(always)]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline(always)]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// The rights left after a piece moves from `from` to `to`.
    ///
    /// Touching a king or rook home square (by moving from it or capturing on it) loses the
    /// rights that depend on that piece, whoever made the move.
    ///
    /// # Example
    /// ```
    /// # use kestrel::{CastlingRights, Square};
    /// let rights = CastlingRights::ALL.updated(Square::H1, Square::H8);
    /// assert_eq!(rights.to_string(), "Qq");
    /// ```
    #[inline(always)]
    pub const fn updated(self, from: Square, to: Square) -> Self {
        Self(self.0 & KEPT_RIGHTS[from.index()] & KEPT_RIGHTS[to.index()])
    }

    /// Parses the castling field of a FEN string, such as `KQkq` or `-`.
    pub fn from_uci(castling: &str) -> Result<Self> {
        let mut rights = Self::NONE;
        if castling == "-" {
            return Ok(rights);
        }

        for c in castling.chars() {
            match c {
                'K' => rights.insert(Self::WHITE_SHORT),
                'Q' => rights.insert(Self::WHITE_LONG),
                'k' => rights.insert(Self::BLACK_SHORT),
                'q' => rights.insert(Self::BLACK_LONG),
                _ => bail!("Invalid castling rights {castling:?}: Unexpected char {c:?}"),
            }
        }

        Ok(rights)
    }
}

/// Rights that survive a move touching each square.
const KEPT_RIGHTS: [u8; Square::COUNT] = {
    let mut kept = [CastlingRights::ALL.0; Square::COUNT];
    kept[Square::E1.index()] &= !(CastlingRights::WHITE_SHORT.0 | CastlingRights::WHITE_LONG.0);
    kept[Square::H1.index()] &= !CastlingRights::WHITE_SHORT.0;
    kept[Square::A1.index()] &= !CastlingRights::WHITE_LONG.0;
    kept[Square::E8.index()] &= !(CastlingRights::BLACK_SHORT.0 | CastlingRights::BLACK_LONG.0);
    kept[Square::H8.index()] &= !CastlingRights::BLACK_SHORT.0;
    kept[Square::A8.index()] &= !CastlingRights::BLACK_LONG.0;
    kept
};

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }

        for (right, c) in [
            (Self::WHITE_SHORT, 'K'),
            (Self::WHITE_LONG, 'Q'),
            (Self::BLACK_SHORT, 'k'),
            (Self::BLACK_LONG, 'q'),
        ] {
            if self.contains(right) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({:#06b})", self.0)
    }
}

/// Everything about a position that is not piece placement.
///
/// A [`Context`] is cheap to copy. [`Board::apply`] derives the child's context from the parent's
/// and leaves the parent's untouched, so each ply of a search owns its own.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Context {
    /// Zobrist hash of the full position, pieces included.
    pub hash: ZobristKey,

    /// Side to move.
    pub side: Color,

    pub castling: CastlingRights,

    /// Square a pawn skipped over on the previous move, if that move was a double push.
    pub ep_square: Option<Square>,

    /// Plies since the last capture or pawn move.
    pub halfmove: u16,

    pub fullmove: u16,
}

impl Context {
    /// Builds a context for `board`, hashing the position from scratch.
    pub fn new(
        board: &Board,
        side: Color,
        castling: CastlingRights,
        ep_square: Option<Square>,
        halfmove: u16,
        fullmove: u16,
    ) -> Self {
        Self {
            hash: ZobristKey::from_parts(board, side, castling, ep_square),
            side,
            castling,
            ep_square,
            halfmove,
            fullmove,
        }
    }

    /// Passes the turn: flips the side to move in both the context and its hash.
    ///
    /// Applying this twice restores the original context.
    #[inline(always)]
    pub fn toggle_side(&mut self) {
        self.hash.toggle_side();
        self.side = !self.side;
    }

    /// The context after the side to move passes, as used by null-move pruning.
    ///
    /// The en passant target is dropped (and un-hashed), and the halfmove clock restarts so that
    /// no repetition is detected across the pass. The board itself is unaffected.
    ///
    /// # Example
    /// ```
    /// # use kestrel::{Board, Color};
    /// let (board, ctx) = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
    /// let passed = ctx.null_move();
    /// assert_eq!(passed.side, Color::Black);
    /// assert_eq!(passed.ep_square, None);
    /// ```
    #[inline(always)]
    pub fn null_move(&self) -> Self {
        let mut next = *self;
        if let Some(ep) = next.ep_square.take() {
            next.hash.hash_ep_square(ep);
        }
        next.halfmove = 0;
        next.toggle_side();
        next
    }
}
