/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{anyhow, Result};

use super::{Board, Context, MagicTables, PieceKind, Square};

/// Upper bound on the number of pseudo-legal moves in any reachable position.
///
/// The maximum number of *legal* moves is [218](https://www.chessprogramming.org/Chess_Position#cite_note-4);
/// pseudo-legal generation can exceed that slightly, so some headroom is kept.
pub const MAX_NUM_MOVES: usize = 256;

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// The different kinds of moves, stored in the top four bits of a [`Move`].
///
/// Flag values follow the [chess programming wiki](https://www.chessprogramming.org/Encoding_Moves#From-To_Based).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[repr(u16)]
pub enum MoveKind {
    Quiet = 0,
    PawnDoublePush = 1,
    ShortCastle = 2,
    LongCastle = 3,
    Capture = 4,
    EnPassantCapture = 5,
    PromoteKnight = 8,
    PromoteBishop = 9,
    PromoteRook = 10,
    PromoteQueen = 11,
    CaptureAndPromoteKnight = 12,
    CaptureAndPromoteBishop = 13,
    CaptureAndPromoteRook = 14,
    CaptureAndPromoteQueen = 15,
}

impl MoveKind {
    /// Bit set on every capturing kind.
    const CAPTURE_FLAG: u16 = 0b0100;

    /// Bit set on every promoting kind.
    const PROMOTION_FLAG: u16 = 0b1000;

    /// Builds the promotion kind for `promotion`, capturing or not.
    #[inline(always)]
    pub const fn promotion(promotion: PieceKind, capture: bool) -> Self {
        use MoveKind::*;
        match (promotion, capture) {
            (PieceKind::Knight, false) => PromoteKnight,
            (PieceKind::Bishop, false) => PromoteBishop,
            (PieceKind::Rook, false) => PromoteRook,
            (_, false) => PromoteQueen,
            (PieceKind::Knight, true) => CaptureAndPromoteKnight,
            (PieceKind::Bishop, true) => CaptureAndPromoteBishop,
            (PieceKind::Rook, true) => CaptureAndPromoteRook,
            (_, true) => CaptureAndPromoteQueen,
        }
    }

    const fn from_bits(bits: u16) -> Self {
        use MoveKind::*;
        match bits {
            1 => PawnDoublePush,
            2 => ShortCastle,
            3 => LongCastle,
            4 => Capture,
            5 => EnPassantCapture,
            8 => PromoteKnight,
            9 => PromoteBishop,
            10 => PromoteRook,
            11 => PromoteQueen,
            12 => CaptureAndPromoteKnight,
            13 => CaptureAndPromoteBishop,
            14 => CaptureAndPromoteRook,
            15 => CaptureAndPromoteQueen,
            _ => Quiet,
        }
    }
}

/// A move encoded in 16 bits.
///
/// ```text
///     0000 000000 000000
///      |     |      |
///      |     |      +- Source square.
///      |     +- Destination square.
///      +- Flags for the MoveKind.
/// ```
///
/// The all-zero encoding is reserved as the "null" move: no move at all, used for empty slots,
/// missing best moves and the pass played during null-move pruning.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Move(u16);

impl Move {
    const SRC_MASK: u16 = 0b0000_0000_0011_1111;
    const DST_MASK: u16 = 0b0000_1111_1100_0000;
    const DST_BITS: u16 = 6;
    const FLG_BITS: u16 = 12;

    /// The null move.
    pub const NULL: Self = Self(0);

    /// Creates a new [`Move`] from `from` to `to` of the given [`MoveKind`].
    ///
    /// # Example
    /// ```
    /// # use kestrel::{Move, MoveKind, Square};
    /// let mv = Move::new(Square::E1, Square::G1, MoveKind::ShortCastle);
    /// assert_eq!(mv.from(), Square::E1);
    /// assert_eq!(mv.to(), Square::G1);
    /// assert_eq!(mv.to_string(), "e1g1");
    /// ```
    #[inline(always)]
    pub const fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self((kind as u16) << Self::FLG_BITS | (to.0 as u16) << Self::DST_BITS | from.0 as u16)
    }

    #[inline(always)]
    pub const fn from(&self) -> Square {
        Square((self.0 & Self::SRC_MASK) as u8)
    }

    #[inline(always)]
    pub const fn to(&self) -> Square {
        Square(((self.0 & Self::DST_MASK) >> Self::DST_BITS) as u8)
    }

    #[inline(always)]
    pub const fn kind(&self) -> MoveKind {
        MoveKind::from_bits(self.0 >> Self::FLG_BITS)
    }

    #[inline(always)]
    pub const fn inner(&self) -> u16 {
        self.0
    }

    #[inline(always)]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// `true` for regular captures, en passant, and capture-promotions.
    #[inline(always)]
    pub const fn is_capture(&self) -> bool {
        (self.0 >> Self::FLG_BITS) & MoveKind::CAPTURE_FLAG != 0
    }

    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        (self.0 >> Self::FLG_BITS) & MoveKind::PROMOTION_FLAG != 0
    }

    /// A move that neither captures nor promotes.
    #[inline(always)]
    pub const fn is_quiet(&self) -> bool {
        !self.is_capture() && !self.is_promotion()
    }

    #[inline(always)]
    pub const fn is_en_passant(&self) -> bool {
        matches!(self.kind(), MoveKind::EnPassantCapture)
    }

    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        matches!(self.kind(), MoveKind::ShortCastle | MoveKind::LongCastle)
    }

    /// The piece a promoting pawn becomes.
    #[inline(always)]
    pub const fn promotion(&self) -> Option<PieceKind> {
        use MoveKind::*;
        match self.kind() {
            PromoteKnight | CaptureAndPromoteKnight => Some(PieceKind::Knight),
            PromoteBishop | CaptureAndPromoteBishop => Some(PieceKind::Bishop),
            PromoteRook | CaptureAndPromoteRook => Some(PieceKind::Rook),
            PromoteQueen | CaptureAndPromoteQueen => Some(PieceKind::Queen),
            _ => None,
        }
    }

    /// Finds the legal-looking move matching the UCI string `uci` (like `e7e8q`) in `board`.
    ///
    /// The move is looked up among the pseudo-legal moves of the side to move, so its [`MoveKind`]
    /// is always correct for the position.
    pub fn from_uci(board: &Board, ctx: &Context, magics: &MagicTables, uci: &str) -> Result<Self> {
        board
            .moves_for(ctx, magics)
            .into_iter()
            .find(|mv| mv.to_string() == uci)
            .ok_or_else(|| anyhow!("{uci:?} is not a pseudo-legal move in the current position"))
    }
}

impl fmt::Display for Move {
    /// Formats as UCI long algebraic notation, like `e2e4` or `e7e8q`. The null move prints as `0000`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "0000");
        }

        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(promotion) = self.promotion() {
            write!(f, "{}", promotion.to_uci())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({:?})", self.kind())
    }
}
