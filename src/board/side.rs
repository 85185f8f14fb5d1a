/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{Bitboard, CastlingRights, Color, Square};

/// The squares involved in one castling move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Castle {
    /// The right that must still be held to castle this way.
    pub right: CastlingRights,
    pub king_from: Square,
    pub king_to: Square,
    pub rook_from: Square,
    pub rook_to: Square,

    /// Squares between king and rook that must be unoccupied.
    pub empty: Bitboard,

    /// Squares the king stands on, crosses, or lands on; none may be attacked.
    pub safe: Bitboard,
}

/// Compile-time description of one side of the board.
///
/// Everything color-dependent in move generation, move application and search is generic over a
/// [`Side`], so each color gets its own monomorphized copy of the hot paths and nothing branches
/// on the side to move inside them.
pub trait Side: 'static {
    /// The runtime color this side describes.
    const COLOR: Color;

    /// Rank a pawn promotes on.
    const PROMOTION_RANK: Bitboard;

    /// Rank a pawn reaches after a single push from its starting rank.
    const DOUBLE_PUSH_RANK: Bitboard;

    /// Signed square offset of a single pawn push.
    const PUSH_OFFSET: i8;

    const SHORT_CASTLE: Castle;
    const LONG_CASTLE: Castle;

    /// The side that moves after this one.
    type Opponent: Side;

    /// Shifts `bb` one rank towards the opponent.
    fn forward(bb: Bitboard) -> Bitboard;

    /// Shifts `bb` one rank towards this side's back rank.
    fn backward(bb: Bitboard) -> Bitboard;

    /// Squares attacked by the pawns in `pawns`.
    #[inline(always)]
    fn pawn_attacks(pawns: Bitboard) -> Bitboard {
        let pushed = Self::forward(pawns);
        pushed.east() | pushed.west()
    }
}

/// Marker type for the White side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct White;

/// Marker type for the Black side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Black;

impl Side for White {
    const COLOR: Color = Color::White;
    const PROMOTION_RANK: Bitboard = Bitboard::RANK_8;
    const DOUBLE_PUSH_RANK: Bitboard = Bitboard::RANK_3;
    const PUSH_OFFSET: i8 = 8;

    const SHORT_CASTLE: Castle = Castle {
        right: CastlingRights::WHITE_SHORT,
        king_from: Square::E1,
        king_to: Square::G1,
        rook_from: Square::H1,
        rook_to: Square::F1,
        empty: Bitboard::new(0x60),
        safe: Bitboard::new(0x70),
    };

    const LONG_CASTLE: Castle = Castle {
        right: CastlingRights::WHITE_LONG,
        king_from: Square::E1,
        king_to: Square::C1,
        rook_from: Square::A1,
        rook_to: Square::D1,
        empty: Bitboard::new(0x0E),
        safe: Bitboard::new(0x1C),
    };

    type Opponent = Black;

    #[inline(always)]
    fn forward(bb: Bitboard) -> Bitboard {
        bb.north()
    }

    #[inline(always)]
    fn backward(bb: Bitboard) -> Bitboard {
        bb.south()
    }
}

impl Side for Black {
    const COLOR: Color = Color::Black;
    const PROMOTION_RANK: Bitboard = Bitboard::RANK_1;
    const DOUBLE_PUSH_RANK: Bitboard = Bitboard::RANK_6;
    const PUSH_OFFSET: i8 = -8;

    const SHORT_CASTLE: Castle = Castle {
        right: CastlingRights::BLACK_SHORT,
        king_from: Square::E8,
        king_to: Square::G8,
        rook_from: Square::H8,
        rook_to: Square::F8,
        empty: Bitboard::new(0x60 << 56),
        safe: Bitboard::new(0x70 << 56),
    };

    const LONG_CASTLE: Castle = Castle {
        right: CastlingRights::BLACK_LONG,
        king_from: Square::E8,
        king_to: Square::C8,
        rook_from: Square::A8,
        rook_to: Square::D8,
        empty: Bitboard::new(0x0E << 56),
        safe: Bitboard::new(0x1C << 56),
    };

    type Opponent = White;

    #[inline(always)]
    fn forward(bb: Bitboard) -> Bitboard {
        bb.south()
    }

    #[inline(always)]
    fn backward(bb: Bitboard) -> Bitboard {
        bb.north()
    }
}
