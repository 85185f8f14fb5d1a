/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::cmp::Reverse;

use crate::KillerTable;

use super::{
    king_attacks, knight_attacks, pawn_attacks, Bitboard, Black, Board, Color, Context,
    MagicTables, Move, MoveKind, MoveList, Piece, PieceKind, Side, Square, White,
};

/// Which moves [`Board::pseudo_moves`] should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenKind {
    /// Every pseudo-legal move.
    #[default]
    Pseudos,

    /// Captures (en passant included) and all promotions, capturing or not.
    Captures,
}

/// Ordering buckets, highest searched first.
const PRIORITY_SCORE: i32 = i32::MAX;
const TACTICAL_SCORE: i32 = 1 << 20;
const KILLER_SCORE: i32 = 1 << 19;

/// Promotions offered for every promoting pawn, best first.
const PROMOTIONS: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Knight,
    PieceKind::Rook,
    PieceKind::Bishop,
];

impl Board {
    /// Generates the pseudo-legal moves of side `S`.
    ///
    /// Pseudo-legal moves obey how each piece moves but may leave `S`'s own king in check; callers
    /// filter those out after [`Board::apply`] with [`Board::checkers`]. Castling is the exception:
    /// it is only produced when the king does not start on, cross, or land on an attacked square.
    pub fn pseudo_moves<S: Side>(
        &self,
        ctx: &Context,
        magics: &MagicTables,
        kind: GenKind,
    ) -> MoveList {
        let mut moves = MoveList::new();
        let them = <S::Opponent as Side>::COLOR;

        let occupied = self.occupied();
        let empty = !occupied;
        // Enemy king is never a capture target
        let capturable = self.color(them) & !self.pieces(them, PieceKind::King);
        let quiet_targets = match kind {
            GenKind::Pseudos => empty,
            GenKind::Captures => Bitboard::EMPTY_BOARD,
        };

        /**** Pawns: https://www.chessprogramming.org/Pawn_Pushes_(Bitboards) ****/
        let pawns = self.pieces(S::COLOR, PieceKind::Pawn);

        let single_pushes = S::forward(pawns) & empty;
        for to in single_pushes {
            let from = step_back::<S>(to);
            if S::PROMOTION_RANK.intersects(to) {
                for promotion in PROMOTIONS {
                    moves.push(Move::new(from, to, MoveKind::promotion(promotion, false)));
                }
            } else if quiet_targets.intersects(to) {
                moves.push(Move::new(from, to, MoveKind::Quiet));
            }
        }

        let double_pushes = S::forward(single_pushes & S::DOUBLE_PUSH_RANK) & quiet_targets;
        for to in double_pushes {
            let from = step_back::<S>(step_back::<S>(to));
            moves.push(Move::new(from, to, MoveKind::PawnDoublePush));
        }

        for from in pawns {
            let attacks = pawn_attacks(from, S::COLOR);
            for to in attacks & capturable {
                if S::PROMOTION_RANK.intersects(to) {
                    for promotion in PROMOTIONS {
                        moves.push(Move::new(from, to, MoveKind::promotion(promotion, true)));
                    }
                } else {
                    moves.push(Move::new(from, to, MoveKind::Capture));
                }
            }

            if let Some(ep) = ctx.ep_square {
                if attacks.intersects(ep) && self.piece_at(ep).is_none() {
                    moves.push(Move::new(from, ep, MoveKind::EnPassantCapture));
                }
            }
        }

        /**** Everything else ****/
        for piece_kind in [
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
            PieceKind::King,
        ] {
            for from in self.pieces(S::COLOR, piece_kind) {
                let attacks = match piece_kind {
                    PieceKind::Knight => knight_attacks(from),
                    PieceKind::King => king_attacks(from),
                    slider => magics.attacks(slider, from, occupied),
                };

                for to in attacks & capturable {
                    moves.push(Move::new(from, to, MoveKind::Capture));
                }
                for to in attacks & quiet_targets {
                    moves.push(Move::new(from, to, MoveKind::Quiet));
                }
            }
        }

        /**** Castling: https://www.chessprogramming.org/Castling ****/
        if kind == GenKind::Pseudos {
            let rook = Some(Piece::new(S::COLOR, PieceKind::Rook));
            for (castle, castle_kind) in [
                (S::SHORT_CASTLE, MoveKind::ShortCastle),
                (S::LONG_CASTLE, MoveKind::LongCastle),
            ] {
                let can_castle = ctx.castling.contains(castle.right)
                    && self.piece_at(castle.rook_from) == rook
                    && (occupied & castle.empty).is_empty()
                    && castle
                        .safe
                        .iter()
                        .all(|sq| self.attackers_to(sq, them, occupied, magics).is_empty());

                if can_castle {
                    moves.push(Move::new(castle.king_from, castle.king_to, castle_kind));
                }
            }
        }

        moves
    }

    /// Generates the pseudo-legal moves of side `S`, sorted into search order.
    ///
    /// The order is:
    /// 1. `priority`, if it is among the generated moves (usually the transposition table's move).
    /// 2. Captures and promotions, by [MVV-LVA](https://www.chessprogramming.org/MVV-LVA).
    /// 3. Killer moves recorded for `depth`.
    /// 4. Every other quiet move, in generation order.
    pub fn ordered_moves<S: Side>(
        &self,
        ctx: &Context,
        magics: &MagicTables,
        kind: GenKind,
        priority: Move,
        killers: &KillerTable,
        depth: u8,
    ) -> MoveList {
        let mut moves = self.pseudo_moves::<S>(ctx, magics, kind);

        moves.sort_by_cached_key(|&mv| {
            let score = if mv == priority && !priority.is_null() {
                PRIORITY_SCORE
            } else if !mv.is_quiet() {
                TACTICAL_SCORE + self.mvv_lva(mv)
            } else if killers.is_killer(mv, depth) {
                KILLER_SCORE
            } else {
                0
            };
            Reverse(score)
        });

        moves
    }

    /// Most-valuable-victim / least-valuable-attacker score of a capture or promotion.
    ///
    /// Higher is better. A promotion adds the value of the promoted-to piece.
    pub fn mvv_lva(&self, mv: Move) -> i32 {
        let victim = if mv.is_en_passant() {
            PieceKind::Pawn.value()
        } else {
            self.piece_at(mv.to()).map_or(0, |p| p.kind().value())
        };
        let attacker = self.piece_at(mv.from()).map_or(0, |p| p.kind().value());
        let promotion = mv.promotion().map_or(0, |kind| kind.value());

        victim * 10 - attacker + promotion
    }

    /// Every piece of color `by` that attacks `square`, with sliders blocked by `occupancy`.
    pub fn attackers_to(
        &self,
        square: Square,
        by: Color,
        occupancy: Bitboard,
        magics: &MagicTables,
    ) -> Bitboard {
        let queens = self.pieces(by, PieceKind::Queen);
        let diagonal = self.pieces(by, PieceKind::Bishop) | queens;
        let orthogonal = self.pieces(by, PieceKind::Rook) | queens;

        (pawn_attacks(square, by.opponent()) & self.pieces(by, PieceKind::Pawn))
            | (knight_attacks(square) & self.pieces(by, PieceKind::Knight))
            | (king_attacks(square) & self.pieces(by, PieceKind::King))
            | (magics.bishop(square, occupancy) & diagonal)
            | (magics.rook(square, occupancy) & orthogonal)
    }

    /// Enemy pieces giving check to `S`'s king. Empty if `S` is not in check (or has no king).
    ///
    /// # Example
    /// ```
    /// # use kestrel::{magic, Board, Black, White};
    /// let magics = magic::initialize().unwrap();
    /// let (board, _) = Board::from_fen("k7/1Q6/K7/8/8/8/8/8 b - - 0 1").unwrap();
    /// assert_eq!(board.checkers::<Black>(magics).population(), 1);
    /// assert!(board.checkers::<White>(magics).is_empty());
    /// ```
    #[inline(always)]
    pub fn checkers<S: Side>(&self, magics: &MagicTables) -> Bitboard {
        self.king_square(S::COLOR)
            .map_or(Bitboard::EMPTY_BOARD, |king| {
                self.attackers_to(king, <S::Opponent as Side>::COLOR, self.occupied(), magics)
            })
    }

    /// Pseudo-legal moves for whichever side `ctx` says is to move.
    pub fn moves_for(&self, ctx: &Context, magics: &MagicTables) -> MoveList {
        match ctx.side {
            Color::White => self.pseudo_moves::<White>(ctx, magics, GenKind::Pseudos),
            Color::Black => self.pseudo_moves::<Black>(ctx, magics, GenKind::Pseudos),
        }
    }
}

/// The square one pawn push behind `square`, from `S`'s point of view.
#[inline(always)]
fn step_back<S: Side>(square: Square) -> Square {
    Square::from_index_unchecked((square.0 as i8 - S::PUSH_OFFSET) as usize)
}
