/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{anyhow, bail, Context as _, Result};

use super::{
    Bitboard, Black, Castle, CastlingRights, Color, Context, File, Move, MoveKind, Piece,
    PieceKind, Rank, Side, Square, White,
};

/// FEN string for the starting position of chess.
pub const FEN_STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A popular FEN string for debugging move generation.
pub const FEN_KIWIPETE: &str =
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

/// Piece placement on an `8x8` board.
///
/// Has no knowledge of castling rights, en passant, or move counters; those live in [`Context`].
/// Pieces are tracked redundantly by kind, by color, and in a mailbox for constant-time lookup of a
/// square's occupant.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Board {
    pieces: [Bitboard; PieceKind::COUNT],
    colors: [Bitboard; Color::COUNT],
    mailbox: [Option<Piece>; Square::COUNT],
}

/// What [`Board::revert`] needs to take back one move.
///
/// Only [`Board::apply`] creates these, and reverting consumes one, so every applied move is taken
/// back at most once.
#[must_use = "an applied move must be reverted with `Board::revert`"]
#[derive(Debug, PartialEq, Eq)]
pub struct Undo {
    mv: Move,

    /// The piece that moved, as it was before any promotion.
    moved: Option<Piece>,

    /// The captured piece and the square it stood on (which differs from the destination for en passant).
    captured: Option<(Piece, Square)>,
}

impl Undo {
    /// The move this token takes back.
    #[inline(always)]
    pub const fn mv(&self) -> Move {
        self.mv
    }
}

impl Board {
    /// An empty board.
    ///
    /// # Example
    /// ```
    /// # use kestrel::Board;
    /// assert!(Board::new().occupied().is_empty());
    /// ```
    #[inline(always)]
    pub const fn new() -> Self {
        Self {
            pieces: [Bitboard::EMPTY_BOARD; PieceKind::COUNT],
            colors: [Bitboard::EMPTY_BOARD; Color::COUNT],
            mailbox: [None; Square::COUNT],
        }
    }

    /// The standard starting position and its context.
    pub fn startpos() -> (Self, Context) {
        let mut board = Self::new();
        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        for (file, kind) in File::iter().zip(back_rank) {
            board.place(Piece::new(Color::White, kind), Square::new(file, Rank::ONE));
            board.place(Piece::new(Color::White, PieceKind::Pawn), Square::new(file, Rank::TWO));
            board.place(Piece::new(Color::Black, PieceKind::Pawn), Square::new(file, Rank::SEVEN));
            board.place(Piece::new(Color::Black, kind), Square::new(file, Rank::EIGHT));
        }

        let ctx = Context::new(&board, Color::White, CastlingRights::ALL, None, 0, 1);
        (board, ctx)
    }

    /// Parses a full [FEN](https://www.chessprogramming.org/Forsyth-Edwards_Notation) string.
    ///
    /// Only the placement field is mandatory. Missing trailing fields default to `w - - 0 1`.
    ///
    /// # Example
    /// ```
    /// # use kestrel::{Board, Color, FEN_KIWIPETE};
    /// let (board, ctx) = Board::from_fen(FEN_KIWIPETE).unwrap();
    /// assert_eq!(ctx.side, Color::White);
    /// assert_eq!(board.to_fen(&ctx), FEN_KIWIPETE);
    /// ```
    pub fn from_fen(fen: &str) -> Result<(Self, Context)> {
        let mut split = fen.split_whitespace();

        let placements = split
            .next()
            .ok_or(anyhow!("FEN string must have piece placements."))?;
        let board = Self::from_placements(placements)?;

        let side = Color::from_uci(split.next().unwrap_or("w"))?;
        let castling = CastlingRights::from_uci(split.next().unwrap_or("-"))?;

        let ep_square = match split.next().unwrap_or("-") {
            "-" => None,
            square => Some(Square::from_uci(square).context("Invalid en passant square")?),
        };

        let halfmove = split.next().unwrap_or("0");
        let halfmove = halfmove
            .parse::<u16>()
            .with_context(|| format!("FEN string must have valid halfmove counter. Got {halfmove:?}"))?;

        let fullmove = split.next().unwrap_or("1");
        let fullmove = fullmove
            .parse::<u16>()
            .with_context(|| format!("FEN string must have valid fullmove counter. Got {fullmove:?}"))?;

        for color in Color::all() {
            let kings = board.pieces(color, PieceKind::King).population();
            if kings != 1 {
                bail!("FEN must have exactly one {} king. Got {kings}", color.name());
            }
        }

        if let Some(ep) = ep_square {
            board.validate_ep_square(ep, side)?;
        }

        let ctx = Context::new(&board, side, castling, ep_square, halfmove, fullmove);
        Ok((board, ctx))
    }

    /// An en passant target must be empty, on the capturing side's sixth rank, and have an enemy
    /// pawn right behind it.
    fn validate_ep_square(&self, ep: Square, side: Color) -> Result<()> {
        let (rank, toward_victim) = match side {
            Color::White => (Rank::SIX, -1),
            Color::Black => (Rank::THREE, 1),
        };

        if ep.rank() != rank || self.piece_at(ep).is_some() {
            bail!("Invalid en passant square {ep} for {} to move", side.name());
        }

        let victim = ep
            .offset(0, toward_victim)
            .and_then(|sq| self.piece_at(sq));
        if victim != Some(Piece::new(side.opponent(), PieceKind::Pawn)) {
            bail!("En passant square {ep} has no {} pawn to capture", side.opponent().name());
        }

        Ok(())
    }

    /// Parses only the piece-placement field of a FEN string.
    fn from_placements(placements: &str) -> Result<Self> {
        if placements.matches('/').count() != 7 {
            bail!("FEN must have piece placements for all 8 ranks. Got {placements:?}");
        }

        let mut board = Self::new();

        // Ranks are listed from 8 down to 1
        for (rank, row) in Rank::iter().rev().zip(placements.split('/')) {
            let mut file = 0;
            for c in row.chars() {
                if let Some(empty) = c.to_digit(10) {
                    file += empty as u8;
                    continue;
                }

                let piece = Piece::from_uci(c)?;
                if file >= 8 {
                    bail!("FEN rank {rank} has more than 8 files: {row:?}");
                }
                board.place(piece, Square::new(File(file), rank));
                file += 1;
            }

            if file != 8 {
                bail!("FEN rank {rank} must cover exactly 8 files: {row:?}");
            }
        }

        Ok(board)
    }

    /// Generates the FEN string of this board together with `ctx`.
    pub fn to_fen(&self, ctx: &Context) -> String {
        let mut ranks = Vec::with_capacity(Rank::COUNT);

        for rank in Rank::iter().rev() {
            let mut row = String::new();
            let mut empty = 0;
            for file in File::iter() {
                match self.piece_at(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty != 0 {
                            row.push_str(&empty.to_string());
                            empty = 0;
                        }
                        row.push(piece.char());
                    }
                    None => empty += 1,
                }
            }
            if empty != 0 {
                row.push_str(&empty.to_string());
            }
            ranks.push(row);
        }

        let ep = ctx.ep_square.map_or(String::from("-"), |sq| sq.to_uci());
        format!(
            "{} {} {} {ep} {} {}",
            ranks.join("/"),
            ctx.side,
            ctx.castling,
            ctx.halfmove,
            ctx.fullmove
        )
    }

    /// Places `piece` on `square`, which must be empty.
    #[inline(always)]
    pub fn place(&mut self, piece: Piece, square: Square) {
        debug_assert!(self.mailbox[square].is_none(), "{square} is occupied");
        self.pieces[piece.kind()].set(square);
        self.colors[piece.color()].set(square);
        self.mailbox[square] = Some(piece);
    }

    /// Removes and returns the piece on `square`, if any.
    #[inline(always)]
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        let piece = self.mailbox[square].take()?;
        self.pieces[piece.kind()].clear(square);
        self.colors[piece.color()].clear(square);
        Some(piece)
    }

    #[inline(always)]
    pub const fn piece_at(&self, square: Square) -> Option<Piece> {
        self.mailbox[square.index()]
    }

    /// Every square holding a piece of `color`.
    #[inline(always)]
    pub const fn color(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    /// Every square holding a piece of `kind`, of either color.
    #[inline(always)]
    pub const fn kind(&self, kind: PieceKind) -> Bitboard {
        self.pieces[kind.index()]
    }

    #[inline(always)]
    pub const fn pieces(&self, color: Color, kind: PieceKind) -> Bitboard {
        Bitboard(self.color(color).0 & self.kind(kind).0)
    }

    #[inline(always)]
    pub const fn occupied(&self) -> Bitboard {
        Bitboard(self.colors[0].0 | self.colors[1].0)
    }

    #[inline(always)]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color, PieceKind::King).lsb()
    }

    /// Knights, bishops, rooks and queens of `color`.
    #[inline(always)]
    pub fn non_pawn_material(&self, color: Color) -> Bitboard {
        self.color(color) & !(self.kind(PieceKind::Pawn) | self.kind(PieceKind::King))
    }

    /// Iterates over every occupied square and its piece, from `a1` to `h8`.
    #[inline(always)]
    pub fn iter(&self) -> BoardIter<'_> {
        BoardIter {
            board: self,
            occupancy: self.occupied(),
        }
    }

    /// Plays `mv` for side `S`, returning the child's context and the token that takes the move back.
    ///
    /// No legality checks are made: `mv` must be pseudo-legal for `S` in `ctx`. The returned context
    /// has its hash, castling rights, en passant target and clocks updated incrementally.
    ///
    /// # Example
    /// ```
    /// # use kestrel::{magic, Board, Move, White};
    /// let magics = magic::initialize().unwrap();
    /// let (mut board, ctx) = Board::startpos();
    /// let original = board.clone();
    ///
    /// let mv = Move::from_uci(&board, &ctx, magics, "e2e4").unwrap();
    /// let (next, undo) = board.apply::<White>(mv, &ctx);
    /// assert_eq!(next.ep_square.unwrap().to_string(), "e3");
    ///
    /// board.revert(undo);
    /// assert_eq!(board, original);
    /// ```
    pub fn apply<S: Side>(&mut self, mv: Move, ctx: &Context) -> (Context, Undo) {
        let from = mv.from();
        let to = mv.to();

        let mut next = *ctx;
        next.halfmove = next.halfmove.saturating_add(1);
        if S::COLOR == Color::Black {
            next.fullmove = next.fullmove.saturating_add(1);
        }
        if let Some(ep) = next.ep_square.take() {
            next.hash.hash_ep_square(ep);
        }

        let Some(piece) = self.take(from) else {
            debug_assert!(false, "no piece to move on {from} for {mv:?}");
            next.toggle_side();
            return (
                next,
                Undo {
                    mv,
                    moved: None,
                    captured: None,
                },
            );
        };
        next.hash.hash_piece(from, piece);

        let mut captured = None;
        if mv.is_capture() {
            let victim_square = if mv.is_en_passant() {
                behind::<S>(to)
            } else {
                to
            };

            if let Some(victim) = self.take(victim_square) {
                next.hash.hash_piece(victim_square, victim);
                captured = Some((victim, victim_square));
            }
            next.halfmove = 0;
        }

        if mv.is_castle() {
            let castle = castle_for::<S>(mv.kind());
            if let Some(rook) = self.take(castle.rook_from) {
                self.place(rook, castle.rook_to);
                next.hash.hash_piece(castle.rook_from, rook);
                next.hash.hash_piece(castle.rook_to, rook);
            }
        }

        if piece.kind() == PieceKind::Pawn {
            next.halfmove = 0;
            if mv.kind() == MoveKind::PawnDoublePush {
                let ep = behind::<S>(to);
                next.ep_square = Some(ep);
                next.hash.hash_ep_square(ep);
            }
        }

        let placed = match mv.promotion() {
            Some(promotion) => Piece::new(S::COLOR, promotion),
            None => piece,
        };
        self.place(placed, to);
        next.hash.hash_piece(to, placed);

        let castling = ctx.castling.updated(from, to);
        if castling != ctx.castling {
            next.hash.hash_castling(ctx.castling);
            next.hash.hash_castling(castling);
            next.castling = castling;
        }

        next.toggle_side();

        let undo = Undo {
            mv,
            moved: Some(piece),
            captured,
        };
        (next, undo)
    }

    /// Takes back the move recorded in `undo`, restoring the board exactly as it was before
    /// [`Board::apply`] produced it.
    pub fn revert(&mut self, undo: Undo) {
        let Undo {
            mv,
            moved,
            captured,
        } = undo;
        let Some(piece) = moved else {
            return;
        };

        self.take(mv.to());
        self.place(piece, mv.from());

        if mv.is_castle() {
            let castle = match piece.color() {
                Color::White => castle_for::<White>(mv.kind()),
                Color::Black => castle_for::<Black>(mv.kind()),
            };
            if let Some(rook) = self.take(castle.rook_to) {
                self.place(rook, castle.rook_from);
            }
        }

        if let Some((victim, square)) = captured {
            self.place(victim, square);
        }
    }
}

/// The square one step behind `square` from `S`'s point of view.
#[inline(always)]
fn behind<S: Side>(square: Square) -> Square {
    Square::from_index_unchecked((square.0 as i8 - S::PUSH_OFFSET) as usize)
}

#[inline(always)]
const fn castle_for<S: Side>(kind: MoveKind) -> Castle {
    match kind {
        MoveKind::LongCastle => S::LONG_CASTLE,
        _ => S::SHORT_CASTLE,
    }
}

impl Default for Board {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}| ")?;
            for file in File::iter() {
                match self.piece_at(Square::new(file, rank)) {
                    Some(piece) => write!(f, "{piece} ")?,
                    None => write!(f, ". ")?,
                }
            }
            writeln!(f)?;
        }

        write!(f, " +")?;
        for _ in File::iter() {
            write!(f, "--")?;
        }
        write!(f, "\n   ")?;
        for file in File::iter() {
            write!(f, "{file} ")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{self}")?;
        for color in Color::all() {
            writeln!(f, "{:<6} {:?}", color.name(), self.color(color))?;
        }
        for kind in PieceKind::all() {
            writeln!(f, "{:<6} {:?}", kind.name(), self.kind(kind))?;
        }
        Ok(())
    }
}

/// An iterator over the occupied squares of a [`Board`], yielding each square with its [`Piece`].
pub struct BoardIter<'a> {
    board: &'a Board,
    occupancy: Bitboard,
}

impl Iterator for BoardIter<'_> {
    type Item = (Square, Piece);

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let square = self.occupancy.pop_lsb()?;
            if let Some(piece) = self.board.piece_at(square) {
                return Some((square, piece));
            }
        }
    }
}

impl<'a> IntoIterator for &'a Board {
    type Item = (Square, Piece);
    type IntoIter = BoardIter<'a>;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{magic, ZobristKey};

    fn play(board: &mut Board, ctx: &Context, uci: &str) -> (Context, Undo) {
        let magics = magic::initialize().unwrap();
        let mv = Move::from_uci(board, ctx, magics, uci).unwrap();
        match ctx.side {
            Color::White => board.apply::<White>(mv, ctx),
            Color::Black => board.apply::<Black>(mv, ctx),
        }
    }

    fn fresh_hash(board: &Board, ctx: &Context) -> ZobristKey {
        ZobristKey::from_parts(board, ctx.side, ctx.castling, ctx.ep_square)
    }

    #[test]
    fn test_fen_roundtrip() {
        let fens = [
            FEN_STARTPOS,
            FEN_KIWIPETE,
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 12 40",
        ];
        for fen in fens {
            let (board, ctx) = Board::from_fen(fen).unwrap();
            assert_eq!(board.to_fen(&ctx), fen);
        }

        let (board, ctx) = Board::startpos();
        assert_eq!(board.to_fen(&ctx), FEN_STARTPOS);
    }

    #[test]
    fn test_invalid_fens() {
        assert!(Board::from_fen("").is_err());
        assert!(Board::from_fen("8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Board::from_fen("9/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Board::from_fen("4k3/8/8/8/8/8/8/8 w - - 0 1").is_err());
        assert!(Board::from_fen("4k3/8/8/8/8/8/8/4K3 x - - 0 1").is_err());
        assert!(Board::from_fen("4k3/8/8/8/8/8/8/4K3 w - - zero 1").is_err());

        // En passant targets must sit behind an enemy pawn, on the right rank
        assert!(Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").is_ok());
        assert!(Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 b - d6 0 1").is_err());
        assert!(Board::from_fen("4k3/8/8/3PP3/8/8/8/4K3 w - d6 0 1").is_err());
        assert!(Board::from_fen("4k3/8/8/4P3/8/8/8/4K3 w - d6 0 1").is_err());
        assert!(Board::from_fen("4k3/8/8/8/3pP3/8/8/4K3 w - e3 0 1").is_err());
        assert!(Board::from_fen("4k3/8/8/8/3pP3/8/8/4K3 b - e3 0 1").is_ok());
        assert!(Board::from_fen("4k3/8/3n4/3pP3/8/8/8/4K3 w - d6 0 1").is_err());
    }

    #[test]
    fn test_hash_updates_on_quiet_moves() {
        let (mut board, ctx0) = Board::startpos();

        let (ctx1, u1) = play(&mut board, &ctx0, "b1a3");
        assert_eq!(ctx1.hash, fresh_hash(&board, &ctx1));
        let (ctx2, u2) = play(&mut board, &ctx1, "b8a6");
        let (ctx3, u3) = play(&mut board, &ctx2, "a3b1");
        let (ctx4, u4) = play(&mut board, &ctx3, "a6b8");

        // Back where we started, save for the clocks
        assert_eq!(ctx4.hash, ctx0.hash);
        assert_eq!(ctx4.halfmove, 4);

        for undo in [u4, u3, u2, u1] {
            board.revert(undo);
        }
        assert_eq!(board, Board::startpos().0);
    }

    #[test]
    fn test_castling_rights_update() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";

        // King move
        let (mut board, ctx) = Board::from_fen(fen).unwrap();
        let (next, _undo) = play(&mut board, &ctx, "e1d1");
        assert_eq!(next.castling.to_string(), "kq");
        assert_eq!(next.hash, fresh_hash(&board, &next));

        // Rook captures rook: both sides lose a right
        let (mut board, ctx) = Board::from_fen(fen).unwrap();
        let (next, _undo) = play(&mut board, &ctx, "a1a8");
        assert_eq!(next.castling.to_string(), "Kk");
        assert_eq!(next.hash, fresh_hash(&board, &next));

        // Castling moves the rook too
        let (mut board, ctx) = Board::from_fen(fen).unwrap();
        let original = board.clone();
        let (next, undo) = play(&mut board, &ctx, "e1g1");
        assert_eq!(board.to_fen(&next), "r3k2r/8/8/8/8/8/8/R4RK1 b kq - 1 1");
        assert_eq!(next.hash, fresh_hash(&board, &next));
        board.revert(undo);
        assert_eq!(board, original);
    }

    #[test]
    fn test_en_passant_apply_and_revert() {
        let fen = "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3";
        let (mut board, ctx) = Board::from_fen(fen).unwrap();
        let original = board.clone();

        let (next, undo) = play(&mut board, &ctx, "e5f6");
        assert_eq!(
            board.to_fen(&next),
            "rnbqkbnr/ppp1p1pp/5P2/3p4/8/8/PPPP1PPP/RNBQKBNR b KQkq - 0 3"
        );
        assert_eq!(next.hash, fresh_hash(&board, &next));

        board.revert(undo);
        assert_eq!(board, original);
    }

    #[test]
    fn test_promotion_apply_and_revert() {
        let fen = "3q1n2/4P3/8/8/8/8/k7/7K w - - 0 1";
        let (mut board, ctx) = Board::from_fen(fen).unwrap();
        let original = board.clone();

        let (next, undo) = play(&mut board, &ctx, "e7d8n");
        assert_eq!(board.to_fen(&next), "3N1n2/8/8/8/8/8/k7/7K b - - 0 1");
        assert_eq!(next.hash, fresh_hash(&board, &next));

        board.revert(undo);
        assert_eq!(board, original);
    }

    #[test]
    fn test_double_push_always_sets_ep() {
        let (mut board, ctx) = Board::startpos();
        let (next, _undo) = play(&mut board, &ctx, "a2a4");
        assert_eq!(next.ep_square, Some(Square::from_uci("a3").unwrap()));
        assert_eq!(next.hash, fresh_hash(&board, &next));
    }
}
