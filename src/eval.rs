/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{Board, Color, File, PieceKind, Psqt, Rank, Score, Square, MAX_PHASE};

/// Encapsulates the logic of scoring a chess position.
///
/// [`Evaluator::eval`] is always from White's point of view: a high score is good for White, a low
/// score is good for Black. The search wants scores relative to the side to move, which is what
/// [`Evaluator::eval_for`] gives.
///
/// The evaluation is a [tapered](https://www.chessprogramming.org/Tapered_Eval) sum of PeSTO
/// piece-square values, so a position and its color-flipped mirror always evaluate to exact negatives.
#[derive(Debug, Clone)]
pub struct Evaluator<'a> {
    /// The position to evaluate.
    board: &'a Board,

    /// Game phase in `[0, MAX_PHASE]`; higher means more pieces are on the board.
    pub(crate) phase: i32,
}

impl<'a> Evaluator<'a> {
    /// Construct a new [`Evaluator`], computing the game phase of `board`.
    #[inline(always)]
    pub fn new(board: &'a Board) -> Self {
        Self {
            board,
            phase: game_phase(board),
        }
    }

    /// Evaluate this position from White's perspective.
    pub fn eval(&self) -> Score {
        let mut mg = 0;
        let mut eg = 0;

        for (square, piece) in self.board {
            let (mg_psqt_score, eg_psqt_score) = Psqt::evals(piece, square);
            let sign = piece.color().negation_multiplier();
            mg += mg_psqt_score * sign;
            eg += eg_psqt_score * sign;
        }

        Score::new(Psqt::taper(mg, eg, self.phase))
    }

    /// Evaluate this position from `color`'s perspective.
    ///
    /// A positive/high number is good for `color`, while a negative number is better for the opponent.
    /// A score of 0 is considered equal.
    #[inline(always)]
    pub fn eval_for(&self, color: Color) -> Score {
        self.eval() * color.negation_multiplier()
    }

    /// Fetches the value for the piece on the specified square, if one exists.
    ///
    /// Only used when printing the evaluator
    #[inline(always)]
    fn value_at(&self, square: Square) -> Option<Score> {
        self.board.piece_at(square).map(|piece| {
            let (mg, eg) = Psqt::evals(piece, square);
            Score::new(Psqt::taper(mg, eg, self.phase) * piece.color().negation_multiplier())
        })
    }
}

impl fmt::Display for Evaluator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  +")?;
        for _ in File::iter() {
            write!(f, "-----+")?;
        }
        writeln!(f)?;
        for rank in Rank::iter().rev() {
            write!(f, "{rank} |")?;

            // Step 1: Write the piece char
            for file in File::iter() {
                let piece = self.board.piece_at(Square::new(file, rank));
                let piece_char = piece.map(|p| p.char()).unwrap_or(' ');
                write!(f, "  {piece_char}  |")?;
            }
            writeln!(f)?;
            write!(f, "  |")?;

            // Step 2: Write the contribution of that piece
            for file in File::iter() {
                let score = match self.value_at(Square::new(file, rank)) {
                    Some(val) if val > Score::DRAW => format!("+{}", val.normalize()),
                    Some(val) => format!("{}", val.normalize()),
                    None => String::new(),
                };
                write!(f, "{score:^5}|")?;
            }
            writeln!(f)?;

            write!(f, "  +")?;
            for _ in File::iter() {
                write!(f, "-----+")?;
            }
            writeln!(f)?;
        }
        for file in File::iter() {
            write!(f, "     {file}")?;
        }

        let score = self.eval();
        let winning_side = if score > Score::DRAW {
            Some(Color::White)
        } else if score < Score::DRAW {
            Some(Color::Black)
        } else {
            None
        };

        writeln!(f, "\n\nPhase: {}/{MAX_PHASE}", self.phase)?;
        writeln!(
            f,
            "Winning side: {}",
            winning_side.map(|c| c.name()).unwrap_or("N/A")
        )?;
        writeln!(f, "Score: {score}")?;

        Ok(())
    }
}

/// Sums the phase weights of every piece on the board, capped at [`MAX_PHASE`] so early promotions
/// don't push it out of range.
#[inline(always)]
fn game_phase(board: &Board) -> i32 {
    let phase = PieceKind::all().into_iter().fold(0, |phase, kind| {
        phase + board.kind(kind).population() as i32 * Psqt::phase_weight(kind)
    });
    phase.min(MAX_PHASE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Piece, FEN_KIWIPETE};

    /// Swaps colors and mirrors ranks, keeping the side to move's point of view.
    fn mirrored(board: &Board) -> Board {
        let mut mirror = Board::new();
        for (square, piece) in board {
            mirror.place(piece.flipped(), square.flipped());
        }
        mirror
    }

    #[test]
    fn test_startpos_is_balanced() {
        let (board, _) = Board::startpos();
        let eval = Evaluator::new(&board);
        assert_eq!(eval.phase, MAX_PHASE);
        assert_eq!(eval.eval(), Score::DRAW);
    }

    #[test]
    fn test_eval_is_antisymmetric() {
        for fen in [
            FEN_KIWIPETE,
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        ] {
            let (board, ctx) = Board::from_fen(fen).unwrap();
            let mirror = mirrored(&board);

            let eval = Evaluator::new(&board);
            let mirror_eval = Evaluator::new(&mirror);
            assert_eq!(eval.eval(), -mirror_eval.eval(), "{fen}");
            assert_eq!(
                eval.eval_for(ctx.side),
                mirror_eval.eval_for(ctx.side.opponent()),
                "{fen}"
            );
        }
    }

    #[test]
    fn test_material_advantage_is_positive() {
        let (board, _) = Board::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        let eval = Evaluator::new(&board);
        assert!(eval.eval() > 800);
        assert!(eval.eval_for(Color::Black) < -800);
    }

    #[test]
    fn test_phase_is_capped() {
        let mut board = Board::new();
        board.place(Piece::new(Color::White, PieceKind::King), Square::E1);
        board.place(Piece::new(Color::Black, PieceKind::King), Square::E8);
        for square in Square::iter().filter(|sq| sq.rank() == Rank::FOUR) {
            board.place(Piece::new(Color::White, PieceKind::Queen), square);
        }
        assert_eq!(Evaluator::new(&board).phase, MAX_PHASE);
    }

    #[test]
    fn test_display_shows_score() {
        let (board, _) = Board::startpos();
        let shown = Evaluator::new(&board).to_string();
        assert!(shown.contains("Score: "));
        assert!(shown.contains("Winning side: N/A"));
    }
}
