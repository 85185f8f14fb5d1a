/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{tune, ZobristKey};

/// Tracks the positions on the current game path to detect draws by
/// [repetition](https://www.chessprogramming.org/Repetitions) and the
/// [fifty-move rule](https://www.chessprogramming.org/Fifty-move_Rule).
///
/// The search pushes one entry per ply it enters and pops it on the way back up, so the top of the
/// stack is always the position currently being searched.
#[derive(Debug, Clone, Default)]
pub struct DrawTable {
    /// `(hash, halfmove clock)` of every position on the path, oldest first.
    history: Vec<(ZobristKey, u16)>,
}

impl DrawTable {
    /// Creates an empty [`DrawTable`].
    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes the position reached by the latest move.
    ///
    /// A `halfmove` of `0` marks an irreversible move (or a null move), past which no repetition is looked for.
    #[inline(always)]
    pub fn push(&mut self, hash: ZobristKey, halfmove: u16) {
        self.history.push((hash, halfmove));
    }

    /// Removes the most recent position.
    #[inline(always)]
    pub fn pop(&mut self) -> Option<(ZobristKey, u16)> {
        self.history.pop()
    }

    /// The most recent position, if any.
    #[inline(always)]
    pub fn last(&self) -> Option<(ZobristKey, u16)> {
        self.history.last().copied()
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.history.clear();
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.history.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Returns `true` if the top position is drawn by the fifty-move rule, or has already occurred
    /// since the last irreversible move.
    ///
    /// A single earlier occurrence is enough; inside a search, a position that repeats once can be
    /// repeated again.
    pub fn is_draw(&self) -> bool {
        let Some((&(hash, halfmove), earlier)) = self.history.split_last() else {
            return false;
        };

        if halfmove >= tune::fifty_move_limit!() {
            return true;
        }

        // Only positions with the same side to move can repeat, so step back two plies at a time
        earlier
            .iter()
            .rev()
            .take(halfmove as usize)
            .skip(1)
            .step_by(2)
            .any(|&(key, _)| key == hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{magic, Black, Board, Color, Context, Move, White};

    /// Plays `moves` from `ctx`, pushing every new position onto `draws`.
    fn play(board: &mut Board, mut ctx: Context, draws: &mut DrawTable, moves: &[&str]) -> Context {
        let magics = magic::initialize().unwrap();
        for uci in moves {
            let mv = Move::from_uci(board, &ctx, magics, uci).unwrap();
            let (next, _undo) = match ctx.side {
                Color::White => board.apply::<White>(mv, &ctx),
                Color::Black => board.apply::<Black>(mv, &ctx),
            };
            draws.push(next.hash, next.halfmove);
            ctx = next;
        }
        ctx
    }

    #[test]
    fn test_knight_shuffle_repeats() {
        let (mut board, ctx) = Board::startpos();
        let mut draws = DrawTable::new();
        draws.push(ctx.hash, ctx.halfmove);

        let ctx = play(&mut board, ctx, &mut draws, &["g1f3", "g8f6", "f3g1"]);
        assert!(!draws.is_draw());

        play(&mut board, ctx, &mut draws, &["f6g8"]);
        assert!(draws.is_draw());

        draws.pop();
        assert!(!draws.is_draw());
    }

    #[test]
    fn test_irreversible_move_blocks_repetition() {
        let (_, ctx) = Board::startpos();
        let mut draws = DrawTable::new();
        draws.push(ctx.hash, 0);
        draws.push(ZobristKey::default(), 0);
        draws.push(ctx.hash, 0);
        assert!(!draws.is_draw());
    }

    #[test]
    fn test_fifty_move_rule() {
        let mut draws = DrawTable::new();
        assert!(!draws.is_draw());

        draws.push(ZobristKey::default(), 99);
        assert!(!draws.is_draw());

        draws.push(ZobristKey::default(), 100);
        assert!(draws.is_draw());

        draws.clear();
        assert!(draws.is_empty());
    }
}
