/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{Black, Board, Color, Context, GenKind, MagicTables, Side, White};

/// Counts the leaf nodes of the legal move tree `depth` plies deep.
///
/// Uses bulk counting: at depth 1 the legal moves are counted rather than played.
///
/// # Example
/// ```
/// # use kestrel::{magic, perft, Board};
/// let magics = magic::initialize().unwrap();
/// let (mut board, ctx) = Board::startpos();
/// assert_eq!(perft(&mut board, &ctx, magics, 3), 8_902);
/// ```
#[inline(always)]
pub fn perft(board: &mut Board, ctx: &Context, magics: &MagicTables, depth: usize) -> u64 {
    perft_generic::<true, false>(board, ctx, magics, depth)
}

/// Like [`perft`], but also prints the node count below each root move.
#[inline(always)]
pub fn splitperft(board: &mut Board, ctx: &Context, magics: &MagicTables, depth: usize) -> u64 {
    perft_generic::<true, true>(board, ctx, magics, depth)
}

/// Perft with a choice of bulk counting (`BULK`) and per-root-move output (`SPLIT`).
///
/// The board is restored before returning.
pub fn perft_generic<const BULK: bool, const SPLIT: bool>(
    board: &mut Board,
    ctx: &Context,
    magics: &MagicTables,
    depth: usize,
) -> u64 {
    match ctx.side {
        Color::White => perft_side::<BULK, SPLIT, White>(board, ctx, magics, depth),
        Color::Black => perft_side::<BULK, SPLIT, Black>(board, ctx, magics, depth),
    }
}

fn perft_side<const BULK: bool, const SPLIT: bool, S: Side>(
    board: &mut Board,
    ctx: &Context,
    magics: &MagicTables,
    depth: usize,
) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut nodes = 0;
    for mv in board.pseudo_moves::<S>(ctx, magics, GenKind::Pseudos) {
        let (next, undo) = board.apply::<S>(mv, ctx);

        // Illegal: the mover's own king is left in check
        if board.checkers::<S>(magics).is_nonempty() {
            board.revert(undo);
            continue;
        }

        let new_nodes = if BULK && !SPLIT && depth == 1 {
            1
        } else {
            perft_side::<BULK, false, S::Opponent>(board, &next, magics, depth - 1)
        };
        board.revert(undo);

        if SPLIT {
            println!("{mv}\t{new_nodes}");
        }
        nodes += new_nodes;
    }

    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{magic, FEN_KIWIPETE};

    #[test]
    fn test_perft_restores_board() {
        let magics = magic::initialize().unwrap();
        let (mut board, ctx) = Board::from_fen(FEN_KIWIPETE).unwrap();
        let original = board.clone();

        assert_eq!(perft(&mut board, &ctx, magics, 2), 2_039);
        assert_eq!(board, original);
    }

    #[test]
    fn test_bulk_and_full_counts_agree() {
        let magics = magic::initialize().unwrap();
        let (mut board, ctx) = Board::startpos();

        let bulk = perft_generic::<true, false>(&mut board, &ctx, magics, 3);
        let full = perft_generic::<false, false>(&mut board, &ctx, magics, 3);
        assert_eq!(bulk, full);
    }
}
