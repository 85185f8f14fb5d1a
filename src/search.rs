/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Neg};

use crate::{
    tune, Black, Board, Color, Context, DrawTable, Evaluator, GenKind, KillerTable, MagicTables,
    Move, MoveScore, NodeType, Score, Side, TTable, TTableEntry, White,
};

/// Maximum depth that can be searched
pub const MAX_DEPTH: u8 = u8::MAX / 2;

/// Which tree search algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Variant {
    /// Plain alpha-beta [negamax](https://www.chessprogramming.org/Negamax), with null move pruning.
    Negamax,

    /// [Principal Variation Search](https://www.chessprogramming.org/Principal_Variation_Search):
    /// every move after the first is only verified with a null window.
    #[default]
    Negascout,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Negamax => write!(f, "negamax"),
            Self::Negascout => write!(f, "negascout"),
        }
    }
}

/// Represents the bounds of a search window: `[alpha, beta]`.
///
/// Both are relative to the side to move at the node the window belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBounds {
    /// Lower bound: the score the side to move is already guaranteed elsewhere.
    pub alpha: Score,

    /// Upper bound: the score the opponent is already guaranteed to hold us to.
    pub beta: Score,
}

impl SearchBounds {
    #[inline(always)]
    pub const fn new(alpha: Score, beta: Score) -> Self {
        Self { alpha, beta }
    }

    /// The zero-width window `[alpha, alpha + 1]` used to test whether a move can beat alpha.
    #[inline(always)]
    pub fn null_alpha(&self) -> Self {
        Self::new(self.alpha, self.alpha + 1)
    }

    /// `true` if no score can fall strictly inside this window.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.alpha >= self.beta
    }
}

impl Default for SearchBounds {
    /// The widest window: `[-INF, INF]`.
    #[inline(always)]
    fn default() -> Self {
        Self::new(-Score::INF, Score::INF)
    }
}

impl Neg for SearchBounds {
    type Output = Self;
    /// The window as seen by the opponent: bounds are swapped and negated.
    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self::new(-self.beta, -self.alpha)
    }
}

impl fmt::Display for SearchBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.alpha, self.beta)
    }
}

/// Counters collected during a search.
///
/// These are purely observational; nothing in the search reads them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes visited by the main search and by quiescence.
    pub nodes: u64,

    /// Nodes where the main search stopped recursing: draws, quiescence hand-offs, mates and stalemates.
    pub leaves: u64,

    /// Negascout null-window probes that had to be searched again with the full window.
    pub researches: u64,

    /// Null moves tried.
    pub null_moves: u64,

    /// Main search nodes visited at each remaining depth.
    pub depth_histogram: Vec<u64>,
}

impl SearchStats {
    #[inline(always)]
    fn record_node(&mut self, depth: u8) {
        self.nodes += 1;

        let depth = depth as usize;
        if self.depth_histogram.len() <= depth {
            self.depth_histogram.resize(depth + 1, 0);
        }
        self.depth_histogram[depth] += 1;
    }
}

/// A single search over one position, borrowing the caches owned by an [`Engine`](crate::Engine).
///
/// The board is shared mutably down the whole recursion. Every move applied to it is reverted
/// before the call that applied it returns, so the board always holds the position of the node
/// currently being searched. The draw table mirrors this: each ply pushes the position it enters
/// and pops it on the way back, so the caller must push the root position before searching.
pub struct Search<'a> {
    magics: &'a MagicTables,
    ttable: &'a mut TTable,
    killers: &'a mut KillerTable,
    draws: &'a mut DrawTable,

    /// Counters for this search.
    pub stats: SearchStats,
}

impl<'a> Search<'a> {
    /// Construct a new [`Search`] over the provided caches.
    #[inline(always)]
    pub fn new(
        magics: &'a MagicTables,
        ttable: &'a mut TTable,
        killers: &'a mut KillerTable,
        draws: &'a mut DrawTable,
    ) -> Self {
        Self {
            magics,
            ttable,
            killers,
            draws,
            stats: SearchStats::default(),
        }
    }

    /// Searches `board` to `depth` with the full window, using whichever side `ctx` says is to move.
    ///
    /// This is the root of a search: the root position is never scored as a draw, even if it has
    /// occurred before, so a move is returned whenever one is legal.
    pub fn run(
        &mut self,
        variant: Variant,
        board: &mut Board,
        ctx: &Context,
        depth: u8,
    ) -> MoveScore {
        let depth = depth.min(MAX_DEPTH);
        let bounds = SearchBounds::default();

        match (ctx.side, variant) {
            (Color::White, Variant::Negamax) => {
                self.alpha_beta::<White, false, true>(board, ctx, depth, bounds)
            }
            (Color::Black, Variant::Negamax) => {
                self.alpha_beta::<Black, false, true>(board, ctx, depth, bounds)
            }
            (Color::White, Variant::Negascout) => {
                self.alpha_beta::<White, true, true>(board, ctx, depth, bounds)
            }
            (Color::Black, Variant::Negascout) => {
                self.alpha_beta::<Black, true, true>(board, ctx, depth, bounds)
            }
        }
    }

    /// [Negamax](https://www.chessprogramming.org/Negamax) with alpha-beta pruning and
    /// [null move pruning](https://www.chessprogramming.org/Null_Move_Pruning).
    ///
    /// `S` must be the side to move in `ctx`. The returned score is relative to `S`.
    #[inline(always)]
    pub fn negamax<S: Side>(
        &mut self,
        board: &mut Board,
        ctx: &Context,
        depth: u8,
        bounds: SearchBounds,
    ) -> MoveScore {
        self.alpha_beta::<S, false, false>(board, ctx, depth, bounds)
    }

    /// [Negascout](https://www.chessprogramming.org/NegaScout): like [`Search::negamax`], but every
    /// move after the first is searched with a null window, and only searched again with the full
    /// window if it turns out to be better than the moves before it.
    ///
    /// Null move pruning is not used here.
    #[inline(always)]
    pub fn negascout<S: Side>(
        &mut self,
        board: &mut Board,
        ctx: &Context,
        depth: u8,
        bounds: SearchBounds,
    ) -> MoveScore {
        self.alpha_beta::<S, true, false>(board, ctx, depth, bounds)
    }

    /// The shared body of [`Search::negamax`] (`SCOUT = false`) and [`Search::negascout`] (`SCOUT = true`).
    ///
    /// `ROOT` skips the draw check, which only applies to positions reached inside the search.
    fn alpha_beta<S: Side, const SCOUT: bool, const ROOT: bool>(
        &mut self,
        board: &mut Board,
        ctx: &Context,
        depth: u8,
        bounds: SearchBounds,
    ) -> MoveScore {
        debug_assert_eq!(S::COLOR, ctx.side, "Searching for the wrong side");
        self.stats.record_node(depth);

        if !ROOT && self.draws.is_draw() {
            self.stats.leaves += 1;
            return MoveScore::leaf(Score::DRAW);
        }

        if depth == 0 {
            self.stats.leaves += 1;
            return MoveScore::leaf(self.quiescence::<S>(board, ctx, bounds));
        }

        // The window this node was entered with, used to classify the result for the ttable
        let original = bounds;
        let mut bounds = bounds;
        let mut priority = Move::NULL;

        if let Some(entry) = self.ttable.probe(&ctx.hash).copied() {
            priority = entry.bestmove;

            if entry.depth >= depth {
                match entry.node_type {
                    NodeType::Exact => return entry.result(),
                    NodeType::Lower => bounds.alpha = bounds.alpha.max(entry.score),
                    NodeType::Upper => bounds.beta = bounds.beta.min(entry.score),
                }

                if bounds.is_empty() {
                    self.record_killer(entry.bestmove, depth);
                    return entry.result();
                }
            }
        }

        let in_check = board.checkers::<S>(self.magics).is_nonempty();

        if !SCOUT && self.can_null_move::<S>(board, depth, bounds, in_check) {
            self.stats.null_moves += 1;

            let child = ctx.null_move();
            self.draws.push(child.hash, child.halfmove);
            let score = -self
                .alpha_beta::<S::Opponent, SCOUT, false>(
                    board,
                    &child,
                    depth.saturating_sub(tune::nmp_reduction!()),
                    -bounds,
                )
                .score;
            self.draws.pop();

            if score >= bounds.beta {
                return MoveScore::leaf(bounds.beta);
            }
        }

        let moves = board.ordered_moves::<S>(
            ctx,
            self.magics,
            GenKind::Pseudos,
            priority,
            self.killers,
            depth,
        );

        let mut best = MoveScore::leaf(-Score::INF);
        let mut legal = 0;

        for mv in moves {
            let (child, undo) = board.apply::<S>(mv, ctx);

            // Moves that leave our king attacked are not legal
            if board.checkers::<S>(self.magics).is_nonempty() {
                board.revert(undo);
                continue;
            }
            legal += 1;

            self.draws.push(child.hash, child.halfmove);
            let score = if !SCOUT || legal == 1 {
                -self
                    .alpha_beta::<S::Opponent, SCOUT, false>(board, &child, depth - 1, -bounds)
                    .score
            } else {
                let probe = -self
                    .alpha_beta::<S::Opponent, SCOUT, false>(
                        board,
                        &child,
                        depth - 1,
                        -bounds.null_alpha(),
                    )
                    .score;

                if bounds.alpha < probe && probe < bounds.beta {
                    // The probe only proved a bound; the full window gives the actual score
                    self.stats.researches += 1;
                    -self
                        .alpha_beta::<S::Opponent, SCOUT, false>(board, &child, depth - 1, -bounds)
                        .score
                } else {
                    probe
                }
            };
            self.draws.pop();
            board.revert(undo);

            if best.mv.is_null() || score > best.score {
                best = MoveScore::new(mv, score);
            }

            bounds.alpha = bounds.alpha.max(best.score);
            if bounds.is_empty() {
                self.record_killer(mv, depth);
                break;
            }
        }

        if legal == 0 {
            self.stats.leaves += 1;
            let score = if in_check { Score::MATED } else { Score::DRAW };
            return MoveScore::leaf(score);
        }

        self.ttable
            .store(TTableEntry::new(ctx.hash, best, original, depth));

        best
    }

    /// [Quiescence search](https://www.chessprogramming.org/Quiescence_Search): keeps playing
    /// captures and promotions until the position is quiet, so a static evaluation is never taken
    /// in the middle of an exchange.
    ///
    /// The side to move may always "stand pat" on the static evaluation instead of capturing.
    /// Scores are fail-soft and relative to `S`.
    pub fn quiescence<S: Side>(
        &mut self,
        board: &mut Board,
        ctx: &Context,
        bounds: SearchBounds,
    ) -> Score {
        self.stats.nodes += 1;

        let stand_pat = Evaluator::new(board).eval_for(S::COLOR);
        if stand_pat >= bounds.beta {
            return stand_pat;
        }

        let mut bounds = bounds;
        bounds.alpha = bounds.alpha.max(stand_pat);
        let mut best = stand_pat;

        let moves = board.ordered_moves::<S>(
            ctx,
            self.magics,
            GenKind::Captures,
            Move::NULL,
            self.killers,
            0,
        );

        for mv in moves {
            let (child, undo) = board.apply::<S>(mv, ctx);
            if board.checkers::<S>(self.magics).is_nonempty() {
                board.revert(undo);
                continue;
            }

            let score = -self.quiescence::<S::Opponent>(board, &child, -bounds);
            board.revert(undo);

            best = best.max(score);
            bounds.alpha = bounds.alpha.max(score);
            if bounds.is_empty() {
                break;
            }
        }

        best
    }

    /// Null move pruning is only sound-ish when passing is unlikely to be the best move: the side
    /// to move must have pieces besides pawns (zugzwang is common otherwise), must not be in check,
    /// and must already be doing better than `beta`.
    #[inline(always)]
    fn can_null_move<S: Side>(
        &self,
        board: &Board,
        depth: u8,
        bounds: SearchBounds,
        in_check: bool,
    ) -> bool {
        depth >= tune::min_nmp_depth!()
            && !in_check
            && board.non_pawn_material(S::COLOR).is_nonempty()
            && Evaluator::new(board).eval_for(S::COLOR) > bounds.beta
    }

    /// Killers are only useful for quiet moves; captures are already ordered first.
    #[inline(always)]
    fn record_killer(&mut self, mv: Move, depth: u8) {
        if mv.is_quiet() {
            self.killers.record_cutoff(mv, depth);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::magic;

    struct Caches {
        ttable: TTable,
        killers: KillerTable,
        draws: DrawTable,
    }

    impl Caches {
        fn new(ctx: &Context) -> Self {
            let mut draws = DrawTable::new();
            draws.push(ctx.hash, ctx.halfmove);
            Self {
                ttable: TTable::new(TTable::MIN_SIZE),
                killers: KillerTable::default(),
                draws,
            }
        }

        fn search(&mut self) -> Search<'_> {
            let magics = magic::initialize().unwrap();
            Search::new(
                magics,
                &mut self.ttable,
                &mut self.killers,
                &mut self.draws,
            )
        }
    }

    #[test]
    fn test_bounds_negation() {
        let bounds = SearchBounds::new(Score::new(-30), Score::new(70));
        assert_eq!(-bounds, SearchBounds::new(Score::new(-70), Score::new(30)));
        assert_eq!(-(-bounds), bounds);
        assert_eq!(
            -bounds.null_alpha(),
            SearchBounds::new(Score::new(-(-30 + 1)), Score::new(30))
        );
        assert!(!SearchBounds::default().is_empty());
    }

    #[test]
    fn test_fifty_move_draw() {
        let (mut board, ctx) = Board::from_fen("4k3/8/8/8/8/8/8/QQQQK3 w - - 100 80").unwrap();
        let mut caches = Caches::new(&ctx);

        // Inside the tree, a drawn node is a leaf
        let res = caches
            .search()
            .negamax::<White>(&mut board, &ctx, 3, SearchBounds::default());
        assert_eq!(res, MoveScore::leaf(Score::DRAW));
        let res = caches
            .search()
            .negascout::<White>(&mut board, &ctx, 3, SearchBounds::default());
        assert_eq!(res, MoveScore::leaf(Score::DRAW));

        // The root still picks a move, but every reply is drawn
        for variant in [Variant::Negamax, Variant::Negascout] {
            let res = caches.search().run(variant, &mut board, &ctx, 3);
            assert!(!res.mv.is_null());
            assert_eq!(res.score, Score::DRAW);
        }
    }

    #[test]
    fn test_repeated_root_still_has_a_move() {
        let (mut board, ctx) = Board::startpos();
        let mut caches = Caches::new(&ctx);
        // The root already occurred once before
        caches.draws.push(ctx.hash, 0);
        caches.draws.push(ctx.hash, 2);
        assert!(caches.draws.is_draw());

        for variant in [Variant::Negamax, Variant::Negascout] {
            let res = caches.search().run(variant, &mut board, &ctx, 2);
            assert!(!res.mv.is_null(), "{variant}");
        }
    }

    #[test]
    fn test_exact_entry_is_returned_without_searching() {
        let (mut board, ctx) = Board::startpos();
        let mut caches = Caches::new(&ctx);

        let magics = magic::initialize().unwrap();
        let mv = Move::from_uci(&board, &ctx, magics, "d2d4").unwrap();
        let stored = MoveScore::new(mv, Score::new(42));
        caches.ttable.store(TTableEntry::new(
            ctx.hash,
            stored,
            SearchBounds::default(),
            5,
        ));

        let mut search = caches.search();
        let res = search.negamax::<White>(&mut board, &ctx, 4, SearchBounds::default());
        assert_eq!(res, stored);
        assert_eq!(search.stats.nodes, 1);
    }

    #[test]
    fn test_shallower_entry_is_only_a_hint() {
        let (mut board, ctx) = Board::startpos();
        let mut caches = Caches::new(&ctx);

        let magics = magic::initialize().unwrap();
        let mv = Move::from_uci(&board, &ctx, magics, "a2a3").unwrap();
        caches.ttable.store(TTableEntry::new(
            ctx.hash,
            MoveScore::new(mv, Score::INF),
            SearchBounds::default(),
            1,
        ));

        let res = caches
            .search()
            .negascout::<White>(&mut board, &ctx, 2, SearchBounds::default());
        assert!(!res.score.is_mate());
    }

    #[test]
    fn test_lower_bound_cutoff_records_killer() {
        let (mut board, ctx) = Board::startpos();
        let mut caches = Caches::new(&ctx);

        let magics = magic::initialize().unwrap();
        let mv = Move::from_uci(&board, &ctx, magics, "g1f3").unwrap();
        let bounds = SearchBounds::new(Score::new(-10), Score::new(10));
        caches.ttable.store(TTableEntry::new(
            ctx.hash,
            MoveScore::new(mv, Score::new(50)),
            bounds,
            3,
        ));

        let mut search = caches.search();
        let res = search.negamax::<White>(&mut board, &ctx, 3, bounds);
        assert_eq!(res, MoveScore::new(mv, Score::new(50)));
        assert_eq!(search.stats.nodes, 1);
        assert!(caches.killers.is_killer(mv, 3));
    }

    #[test]
    fn test_upper_bound_only_lowers_beta() {
        let (mut board, ctx) = Board::startpos();
        let mut caches = Caches::new(&ctx);

        let magics = magic::initialize().unwrap();
        let mv = Move::from_uci(&board, &ctx, magics, "e2e4").unwrap();

        caches.ttable.store(TTableEntry::new(
            ctx.hash,
            MoveScore::new(mv, Score::new(-10)),
            SearchBounds::new(Score::new(-10), Score::new(10)),
            2,
        ));
        assert_eq!(
            caches.ttable.get(&ctx.hash).map(|e| e.node_type),
            Some(NodeType::Upper)
        );

        // Beta drops to -10, but alpha stays at -20, so the node is still searched
        let bounds = SearchBounds::new(Score::new(-20), Score::new(100));
        let mut search = caches.search();
        search.negascout::<White>(&mut board, &ctx, 2, bounds);
        assert!(search.stats.nodes > 1);
    }

    #[test]
    fn test_search_restores_board_and_draws() {
        let (mut board, ctx) = Board::from_fen(crate::FEN_KIWIPETE).unwrap();
        let original = board.clone();
        let mut caches = Caches::new(&ctx);

        for variant in [Variant::Negamax, Variant::Negascout] {
            let res = caches.search().run(variant, &mut board, &ctx, 3);
            assert!(!res.mv.is_null());
            assert_eq!(board, original);
            assert_eq!(caches.draws.len(), 1);
        }
    }

    #[test]
    fn test_quiescence_stands_pat_when_quiet() {
        let (mut board, ctx) = Board::startpos();
        let mut caches = Caches::new(&ctx);

        let score = caches
            .search()
            .quiescence::<White>(&mut board, &ctx, SearchBounds::default());
        assert_eq!(score, Evaluator::new(&board).eval_for(Color::White));
    }

    #[test]
    fn test_quiescence_resolves_hanging_queen() {
        // Black's queen is en prise to the pawn; quiescence must see the capture
        let (mut board, ctx) = Board::from_fen("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1").unwrap();
        let mut caches = Caches::new(&ctx);

        let stand_pat = Evaluator::new(&board).eval_for(Color::White);
        let score = caches
            .search()
            .quiescence::<White>(&mut board, &ctx, SearchBounds::default());
        assert!(stand_pat < 0);
        assert!(score > 0);
    }
}
