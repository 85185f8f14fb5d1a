/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::time::{Duration, Instant};

use anyhow::{bail, Context as _, Result};
use log::{debug, info};

use crate::{
    magic, perft, splitperft, tune, Black, Board, Color, Command, Context, DrawTable, Evaluator,
    KillerTable, MagicTables, Move, Score, Search, TTable, Variant, White, FEN_KIWIPETE,
    FEN_STARTPOS, MAX_DEPTH,
};

/// Positions searched by the `bench` command.
const BENCHMARK_FENS: [&str; 6] = [
    FEN_STARTPOS,
    FEN_KIWIPETE,
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
];

/// Settings an [`Engine`] is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Size of the transposition table, in megabytes.
    pub hash_mb: usize,

    /// Deepest iteration of [`Engine::search`].
    pub depth: u8,

    /// Search algorithm to use.
    pub variant: Variant,
}

impl Default for EngineConfig {
    #[inline(always)]
    fn default() -> Self {
        Self {
            hash_mb: TTable::DEFAULT_SIZE,
            depth: tune::default_depth!(),
            variant: Variant::default(),
        }
    }
}

/// The result of a search, containing the best move found, score, and total nodes searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// Number of nodes searched, summed over every iteration.
    pub nodes: u64,

    /// Best move found during the search. Null if the root has no legal moves.
    pub bestmove: Move,

    /// Evaluation of the position after `bestmove` is made, from the side to move's perspective.
    pub score: Score,

    /// Depth of the last completed iteration.
    pub depth: u8,
}

impl Default for SearchResult {
    /// A default search result should initialize to a *very bad* value,
    /// since there isn't a move to play.
    #[inline(always)]
    fn default() -> Self {
        Self {
            nodes: 0,
            bestmove: Move::NULL,
            score: -Score::INF,
            depth: 0,
        }
    }
}

/// The Kestrel chess engine.
///
/// Owns every cache the search uses. The caches outlive individual searches, so later searches
/// profit from earlier ones, until [`Engine::new_game`] clears them.
pub struct Engine {
    /// Sliding piece attack tables, shared by every engine in the process.
    magics: &'static MagicTables,

    /// Transposition table used to cache information found during search.
    ttable: TTable,

    /// Quiet moves that caused cutoffs, for move ordering.
    killers: KillerTable,

    /// Positions played so far in the current game, for repetition detection.
    draws: DrawTable,

    config: EngineConfig,
}

impl Engine {
    /// Constructs a new [`Engine`], building the magic attack tables if this is the first engine.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let magics = magic::initialize().context("Failed to build magic attack tables")?;

        let ttable = TTable::new(config.hash_mb);
        debug!(
            "Allocated a {}mb transposition table with {} entries",
            ttable.size(),
            ttable.capacity()
        );

        Ok(Self {
            magics,
            ttable,
            killers: KillerTable::default(),
            draws: DrawTable::new(),
            config,
        })
    }

    /// Returns a string of the engine's name and current version.
    #[inline(always)]
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    #[inline(always)]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[inline(always)]
    pub fn magics(&self) -> &'static MagicTables {
        self.magics
    }

    #[inline(always)]
    pub fn ttable(&self) -> &TTable {
        &self.ttable
    }

    /// Resets the engine's internal state.
    ///
    /// This clears all internal caches and hash tables, as well as the game history.
    pub fn new_game(&mut self) {
        self.ttable.clear();
        self.killers.clear();
        self.draws.clear();
        debug!("Cleared all caches");
    }

    /// Plays the legal move `uci` on `board`, recording the resulting position in the game history.
    pub fn play(&mut self, board: &mut Board, ctx: &Context, uci: &str) -> Result<Context> {
        let mv = Move::from_uci(board, ctx, self.magics, uci)?;

        let (next, undo) = match ctx.side {
            Color::White => board.apply::<White>(mv, ctx),
            Color::Black => board.apply::<Black>(mv, ctx),
        };

        let in_check = match ctx.side {
            Color::White => board.checkers::<White>(self.magics),
            Color::Black => board.checkers::<Black>(self.magics),
        }
        .is_nonempty();

        if in_check {
            board.revert(undo);
            bail!("Illegal move {uci:?}: {} would be left in check", ctx.side.name());
        }

        if self.draws.is_empty() {
            self.draws.push(ctx.hash, ctx.halfmove);
        }
        self.draws.push(next.hash, next.halfmove);

        Ok(next)
    }

    /// Performs [iterative deepening](https://www.chessprogramming.org/Iterative_Deepening) on `board`,
    /// from depth 1 up to the configured depth.
    ///
    /// Each iteration reuses the caches filled by the previous one, so the transposition table's
    /// best moves get searched first. One line of progress is logged per iteration.
    pub fn search(&mut self, board: &mut Board, ctx: &Context) -> SearchResult {
        let starttime = Instant::now();
        let mut result = SearchResult::default();

        // The root position must be on top of the draw table
        let pushed_root = self.draws.last().map(|(hash, _)| hash) != Some(ctx.hash);
        if pushed_root {
            self.draws.push(ctx.hash, ctx.halfmove);
        }

        for depth in 1..=self.config.depth.min(MAX_DEPTH) {
            let mut search = Search::new(
                self.magics,
                &mut self.ttable,
                &mut self.killers,
                &mut self.draws,
            );
            let res = search.run(self.config.variant, board, ctx, depth);

            result.nodes += search.stats.nodes;
            result.bestmove = res.mv;
            result.score = res.score;
            result.depth = depth;

            let elapsed = starttime.elapsed();
            info!(
                "depth {depth} score {} bestmove {} nodes {} nps {} time {}ms",
                res.score,
                res.mv,
                result.nodes,
                nps(result.nodes, elapsed),
                elapsed.as_millis()
            );

            // No reason to keep going if there's nothing to play, or the result is already forced
            if res.mv.is_null() || res.score.is_mate() {
                break;
            }
        }

        if pushed_root {
            self.draws.pop();
        }

        result
    }

    /// Counts the leaf nodes of the legal move tree of `board`, `depth` plies deep.
    #[inline(always)]
    pub fn perft(&self, board: &mut Board, ctx: &Context, depth: usize) -> u64 {
        perft(board, ctx, self.magics, depth)
    }

    /// Like [`Engine::perft`], but prints the node count below every root move.
    #[inline(always)]
    pub fn splitperft(&self, board: &mut Board, ctx: &Context, depth: usize) -> u64 {
        splitperft(board, ctx, self.magics, depth)
    }

    /// Runs a fixed-depth search on a set of positions, printing the total node count and speed.
    ///
    /// Returns the total number of nodes searched.
    pub fn bench(&mut self, depth: Option<u8>) -> Result<u64> {
        let original = self.config.depth;
        self.config.depth = depth.unwrap_or(tune::bench_depth!());

        let starttime = Instant::now();
        let mut nodes = 0;

        for (i, fen) in BENCHMARK_FENS.iter().enumerate() {
            info!("Benchmark position {}/{}: {fen}", i + 1, BENCHMARK_FENS.len());

            let (mut board, ctx) = Board::from_fen(fen)?;
            self.new_game();
            nodes += self.search(&mut board, &ctx).nodes;
        }

        let elapsed = starttime.elapsed();
        println!("{nodes} nodes / {elapsed:?} := {} nps", nps(nodes, elapsed));

        self.config.depth = original;
        self.new_game();

        Ok(nodes)
    }

    /// Executes a single command-line [`Command`].
    pub fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Search {
                fen,
                depth,
                variant,
                moves,
            } => {
                self.config.depth = depth;
                self.config.variant = variant;

                let (mut board, mut ctx) = parse_position(fen.as_deref())?;
                for mv in &moves {
                    ctx = self.play(&mut board, &ctx, mv)?;
                }

                let res = self.search(&mut board, &ctx);
                println!("bestmove {} score {}", res.bestmove, res.score);
            }

            Command::Perft { depth, fen } => {
                let (mut board, ctx) = parse_position(fen.as_deref())?;
                let starttime = Instant::now();
                let nodes = self.perft(&mut board, &ctx, depth);
                let elapsed = starttime.elapsed();
                println!("{nodes} nodes / {elapsed:?} := {} nps", nps(nodes, elapsed));
            }

            Command::Splitperft { depth, fen } => {
                let (mut board, ctx) = parse_position(fen.as_deref())?;
                let nodes = self.splitperft(&mut board, &ctx, depth);
                println!("\n{nodes}");
            }

            Command::Bench { depth, variant } => {
                self.config.variant = variant;
                self.bench(depth)?;
            }

            Command::Eval { fen, pretty } => {
                let (board, ctx) = parse_position(fen.as_deref())?;
                let evaluator = Evaluator::new(&board);
                if pretty {
                    println!("{evaluator}");
                } else {
                    println!("{}", evaluator.eval_for(ctx.side));
                }
            }
        }

        Ok(())
    }
}

/// Parses `fen`, defaulting to the standard starting position.
fn parse_position(fen: Option<&str>) -> Result<(Board, Context)> {
    match fen {
        Some(fen) => Board::from_fen(fen),
        None => Ok(Board::startpos()),
    }
}

/// Nodes per second.
#[inline(always)]
fn nps(nodes: u64, elapsed: Duration) -> u64 {
    (nodes as f64 / elapsed.as_secs_f64().max(f64::EPSILON)) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(depth: u8, variant: Variant) -> Engine {
        Engine::new(EngineConfig {
            hash_mb: TTable::MIN_SIZE,
            depth,
            variant,
        })
        .unwrap()
    }

    #[test]
    fn test_white_mate_in_1() {
        for variant in [Variant::Negamax, Variant::Negascout] {
            let mut engine = engine(3, variant);
            let (mut board, ctx) = Board::from_fen("k7/8/KQ6/8/8/8/8/8 w - - 0 1").unwrap();

            let res = engine.search(&mut board, &ctx);
            assert_eq!(res.score, Score::INF, "{variant}");

            // Play the move and make sure Black really is mated
            let next = engine.play(&mut board, &ctx, &res.bestmove.to_string()).unwrap();
            assert_eq!(engine.search(&mut board, &next).score, Score::MATED);
        }
    }

    #[test]
    fn test_stalemate() {
        for variant in [Variant::Negamax, Variant::Negascout] {
            let mut engine = engine(4, variant);
            let (mut board, ctx) = Board::from_fen("k7/8/KQ6/8/8/8/8/8 b - - 0 1").unwrap();

            let res = engine.search(&mut board, &ctx);
            assert!(res.bestmove.is_null(), "{variant}");
            assert_eq!(res.score, Score::DRAW, "{variant}");
        }
    }

    #[test]
    fn test_repeated_position_still_gets_a_move() {
        for variant in [Variant::Negamax, Variant::Negascout] {
            let mut engine = engine(3, variant);
            let (mut board, mut ctx) = Board::startpos();
            for mv in ["g1f3", "g8f6", "f3g1", "f6g8"] {
                ctx = engine.play(&mut board, &ctx, mv).unwrap();
            }

            let res = engine.search(&mut board, &ctx);
            assert!(!res.bestmove.is_null(), "{variant}");
            assert!(engine.play(&mut board, &ctx, &res.bestmove.to_string()).is_ok());
        }
    }

    #[test]
    fn test_search_keeps_game_history() {
        let mut engine = engine(2, Variant::Negamax);
        let (mut board, mut ctx) = Board::startpos();
        for mv in ["g1f3", "g8f6", "f3g1"] {
            ctx = engine.play(&mut board, &ctx, mv).unwrap();
        }
        let len = engine.draws.len();

        engine.search(&mut board, &ctx);
        assert_eq!(engine.draws.len(), len);

        engine.new_game();
        assert!(engine.draws.is_empty());
        assert_eq!(engine.ttable().num_entries(), 0);
    }

    #[test]
    fn test_illegal_moves_are_rejected() {
        let mut engine = engine(1, Variant::Negamax);
        let (mut board, ctx) = Board::from_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1").unwrap();
        let original = board.clone();

        assert!(engine.play(&mut board, &ctx, "e1d2").is_err());
        assert!(engine.play(&mut board, &ctx, "e1e3").is_err());
        assert_eq!(board, original);
        assert!(engine.play(&mut board, &ctx, "e1e2").is_ok());
    }

    #[test]
    fn test_name() {
        let engine = engine(1, Variant::Negamax);
        assert!(engine.name().starts_with("kestrel"));
    }
}
