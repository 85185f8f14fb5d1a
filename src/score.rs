/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::Move;

/// A numerical representation of the evaluation of a position / move, in units of ["centipawns"](https://www.chessprogramming.org/Score).
///
/// Scores are always in `[-INF, INF]`. Being checkmated is worth exactly [`Score::MATED`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Score(pub i32);

impl Score {
    /// Largest possible score ever achievable.
    pub const INF: Self = Self(i16::MAX as i32);

    /// Score of the side to move when it has been checkmated.
    pub const MATED: Self = Self(-Self::INF.0);

    /// Score of a draw, including stalemate.
    pub const DRAW: Self = Self(0);

    #[inline(always)]
    pub const fn new(score: i32) -> Self {
        Self(score)
    }

    /// `true` if this is a win or loss by checkmate rather than a heuristic evaluation.
    #[inline(always)]
    pub const fn is_mate(&self) -> bool {
        self.0.abs() >= Self::INF.0
    }

    #[inline(always)]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Score in pawns, for printing.
    #[inline(always)]
    pub fn normalize(&self) -> f32 {
        self.0 as f32 / 100.0
    }
}

macro_rules! impl_binary_op {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }

        impl std::ops::$trait<i32> for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: i32) -> Self::Output {
                Self(self.0.$fn(rhs))
            }
        }
    };
}

macro_rules! impl_binary_op_assign {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: Self) {
                self.0.$fn(rhs.0);
            }
        }

        impl std::ops::$trait<i32> for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: i32) {
                self.0.$fn(rhs);
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);
impl_binary_op!(Div, div);

impl_binary_op_assign!(AddAssign, add_assign);
impl_binary_op_assign!(SubAssign, sub_assign);

impl std::ops::Neg for Score {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self(self.0.neg())
    }
}

impl PartialEq<i32> for Score {
    fn eq(&self, other: &i32) -> bool {
        self.0.eq(other)
    }
}

impl PartialOrd<i32> for Score {
    fn partial_cmp(&self, other: &i32) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl fmt::Display for Score {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            s if s >= Self::INF.0 => write!(f, "{s} (mating)"),
            s if s <= Self::MATED.0 => write!(f, "{s} (mated)"),
            s => write!(f, "{s}"),
        }
    }
}

/// A move together with the score it leads to, from the mover's perspective.
///
/// This is what every level of the search hands back to its parent.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MoveScore {
    pub mv: Move,
    pub score: Score,
}

impl MoveScore {
    #[inline(always)]
    pub const fn new(mv: Move, score: Score) -> Self {
        Self { mv, score }
    }

    /// A score with no move attached, for leaves and pruned nodes.
    #[inline(always)]
    pub const fn leaf(score: Score) -> Self {
        Self::new(Move::NULL, score)
    }
}

impl fmt::Display for MoveScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.mv, self.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_scores() {
        assert!(Score::MATED.is_mate());
        assert!((-Score::MATED).is_mate());
        assert_eq!(-Score::MATED, Score::INF);
        assert!(!Score::new(900).is_mate());
        assert!(Score::MATED < Score::DRAW);
    }

    #[test]
    fn test_score_arithmetic() {
        let mut score = Score::new(10) + 5 - Score::new(3);
        assert_eq!(score, 12);
        score -= 2;
        assert_eq!(score * 2, Score::new(20));
        assert!(score > 9);
    }
}
