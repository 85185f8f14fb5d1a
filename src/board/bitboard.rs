/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Not};

use super::{File, Rank, Square};

/// A [`Bitboard`] is a set of squares, one bit per square.
///
/// Bit index 0 is `a1` and bit index 63 is `h8`
/// ([LERF](https://www.chessprogramming.org/Square_Mapping_Considerations#Little-Endian_Rank-File_Mapping)).
/// Piece placement, attack sets and occupancy masks all use this representation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Bitboard(pub(crate) u64);

impl Bitboard {
    pub const FILE_A: Self = Self(0x0101010101010101);
    pub const FILE_H: Self = Self(0x8080808080808080);
    pub const NOT_FILE_A: Self = Self(0xfefefefefefefefe);
    pub const NOT_FILE_H: Self = Self(0x7f7f7f7f7f7f7f7f);
    pub const RANK_1: Self = Self(0x00000000000000FF);
    pub const RANK_2: Self = Self(0x000000000000FF00);
    pub const RANK_3: Self = Self(0x0000000000FF0000);
    pub const RANK_6: Self = Self(0x0000FF0000000000);
    pub const RANK_7: Self = Self(0x00FF000000000000);
    pub const RANK_8: Self = Self(0xFF00000000000000);
    pub const EMPTY_BOARD: Self = Self(0);
    pub const FULL_BOARD: Self = Self(u64::MAX);
    pub const EDGES: Self = Self(0xFF818181818181FF);

    /// Constructs a new [`Bitboard`] from the provided bit pattern.
    ///
    /// # Example
    /// ```
    /// # use kestrel::Bitboard;
    /// let board = Bitboard::new(255);
    /// assert_eq!(board, Bitboard::RANK_1);
    /// ```
    #[inline(always)]
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// Constructs a [`Bitboard`] with only the bit of `square` set.
    #[inline(always)]
    pub const fn from_square(square: Square) -> Self {
        Self(1 << square.0)
    }

    /// Constructs a [`Bitboard`] with every square of `file` set.
    #[inline(always)]
    pub const fn from_file(file: File) -> Self {
        Self(Self::FILE_A.0 << file.0)
    }

    /// Constructs a [`Bitboard`] with every square of `rank` set.
    #[inline(always)]
    pub const fn from_rank(rank: Rank) -> Self {
        Self(Self::RANK_1.0 << (rank.0 * 8))
    }

    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn is_nonempty(&self) -> bool {
        self.0 != 0
    }

    /// Returns `true` if `self` contains *any* of the bits set in `other`.
    ///
    /// # Example
    /// ```
    /// # use kestrel::{Bitboard, Square};
    /// assert!(Bitboard::RANK_1.intersects(Square::E1));
    /// assert!(!Bitboard::RANK_1.intersects(Bitboard::RANK_8));
    /// ```
    #[inline(always)]
    pub fn intersects(&self, other: impl Into<Self>) -> bool {
        (*self & other.into()).is_nonempty()
    }

    #[inline(always)]
    pub fn set(&mut self, other: impl Into<Self>) {
        *self |= other.into()
    }

    #[inline(always)]
    pub fn clear(&mut self, other: impl Into<Self>) {
        *self &= !other.into()
    }

    /// Returns the lowest set square, if any.
    #[inline(always)]
    pub fn lsb(&self) -> Option<Square> {
        self.is_nonempty()
            .then(|| Square(self.0.trailing_zeros() as u8))
    }

    /// Removes and returns the lowest set square, if any.
    #[inline(always)]
    pub fn pop_lsb(&mut self) -> Option<Square> {
        let lsb = self.lsb();
        self.0 &= self.0.wrapping_sub(1);
        lsb
    }

    /// Number of set bits.
    ///
    /// # Example
    /// ```
    /// # use kestrel::Bitboard;
    /// assert_eq!(Bitboard::EDGES.population(), 28);
    /// ```
    #[inline(always)]
    pub const fn population(&self) -> u8 {
        self.0.count_ones() as u8
    }

    /// Iterates over the set bits as [`Square`]s, lowest first.
    #[inline(always)]
    pub const fn iter(&self) -> BitboardIter {
        BitboardIter { bitboard: *self }
    }

    /// Iterates over every subset of this bitboard, starting with the empty set and ending with `self`.
    ///
    /// # Example
    /// ```
    /// # use kestrel::Bitboard;
    /// let mask = Bitboard::new(0b1011);
    /// assert_eq!(mask.subsets().count(), 8);
    /// assert_eq!(mask.subsets().last(), Some(mask));
    /// ```
    #[inline(always)]
    pub const fn subsets(&self) -> BitboardSubsetIter {
        BitboardSubsetIter {
            mask: *self,
            subset: Self::EMPTY_BOARD,
            remaining: 1 << self.population(),
        }
    }

    /// Mirrors this bitboard vertically, swapping rank 1 with rank 8 and so on.
    #[inline(always)]
    pub const fn flipped(&self) -> Self {
        Self(self.0.swap_bytes())
    }

    #[inline(always)]
    pub const fn north(self) -> Self {
        Self(self.0 << 8)
    }

    #[inline(always)]
    pub const fn south(self) -> Self {
        Self(self.0 >> 8)
    }

    #[inline(always)]
    pub const fn east(self) -> Self {
        Self((self.0 << 1) & Self::NOT_FILE_A.0)
    }

    #[inline(always)]
    pub const fn west(self) -> Self {
        Self((self.0 >> 1) & Self::NOT_FILE_H.0)
    }
}

macro_rules! impl_bitwise_op {
    // Impl op and op_assign
    ($op:tt, $op_assign:tt, $func:ident, $func_assign:ident) => {
        impl<T> std::ops::$op<T> for Bitboard
        where
            Self: From<T>,
        {
            type Output = Self;
            #[inline(always)]
            fn $func(self, rhs: T) -> Self::Output {
                Self(self.0.$func(Self::from(rhs).0))
            }
        }

        impl<T> std::ops::$op_assign<T> for Bitboard
        where
            Self: From<T>,
        {
            #[inline(always)]
            fn $func_assign(&mut self, rhs: T) {
                self.0.$func_assign(Self::from(rhs).0);
            }
        }
    };
}

impl_bitwise_op!(BitAnd, BitAndAssign, bitand, bitand_assign);
impl_bitwise_op!(BitOr, BitOrAssign, bitor, bitor_assign);
impl_bitwise_op!(BitXor, BitXorAssign, bitxor, bitxor_assign);

impl Not for Bitboard {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

impl From<Square> for Bitboard {
    #[inline(always)]
    fn from(value: Square) -> Self {
        Self::from_square(value)
    }
}

impl From<u64> for Bitboard {
    #[inline(always)]
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromIterator<Square> for Bitboard {
    fn from_iter<T: IntoIterator<Item = Square>>(iter: T) -> Self {
        iter.into_iter().fold(Self::EMPTY_BOARD, |bb, sq| bb | sq)
    }
}

impl fmt::UpperHex for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018X}", self.0)
    }
}

impl fmt::Display for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            for file in File::iter() {
                let occupant = if self.intersects(Square::new(file, rank)) {
                    'X'
                } else {
                    '.'
                };
                write!(f, "{occupant} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bitboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:X}")
    }
}

/// An iterator over all set bits in a [`Bitboard`].
///
/// See [`Bitboard::iter`].
pub struct BitboardIter {
    bitboard: Bitboard,
}

impl Iterator for BitboardIter {
    type Item = Square;
    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        self.bitboard.pop_lsb()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.bitboard.population() as usize;
        (size, Some(size))
    }
}

impl ExactSizeIterator for BitboardIter {}

impl IntoIterator for Bitboard {
    type Item = Square;
    type IntoIter = BitboardIter;
    #[inline(always)]
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An iterator over all subsets of a [`Bitboard`], used to fill the magic attack tables.
///
/// See [`Bitboard::subsets`].
pub struct BitboardSubsetIter {
    /// The set whose subsets are enumerated.
    mask: Bitboard,

    /// The subset yielded by the next call to `.next()`.
    subset: Bitboard,

    /// Subsets left to yield; `2^population` initially.
    remaining: usize,
}

impl Iterator for BitboardSubsetIter {
    type Item = Bitboard;
    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let subset = self.subset;

        // Carry-Rippler: https://www.chessprogramming.org/Traversing_Subsets_of_a_Set#All_Subsets_of_any_Set
        self.subset.0 = self.subset.0.wrapping_sub(self.mask.0) & self.mask.0;
        self.remaining -= 1;

        Some(subset)
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for BitboardSubsetIter {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitboard_to_string() {
        let board = Bitboard::RANK_2 | Square::A1;
        let expected = ". . . . . . . . \n\
                        . . . . . . . . \n\
                        . . . . . . . . \n\
                        . . . . . . . . \n\
                        . . . . . . . . \n\
                        . . . . . . . . \n\
                        X X X X X X X X \n\
                        X . . . . . . . \n";
        assert_eq!(board.to_string(), expected);
    }

    #[test]
    fn test_subsets_are_unique_and_complete() {
        let mask = Bitboard::new(0x0000_0010_0804_0200);
        let mut seen = std::collections::HashSet::new();
        for subset in mask.subsets() {
            assert_eq!(subset & !mask, Bitboard::EMPTY_BOARD);
            assert!(seen.insert(subset), "{subset:?} visited twice");
        }
        assert_eq!(seen.len(), 1 << mask.population());
    }

    #[test]
    fn test_shifts_do_not_wrap_files() {
        assert_eq!(Bitboard::FILE_H.east(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::FILE_A.west(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::RANK_8.north(), Bitboard::EMPTY_BOARD);
        assert_eq!(Bitboard::RANK_2.south(), Bitboard::RANK_1);
        assert_eq!(Bitboard::RANK_7.flipped(), Bitboard::RANK_2);
    }
}
