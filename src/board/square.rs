/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut},
    str::FromStr,
};

use anyhow::{anyhow, bail, Result};

use super::{Bitboard, Color};

/// Represents a single square on an `8x8` chess board.
///
/// Uses [Little-Endian Rank-File Mapping](https://www.chessprogramming.org/Square_Mapping_Considerations#Little-Endian_Rank-File_Mapping),
/// so `square = file + rank * 8`:
/// ```text
/// 8| 56 57 58 59 60 61 62 63
/// 7| 48 49 50 51 52 53 54 55
/// 6| 40 41 42 43 44 45 46 47
/// 5| 32 33 34 35 36 37 38 39
/// 4| 24 25 26 27 28 29 30 31
/// 3| 16 17 18 19 20 21 22 23
/// 2|  8  9 10 11 12 13 14 15
/// 1|  0  1  2  3  4  5  6  7
///  +------------------------
///    a  b  c  d  e  f  g  h
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Square(pub(crate) u8);

impl Square {
    pub const A1: Self = Self(0);
    pub const B1: Self = Self(1);
    pub const C1: Self = Self(2);
    pub const D1: Self = Self(3);
    pub const E1: Self = Self(4);
    pub const F1: Self = Self(5);
    pub const G1: Self = Self(6);
    pub const H1: Self = Self(7);

    pub const A8: Self = Self(56);
    pub const B8: Self = Self(57);
    pub const C8: Self = Self(58);
    pub const D8: Self = Self(59);
    pub const E8: Self = Self(60);
    pub const F8: Self = Self(61);
    pub const G8: Self = Self(62);
    pub const H8: Self = Self(63);

    pub const COUNT: usize = 64;

    /// An iterator over all squares, from A1 to H8.
    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (0..Self::COUNT as u8).map(Self)
    }

    /// Creates a new [`Square`] from a [`File`] and a [`Rank`].
    ///
    /// # Example
    /// ```
    /// # use kestrel::{File, Rank, Square};
    /// assert_eq!(Square::new(File::E, Rank::ONE), Square::E1);
    /// ```
    #[inline(always)]
    pub const fn new(file: File, rank: Rank) -> Self {
        Self(rank.0 << 3 | file.0)
    }

    /// Creates a [`Square`] from an index in `[0, 63]`.
    #[inline(always)]
    pub fn from_index(index: usize) -> Result<Self> {
        if index < Self::COUNT {
            Ok(Self(index as u8))
        } else {
            bail!("Invalid index for Square: Index must be between [0,63]. Got {index}.")
        }
    }

    /// Creates a [`Square`] from an index without bounds checking.
    ///
    /// # Panics
    /// If `index` is greater than `63` and debug assertions are enabled.
    #[inline(always)]
    pub const fn from_index_unchecked(index: usize) -> Self {
        debug_assert!(index < Self::COUNT, "Square index out of bounds");
        Self(index as u8)
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn file(&self) -> File {
        File(self.0 & 7)
    }

    #[inline(always)]
    pub const fn rank(&self) -> Rank {
        Rank(self.0 >> 3)
    }

    /// Mirrors this square vertically (`e2` becomes `e7`).
    ///
    /// # Example
    /// ```
    /// # use kestrel::Square;
    /// assert_eq!(Square::A1.flipped(), Square::A8);
    /// assert_eq!(Square::H8.flipped(), Square::H1);
    /// ```
    #[inline(always)]
    pub const fn flipped(self) -> Self {
        Self(self.0 ^ 56)
    }

    /// Returns this square as seen by `color`; flipped for Black, unchanged for White.
    #[inline(always)]
    pub const fn relative_to(self, color: Color) -> Self {
        match color {
            Color::White => self,
            Color::Black => self.flipped(),
        }
    }

    /// Returns the square `file_delta` files and `rank_delta` ranks away, if it is on the board.
    ///
    /// # Example
    /// ```
    /// # use kestrel::Square;
    /// assert_eq!(Square::A1.offset(1, 0), Some(Square::B1));
    /// assert_eq!(Square::A1.offset(-1, 0), None);
    /// ```
    #[inline(always)]
    pub const fn offset(&self, file_delta: i8, rank_delta: i8) -> Option<Self> {
        let file = self.file().0 as i8 + file_delta;
        let rank = self.rank().0 as i8 + rank_delta;

        if file < 0 || file > 7 || rank < 0 || rank > 7 {
            None
        } else {
            Some(Self((rank * 8 + file) as u8))
        }
    }

    #[inline(always)]
    pub const fn bitboard(&self) -> Bitboard {
        Bitboard::from_square(*self)
    }

    /// Parses a square in algebraic notation, such as `e4`.
    pub fn from_uci(square: &str) -> Result<Self> {
        let mut chars = square.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            bail!("Invalid square {square:?}: Squares must be exactly two characters, like \"e4\"");
        };

        Ok(Self::new(File::from_char(file)?, Rank::from_char(rank)?))
    }

    pub fn to_uci(self) -> String {
        format!("{}{}", self.file(), self.rank())
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;
    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl<T> Index<Square> for [T; Square::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Square) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<Square> for [T; Square::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Square) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({})", self.0)
    }
}

/// A column of the board, `a` through `h`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Debug)]
#[repr(transparent)]
pub struct File(pub(crate) u8);

impl File {
    pub const A: Self = Self(0);
    pub const B: Self = Self(1);
    pub const C: Self = Self(2);
    pub const D: Self = Self(3);
    pub const E: Self = Self(4);
    pub const F: Self = Self(5);
    pub const G: Self = Self(6);
    pub const H: Self = Self(7);

    pub const COUNT: usize = 8;

    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (0..Self::COUNT as u8).map(Self)
    }

    pub fn from_char(file: char) -> Result<Self> {
        match file {
            'a'..='h' => Ok(Self(file as u8 - b'a')),
            'A'..='H' => Ok(Self(file as u8 - b'A')),
            _ => Err(anyhow!("Invalid char for File: Must be between [a,h]. Got {file:?}.")),
        }
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn char(&self) -> char {
        (b'a' + self.0) as char
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

/// A row of the board, `1` through `8`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Debug)]
#[repr(transparent)]
pub struct Rank(pub(crate) u8);

impl Rank {
    pub const ONE: Self = Self(0);
    pub const TWO: Self = Self(1);
    pub const THREE: Self = Self(2);
    pub const FOUR: Self = Self(3);
    pub const FIVE: Self = Self(4);
    pub const SIX: Self = Self(5);
    pub const SEVEN: Self = Self(6);
    pub const EIGHT: Self = Self(7);

    pub const COUNT: usize = 8;

    #[inline(always)]
    pub fn iter() -> impl ExactSizeIterator<Item = Self> + DoubleEndedIterator<Item = Self> {
        (0..Self::COUNT as u8).map(Self)
    }

    pub fn from_char(rank: char) -> Result<Self> {
        match rank {
            '1'..='8' => Ok(Self(rank as u8 - b'1')),
            _ => Err(anyhow!("Invalid char for Rank: Must be between [1,8]. Got {rank:?}.")),
        }
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline(always)]
    pub const fn char(&self) -> char {
        (b'1' + self.0) as char
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_uci_roundtrip() {
        for square in Square::iter() {
            assert_eq!(Square::from_uci(&square.to_uci()).unwrap(), square);
        }
        assert!(Square::from_uci("i1").is_err());
        assert!(Square::from_uci("a9").is_err());
        assert!(Square::from_uci("a").is_err());
        assert!(Square::from_uci("a1a").is_err());
    }

    #[test]
    fn test_square_offset_stays_on_board() {
        assert_eq!(Square::H1.offset(1, 0), None);
        assert_eq!(Square::H8.offset(0, 1), None);
        assert_eq!(Square::E1.offset(0, 7), Some(Square::E8));
        assert_eq!(Square::D1.offset(-3, 7), Some(Square::A8));
    }
}
