/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Index, IndexMut, Not},
};

use anyhow::{bail, Result};

/// Represents the color of a player or piece.
///
/// White moves first, and therefore [`Color`] defaults to [`Color::White`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    pub const COUNT: usize = 2;

    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [Self::White, Self::Black]
    }

    /// Returns the other color.
    ///
    /// # Example
    /// ```
    /// # use kestrel::Color;
    /// assert_eq!(Color::White.opponent(), Color::Black);
    /// assert_eq!(Color::Black.opponent(), Color::White);
    /// ```
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// `1` for White, `-1` for Black.
    ///
    /// Multiplying a White-relative score by this yields a score relative to `self`.
    #[inline(always)]
    pub const fn negation_multiplier(&self) -> i32 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }

    /// Parses the side-to-move field of a FEN string.
    pub fn from_uci(color: &str) -> Result<Self> {
        match color {
            "w" | "W" => Ok(Self::White),
            "b" | "B" => Ok(Self::Black),
            _ => bail!("Invalid color {color:?}: Must be either \"w\" or \"b\"."),
        }
    }

    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
        }
    }
}

impl Not for Color {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self::Output {
        self.opponent()
    }
}

impl<T> Index<Color> for [T; Color::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Color) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<Color> for [T; Color::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: Color) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// The kind (or "role") of a chess piece, without a color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const COUNT: usize = 6;

    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        use PieceKind::*;
        [Pawn, Knight, Bishop, Rook, Queen, King]
    }

    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Material value in centipawns, used for move ordering.
    #[inline(always)]
    pub const fn value(&self) -> i32 {
        match self {
            Self::Pawn => 100,
            Self::Knight => 320,
            Self::Bishop => 330,
            Self::Rook => 500,
            Self::Queen => 900,
            Self::King => 0, // King is invaluable, but 0 is easier to work with in computations
        }
    }

    pub fn from_uci(kind: char) -> Result<Self> {
        match kind {
            'P' | 'p' => Ok(Self::Pawn),
            'N' | 'n' => Ok(Self::Knight),
            'B' | 'b' => Ok(Self::Bishop),
            'R' | 'r' => Ok(Self::Rook),
            'Q' | 'q' => Ok(Self::Queen),
            'K' | 'k' => Ok(Self::King),
            _ => bail!("Invalid char for PieceKind: Got {kind:?}."),
        }
    }

    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }
}

impl<T> Index<PieceKind> for [T; PieceKind::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: PieceKind) -> &Self::Output {
        &self[index.index()]
    }
}

impl<T> IndexMut<PieceKind> for [T; PieceKind::COUNT] {
    #[inline(always)]
    fn index_mut(&mut self, index: PieceKind) -> &mut Self::Output {
        &mut self[index.index()]
    }
}

/// A chess piece: a [`PieceKind`] owned by a [`Color`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Piece {
    color: Color,
    kind: PieceKind,
}

impl Piece {
    pub const COUNT: usize = Color::COUNT * PieceKind::COUNT;

    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    #[inline(always)]
    pub const fn color(&self) -> Color {
        self.color
    }

    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Dense index in `[0, 12)`: White pieces first, then Black, each in [`PieceKind`] order.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.color.index() * PieceKind::COUNT + self.kind.index()
    }

    /// Returns a piece of the same kind, owned by the other color.
    #[inline(always)]
    pub const fn flipped(&self) -> Self {
        Self::new(self.color.opponent(), self.kind)
    }

    /// Parses a FEN piece character; uppercase is White.
    ///
    /// # Example
    /// ```
    /// # use kestrel::{Color, Piece, PieceKind};
    /// let piece = Piece::from_uci('n').unwrap();
    /// assert_eq!(piece, Piece::new(Color::Black, PieceKind::Knight));
    /// assert_eq!(piece.char(), 'n');
    /// ```
    pub fn from_uci(piece: char) -> Result<Self> {
        let kind = PieceKind::from_uci(piece)?;
        let color = if piece.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Ok(Self::new(color, kind))
    }

    #[inline(always)]
    pub const fn char(&self) -> char {
        let c = self.kind.to_uci();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

impl<T> Index<Piece> for [T; Piece::COUNT] {
    type Output = T;
    #[inline(always)]
    fn index(&self, index: Piece) -> &Self::Output {
        &self[index.index()]
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.char())
    }
}

impl fmt::Debug for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color.name(), self.kind.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_indices_are_dense() {
        let mut seen = [false; Piece::COUNT];
        for color in Color::all() {
            for kind in PieceKind::all() {
                let piece = Piece::new(color, kind);
                assert!(!seen[piece.index()]);
                seen[piece.index()] = true;
                assert_eq!(Piece::from_uci(piece.char()).unwrap(), piece);
            }
        }
        assert!(seen.iter().all(|s| *s));
    }
}
