/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{Board, CastlingRights, Color, Piece, Square, Xoshiro256};

/// Keys for every hashed feature of a position, generated at compile time.
const KEYS: ZobristKeys = ZobristKeys::new();

/// A [Zobrist hash](https://www.chessprogramming.org/Zobrist_Hashing) of a position.
///
/// Every feature of a position owns a random key, and the hash is the XOR of the keys of the
/// features present. Adding and removing a feature are therefore the same operation, which is what
/// lets [`Board::apply`] and the null move maintain the hash incrementally.
#[derive(Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct ZobristKey(u64);

impl ZobristKey {
    /// Hashes a position from scratch.
    pub fn from_parts(
        board: &Board,
        side: Color,
        castling: CastlingRights,
        ep_square: Option<Square>,
    ) -> Self {
        let mut key = Self::default();

        for (square, piece) in board.iter() {
            key.hash_piece(square, piece);
        }
        if let Some(ep) = ep_square {
            key.hash_ep_square(ep);
        }
        key.hash_castling(castling);
        key.hash_side_to_move(side);

        key
    }

    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Toggles `piece` on `square`.
    #[inline(always)]
    pub fn hash_piece(&mut self, square: Square, piece: Piece) {
        self.0 ^= KEYS.pieces[square][piece.index()];
    }

    /// Toggles the en passant target `square`.
    ///
    /// Only squares on the third and sixth ranks have keys; any other square leaves the hash unchanged.
    #[inline(always)]
    pub fn hash_ep_square(&mut self, square: Square) {
        self.0 ^= KEYS.en_passant[square];
    }

    /// Toggles a whole set of castling rights.
    ///
    /// To change rights, hash out the old set and hash in the new one.
    #[inline(always)]
    pub fn hash_castling(&mut self, rights: CastlingRights) {
        self.0 ^= KEYS.castling[rights.index()];
    }

    /// Toggles the side-to-move key when `color` is Black. White contributes nothing.
    ///
    /// # Example
    /// ```
    /// # use kestrel::{Color, ZobristKey};
    /// let mut key = ZobristKey::default();
    /// key.hash_side_to_move(Color::White);
    /// assert_eq!(key, ZobristKey::default());
    ///
    /// key.hash_side_to_move(Color::Black);
    /// assert_ne!(key, ZobristKey::default());
    /// ```
    #[inline(always)]
    pub fn hash_side_to_move(&mut self, color: Color) {
        self.0 ^= KEYS.side[color];
    }

    /// Flips the side to move in the hash.
    ///
    /// Since only Black has a key, this is the same regardless of which side was to move.
    #[inline(always)]
    pub fn toggle_side(&mut self) {
        self.hash_side_to_move(Color::Black);
    }
}

impl fmt::Display for ZobristKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

struct ZobristKeys {
    pieces: [[u64; Piece::COUNT]; Square::COUNT],
    en_passant: [u64; Square::COUNT],
    castling: [u64; CastlingRights::COUNT],
    side: [u64; Color::COUNT],
}

impl ZobristKeys {
    const fn new() -> Self {
        let mut pieces = [[0; Piece::COUNT]; Square::COUNT];
        let mut en_passant = [0; Square::COUNT];
        let mut castling = [0; CastlingRights::COUNT];
        let mut side = [0; Color::COUNT];

        let mut rng = Xoshiro256::new();
        let mut key;

        let mut sq = 0;
        while sq < Square::COUNT {
            let mut piece = 0;
            while piece < Piece::COUNT {
                (key, rng) = rng.next();
                pieces[sq][piece] = key;
                piece += 1;
            }

            // En passant targets only ever sit on the third or sixth rank
            let rank = sq / 8;
            if rank == 2 || rank == 5 {
                (key, rng) = rng.next();
                en_passant[sq] = key;
            }

            sq += 1;
        }

        let mut i = 0;
        while i < CastlingRights::COUNT {
            (key, rng) = rng.next();
            castling[i] = key;
            i += 1;
        }

        (key, _) = rng.next();
        side[Color::Black.index()] = key;

        Self {
            pieces,
            en_passant,
            castling,
            side,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PieceKind;

    #[test]
    fn test_piece_keys_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for square in Square::iter() {
            for color in Color::all() {
                for kind in PieceKind::all() {
                    let mut key = ZobristKey::default();
                    key.hash_piece(square, Piece::new(color, kind));
                    assert!(seen.insert(key));
                }
            }
        }
    }

    #[test]
    fn test_hashing_twice_cancels_out() {
        let mut key = ZobristKey::default();
        key.hash_castling(CastlingRights::ALL);
        key.hash_ep_square(Square::from_uci("e3").unwrap());
        key.toggle_side();
        assert_ne!(key, ZobristKey::default());

        key.toggle_side();
        key.hash_ep_square(Square::from_uci("e3").unwrap());
        key.hash_castling(CastlingRights::ALL);
        assert_eq!(key, ZobristKey::default());
    }

    #[test]
    fn test_only_ep_ranks_have_keys() {
        let mut key = ZobristKey::default();
        key.hash_ep_square(Square::from_uci("e4").unwrap());
        assert_eq!(key, ZobristKey::default());
        key.hash_ep_square(Square::from_uci("d6").unwrap());
        assert_ne!(key, ZobristKey::default());
    }
}
