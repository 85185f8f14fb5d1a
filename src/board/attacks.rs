/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::{Bitboard, Color, Square};

const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (1, -2),
    (2, 1),
    (2, -1),
    (-1, 2),
    (-1, -2),
    (-2, 1),
    (-2, -1),
];

const KING_DELTAS: [(i8, i8); 8] = [
    (1, 0),
    (0, -1),
    (-1, 0),
    (0, 1),
    (1, 1),
    (1, -1),
    (-1, -1),
    (-1, 1),
];

const WHITE_PAWN_DELTAS: [(i8, i8); 2] = [(1, 1), (-1, 1)];
const BLACK_PAWN_DELTAS: [(i8, i8); 2] = [(1, -1), (-1, -1)];

const KNIGHT_ATTACKS: [Bitboard; Square::COUNT] = leaper_attacks(&KNIGHT_DELTAS);
const KING_ATTACKS: [Bitboard; Square::COUNT] = leaper_attacks(&KING_DELTAS);
const PAWN_ATTACKS: [[Bitboard; Square::COUNT]; Color::COUNT] = [
    leaper_attacks(&WHITE_PAWN_DELTAS),
    leaper_attacks(&BLACK_PAWN_DELTAS),
];

/// Squares a knight on `square` attacks.
///
/// # Example
/// ```
/// # use kestrel::{knight_attacks, Square};
/// assert_eq!(knight_attacks(Square::A1).population(), 2);
/// ```
#[inline(always)]
pub const fn knight_attacks(square: Square) -> Bitboard {
    KNIGHT_ATTACKS[square.index()]
}

/// Squares a king on `square` attacks.
#[inline(always)]
pub const fn king_attacks(square: Square) -> Bitboard {
    KING_ATTACKS[square.index()]
}

/// Squares a `color` pawn on `square` attacks. Pushes are not attacks.
#[inline(always)]
pub const fn pawn_attacks(square: Square, color: Color) -> Bitboard {
    PAWN_ATTACKS[color.index()][square.index()]
}

/// Builds the attack table of a piece that jumps by a fixed set of `(file, rank)` deltas.
const fn leaper_attacks(deltas: &[(i8, i8)]) -> [Bitboard; Square::COUNT] {
    let mut table = [Bitboard::EMPTY_BOARD; Square::COUNT];

    let mut i = 0;
    while i < Square::COUNT {
        let square = Square::from_index_unchecked(i);
        let mut reachable = 0;

        let mut j = 0;
        while j < deltas.len() {
            let (df, dr) = deltas[j];
            if let Some(target) = square.offset(df, dr) {
                reachable |= target.bitboard().inner();
            }
            j += 1;
        }

        table[i] = Bitboard::new(reachable);
        i += 1;
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaper_counts() {
        let d4 = Square::from_uci("d4").unwrap();
        assert_eq!(knight_attacks(d4).population(), 8);
        assert_eq!(king_attacks(d4).population(), 8);
        assert_eq!(king_attacks(Square::H8).population(), 3);
        assert_eq!(knight_attacks(Square::H1).population(), 2);
    }

    #[test]
    fn test_pawn_attacks_point_forward() {
        let e4 = Square::from_uci("e4").unwrap();
        let expected: Bitboard = ["d5", "f5"].iter().map(|s| Square::from_uci(s).unwrap()).collect();
        assert_eq!(pawn_attacks(e4, Color::White), expected);

        // Edge files only attack inward
        assert_eq!(pawn_attacks(Square::A8.offset(0, -1).unwrap(), Color::Black).population(), 1);
        // Nothing beyond the last rank
        assert!(pawn_attacks(Square::E8, Color::White).is_empty());
    }
}
