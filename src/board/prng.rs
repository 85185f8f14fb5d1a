/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Fixed starting state, so every build produces the same Zobrist keys.
const DEFAULT_STATE: [u64; 4] = [
    0x91C5_AB3C_EBFD_5A71,
    0x06BA_253B_9DD8_97CD,
    0x8015_B5E5_9CC2_75E9,
    0xF8F4_27FC_5411_DE53,
];

/// A `const`-friendly [xoshiro256**](https://prng.di.unimi.it/xoshiro256starstar.c) generator.
///
/// Each step consumes the generator and hands back its successor, which lets tables of random
/// keys be filled inside a `const fn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Xoshiro256([u64; 4]);

impl Xoshiro256 {
    #[inline(always)]
    pub const fn new() -> Self {
        Self(DEFAULT_STATE)
    }

    /// Starts from a caller-chosen state. The state must not be all zeros.
    #[inline(always)]
    pub const fn with_state(state: [u64; 4]) -> Self {
        Self(state)
    }

    /// Returns the next number in the sequence along with the advanced generator.
    ///
    /// # Example
    /// ```
    /// # use kestrel::Xoshiro256;
    /// let (a, rng) = Xoshiro256::new().next();
    /// let (b, _) = rng.next();
    /// assert_ne!(a, b);
    /// ```
    #[inline(always)]
    pub const fn next(self) -> (u64, Self) {
        let mut s = self.0;
        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = s[1] << 17;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];
        s[2] ^= t;
        s[3] = s[3].rotate_left(45);

        (result, Self(s))
    }
}

impl Default for Xoshiro256 {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}
