/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, sync::OnceLock};

use anyhow::{bail, Result};

use super::{Bitboard, PieceKind, Square};

/// Diagonal directions, as `(file, rank)` deltas.
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Orthogonal directions, as `(file, rank)` deltas.
const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Total number of slots in the minimized bishop tables.
pub const BISHOP_TABLE_SIZE: usize = 5_248;

/// Total number of slots in the minimized rook tables.
pub const ROOK_TABLE_SIZE: usize = 102_400;

/// Process-wide tables, built by the first call to [`initialize`].
static MAGICS: OnceLock<MagicTables> = OnceLock::new();

/// Builds the process-wide [`MagicTables`] if they do not exist yet, and returns them.
///
/// Calling this more than once is cheap and always yields the same tables.
/// Fails if any magic constant maps two occupancies with different attack sets to the same slot;
/// callers must treat that as fatal, since the tables would otherwise answer queries incorrectly.
///
/// # Example
/// ```
/// # use kestrel::magic;
/// let first = magic::initialize().unwrap();
/// let second = magic::initialize().unwrap();
/// assert!(std::ptr::eq(first, second));
/// ```
pub fn initialize() -> Result<&'static MagicTables> {
    if let Some(tables) = MAGICS.get() {
        return Ok(tables);
    }

    let tables = MagicTables::new()?;
    log::debug!(
        "Initialized magic tables: {} bishop + {} rook slots",
        BISHOP_TABLE_SIZE,
        ROOK_TABLE_SIZE
    );

    Ok(MAGICS.get_or_init(|| tables))
}

/// Hashing parameters for one slider on one square.
///
/// See [Magic Bitboards](https://www.chessprogramming.org/Magic_Bitboards) for the scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MagicEntry {
    /// Squares whose occupancy can change the attacks from this square.
    pub mask: Bitboard,

    /// Multiplier that perfectly hashes every subset of `mask`.
    pub magic: u64,

    /// Right shift applied after multiplying; `64 - shift` is the number of index bits.
    pub shift: u8,

    /// Start of this square's slots in the shared attack table.
    pub offset: usize,
}

impl MagicEntry {
    /// Slot of the attack set for `occupancy`, which may contain any squares.
    #[inline(always)]
    pub const fn index(&self, occupancy: Bitboard) -> usize {
        self.index_nomask(Bitboard(occupancy.0 & self.mask.0))
    }

    /// Slot of the attack set for `masked`, which must already be restricted to [`MagicEntry::mask`].
    #[inline(always)]
    pub const fn index_nomask(&self, masked: Bitboard) -> usize {
        self.offset + (masked.0.wrapping_mul(self.magic) >> self.shift) as usize
    }

    /// Number of slots this square owns: one per subset of its mask.
    #[inline(always)]
    pub const fn slots(&self) -> usize {
        1 << (64 - self.shift)
    }
}

/// Constant-time attack lookup for bishops, rooks and queens.
///
/// Both sliders share one backing table. Each square owns exactly as many slots as its relevance
/// mask has subsets, starting at [`MagicEntry::offset`]. Once built, the tables are never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct MagicTables {
    bishops: [MagicEntry; Square::COUNT],
    rooks: [MagicEntry; Square::COUNT],
    attacks: Vec<Bitboard>,
}

impl MagicTables {
    /// Builds the tables from the built-in magic constants.
    ///
    /// Every subset of every relevance mask is enumerated, ray-cast, hashed, and stored. An error is
    /// returned if a slot would have to hold two different attack sets.
    pub fn new() -> Result<Self> {
        let mut attacks = Vec::with_capacity(BISHOP_TABLE_SIZE + ROOK_TABLE_SIZE);

        let bishops = fill_tables(PieceKind::Bishop, &BISHOP_MAGICS, &mut attacks)?;
        let rooks = fill_tables(PieceKind::Rook, &ROOK_MAGICS, &mut attacks)?;

        Ok(Self {
            bishops,
            rooks,
            attacks,
        })
    }

    /// Hashing parameters of `kind` on `square`.
    ///
    /// Queens have no entry of their own; `kind` must be a bishop or a rook, anything else is treated as a rook.
    #[inline(always)]
    pub fn entry(&self, kind: PieceKind, square: Square) -> &MagicEntry {
        match kind {
            PieceKind::Bishop => &self.bishops[square],
            _ => &self.rooks[square],
        }
    }

    /// Squares attacked by a bishop on `square`, given every occupied square in `occupancy`.
    ///
    /// # Example
    /// ```
    /// # use kestrel::{magic, Bitboard, Square};
    /// let magics = magic::initialize().unwrap();
    /// let blocker = Bitboard::from_square("c3".parse().unwrap());
    /// let attacks = magics.bishop(Square::A1, blocker);
    /// assert_eq!(attacks.population(), 2); // b2 and the blocker on c3
    /// ```
    #[inline(always)]
    pub fn bishop(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        self.lookup(self.bishops[square].index(occupancy))
    }

    /// Squares attacked by a rook on `square`, given every occupied square in `occupancy`.
    #[inline(always)]
    pub fn rook(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        self.lookup(self.rooks[square].index(occupancy))
    }

    /// Union of the bishop and rook attacks from `square`.
    #[inline(always)]
    pub fn queen(&self, square: Square, occupancy: Bitboard) -> Bitboard {
        self.bishop(square, occupancy) | self.rook(square, occupancy)
    }

    /// Like [`MagicTables::bishop`], but `masked` must already be intersected with the bishop mask of `square`.
    #[inline(always)]
    pub fn bishop_nomask(&self, square: Square, masked: Bitboard) -> Bitboard {
        self.lookup(self.bishops[square].index_nomask(masked))
    }

    /// Like [`MagicTables::rook`], but `masked` must already be intersected with the rook mask of `square`.
    #[inline(always)]
    pub fn rook_nomask(&self, square: Square, masked: Bitboard) -> Bitboard {
        self.lookup(self.rooks[square].index_nomask(masked))
    }

    /// Attacks of a sliding piece of `kind` on `square`.
    ///
    /// Non-sliding kinds attack nothing through this lookup and yield an empty set.
    #[inline(always)]
    pub fn attacks(&self, kind: PieceKind, square: Square, occupancy: Bitboard) -> Bitboard {
        match kind {
            PieceKind::Bishop => self.bishop(square, occupancy),
            PieceKind::Rook => self.rook(square, occupancy),
            PieceKind::Queen => self.queen(square, occupancy),
            _ => Bitboard::EMPTY_BOARD,
        }
    }

    /// Number of slots in the shared attack table.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.attacks.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty()
    }

    #[inline(always)]
    fn lookup(&self, index: usize) -> Bitboard {
        debug_assert!(index < self.attacks.len());
        // Safety: `index = offset + (x >> shift)` with `x >> shift < slots()` for every `u64` input,
        // and construction reserved `slots()` entries after every `offset`.
        unsafe { *self.attacks.get_unchecked(index) }
    }
}

impl fmt::Debug for MagicTables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MagicTables")
            .field("slots", &self.attacks.len())
            .finish_non_exhaustive()
    }
}

/// Fills the slots of all 64 squares for `kind`, appending them to `attacks`.
fn fill_tables(
    kind: PieceKind,
    magics: &[u64; Square::COUNT],
    attacks: &mut Vec<Bitboard>,
) -> Result<[MagicEntry; Square::COUNT]> {
    let mut entries = [MagicEntry::default(); Square::COUNT];

    for square in Square::iter() {
        let mask = relevance_mask(kind, square);
        let entry = MagicEntry {
            mask,
            magic: magics[square],
            shift: 64 - mask.population(),
            offset: attacks.len(),
        };

        let mut slots: Vec<Option<Bitboard>> = vec![None; entry.slots()];

        for subset in mask.subsets() {
            let expected = sliding_attacks(kind, square, subset);
            let slot = entry.index_nomask(subset) - entry.offset;

            match slots[slot] {
                Some(stored) if stored != expected => bail!(
                    "Magic {:#018X} for {} on {square} maps occupancy {subset:?} onto slot {slot}, \
                    which already holds a different attack set",
                    entry.magic,
                    kind.name()
                ),
                _ => slots[slot] = Some(expected),
            }
        }

        // Slots no subset hashes to are unreachable; they hold an empty set.
        attacks.extend(slots.into_iter().map(Option::unwrap_or_default));
        entries[square] = entry;
    }

    Ok(entries)
}

/// Squares whose occupancy affects the attacks of `kind` on `square`.
///
/// This is every square on the piece's rays except the last one in each direction,
/// since a piece on the edge of the board never blocks anything further.
pub fn relevance_mask(kind: PieceKind, square: Square) -> Bitboard {
    let mut mask = Bitboard::EMPTY_BOARD;

    for (df, dr) in directions(kind) {
        let mut current = square;
        while let Some(next) = current.offset(df, dr) {
            if next.offset(df, dr).is_none() {
                break;
            }
            mask |= next;
            current = next;
        }
    }

    mask
}

/// Computes the attacks of a bishop or rook on `square` by walking each ray until it leaves
/// the board or hits an occupied square. The blocking square is included.
///
/// Slow; used to build the tables and to check them.
pub fn sliding_attacks(kind: PieceKind, square: Square, occupancy: Bitboard) -> Bitboard {
    let mut attacks = Bitboard::EMPTY_BOARD;

    for (df, dr) in directions(kind) {
        let mut current = square;
        while let Some(next) = current.offset(df, dr) {
            attacks |= next;
            if occupancy.intersects(next) {
                break;
            }
            current = next;
        }
    }

    attacks
}

#[inline(always)]
fn directions(kind: PieceKind) -> [(i8, i8); 4] {
    match kind {
        PieceKind::Bishop => BISHOP_DIRECTIONS,
        _ => ROOK_DIRECTIONS,
    }
}

/// Bishop magics, indexed by square. Found offline; `shift = 64 - popcount(mask)` for each.
#[rustfmt::skip]
const BISHOP_MAGICS: [u64; Square::COUNT] = [
    0x0040440080810102, 0x004831011A0A001E, 0x206800840080A050, 0x0004040080008200,
    0x0008484011850200, 0x013C300828004800, 0x1000808818C12488, 0x4200809148200408,
    0x0000082098088100, 0x108002022C010200, 0x0000882800C08880, 0x0000AA4081008000,
    0x0200841C20802000, 0x0020020104204001, 0xC1000C01093050E1, 0x0600360342082440,
    0x001002090A080818, 0x0002180410021208, 0x4108000102040054, 0x1CC8000404208C02,
    0x0004001211200008, 0x2924084200920810, 0x0400A20404010815, 0x0380400200421808,
    0x1520082810100104, 0x0021380210901100, 0x6080820010041090, 0x0000480004021020,
    0x9000840022020202, 0x4024460013010302, 0x006204008200A208, 0x00618020010C0600,
    0x0026086020C42000, 0x0888029000028400, 0x00840201000800D0, 0x0420600800010104,
    0x0040010100004440, 0x6810245200104104, 0x0001220081062801, 0x030C61020000A081,
    0x8012C2082000C046, 0x0214240208000200, 0x1202820082084040, 0x0000202013020800,
    0x0840080100410407, 0x0005200283000082, 0x0044810204000200, 0x5810018091140281,
    0x000C140402184050, 0x8001118801084002, 0x0008003908080418, 0x408000406088008C,
    0x0410001002020118, 0x0014231622020088, 0x001020D181020060, 0x4220041340450100,
    0x4002008401411000, 0x2080010101108200, 0xAC49000020841000, 0x9040040113840401,
    0x0005010C40128A00, 0x0011801220090100, 0x00010428300C0080, 0xC028814408020021,
];

/// Rook magics, indexed by square. Found offline; `shift = 64 - popcount(mask)` for each.
#[rustfmt::skip]
const ROOK_MAGICS: [u64; Square::COUNT] = [
    0x4680002330804004, 0x0100106040008500, 0x0080200188100081, 0x208010000E802800,
    0x22000A0120045008, 0x6100040081002802, 0x0080020000801100, 0x118008688000C100,
    0x0040800A60814004, 0x3000808040002000, 0x0091007041002000, 0x2001000900201001,
    0xA001000500100800, 0x11020008A200300C, 0x0401006600210004, 0x8402000043042082,
    0x2004208002824002, 0x1196808040002000, 0x0030008020008131, 0x4900220042000810,
    0x1008010005001810, 0x4400808002000401, 0x802A010100040200, 0x0000220004440081,
    0x1804410100218000, 0x8400A00040045000, 0x062001C040300800, 0x1C01002100081000,
    0x080C008080080086, 0x10060002002490C8, 0x80D0080400020110, 0x0500800080004100,
    0x1408800443002302, 0x21A0003000C00140, 0x0000200088801000, 0x9212100080800800,
    0x000A002052001488, 0x0114810C00800200, 0x400200A302000804, 0x0401028042000504,
    0x6084822040108000, 0x0460008040008030, 0x8001001020050040, 0x0128005000818029,
    0x0111000408010010, 0x400100080401000E, 0x0B05000600090004, 0x1060010448820004,
    0x4080118040002080, 0x005000E001400140, 0x9880100020028080, 0x0400100008048180,
    0x024900101C080100, 0x8028040042008080, 0x2021100288010400, 0x8100144400930200,
    0x8800401025008009, 0x0050110200244086, 0x0400B02004400901, 0x0002600408100101,
    0x0022000820055002, 0x0192001001044802, 0x1089000400860001, 0x004100089020C201,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_sizes_are_minimal() {
        let tables = MagicTables::new().unwrap();
        assert_eq!(tables.len(), BISHOP_TABLE_SIZE + ROOK_TABLE_SIZE);

        let bishop_slots: usize = Square::iter()
            .map(|sq| tables.entry(PieceKind::Bishop, sq).slots())
            .sum();
        assert_eq!(bishop_slots, BISHOP_TABLE_SIZE);

        // Rook slots start right after the last bishop slot
        assert_eq!(
            tables.entry(PieceKind::Rook, Square::A1).offset,
            BISHOP_TABLE_SIZE
        );
    }

    #[test]
    fn test_relevance_masks() {
        // Corner rook: 6 squares on the file, 6 on the rank
        assert_eq!(relevance_mask(PieceKind::Rook, Square::A1).population(), 12);
        // Central bishop
        let d4 = Square::from_uci("d4").unwrap();
        assert_eq!(relevance_mask(PieceKind::Bishop, d4).population(), 9);
        // Masks never include the square itself
        for square in Square::iter() {
            assert!(!relevance_mask(PieceKind::Rook, square).intersects(square));
            assert!(!relevance_mask(PieceKind::Bishop, square).intersects(square));
        }
    }

    #[test]
    fn test_masked_and_unmasked_agree() {
        let tables = MagicTables::new().unwrap();
        let occupancy = Bitboard::new(0x0042_1800_2400_8100);

        for square in Square::iter() {
            let mask = tables.entry(PieceKind::Rook, square).mask;
            assert_eq!(
                tables.rook(square, occupancy),
                tables.rook_nomask(square, occupancy & mask)
            );

            let mask = tables.entry(PieceKind::Bishop, square).mask;
            assert_eq!(
                tables.bishop(square, occupancy),
                tables.bishop_nomask(square, occupancy & mask)
            );
        }
    }

    #[test]
    fn test_queen_is_union() {
        let tables = MagicTables::new().unwrap();
        let e4 = Square::from_uci("e4").unwrap();
        let occupancy = Bitboard::new(0x00FF_0000_0000_FF00);

        assert_eq!(
            tables.queen(e4, occupancy),
            sliding_attacks(PieceKind::Bishop, e4, occupancy)
                | sliding_attacks(PieceKind::Rook, e4, occupancy)
        );
        assert_eq!(
            tables.attacks(PieceKind::Knight, e4, occupancy),
            Bitboard::EMPTY_BOARD
        );
    }
}
