/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Move, MoveScore, Score, SearchBounds, ZobristKey};

/// Number of bytes in a megabyte
const BYTES_IN_MB: usize = 1024 * 1024;

/// How a stored score relates to the true minimax value of its position.
///
/// See [CPW](https://www.chessprogramming.org/Node_Types) for more.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum NodeType {
    /// The score is exact.
    Exact,

    /// The score caused a beta cutoff, so the true value is at least this high.
    Lower,

    /// The score never rose above alpha, so the true value is at most this high.
    Upper,
}

impl NodeType {
    /// Classifies `score` against the window the node was entered with:
    ///
    /// ```text
    /// if score <= alpha:
    ///     UPPER
    /// else if score >= beta:
    ///     LOWER
    /// else:
    ///     EXACT
    /// ```
    #[inline(always)]
    pub fn new(score: Score, bounds: SearchBounds) -> Self {
        if score <= bounds.alpha {
            Self::Upper
        } else if score >= bounds.beta {
            Self::Lower
        } else {
            Self::Exact
        }
    }
}

/// An entry into a hash table
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct TTableEntry {
    /// Key of the node this entry represents.
    pub key: ZobristKey,

    /// Depth at which the data for this entry was found.
    pub depth: u8,

    /// Best move found for this position.
    pub bestmove: Move,

    /// Best score found for this position.
    pub score: Score,

    /// Node type of this entry.
    pub node_type: NodeType,
}

impl TTableEntry {
    /// Creates a new [`TTableEntry`], classifying `result` against the window the node was *entered*
    /// with, before any tightening.
    #[inline(always)]
    pub fn new(key: ZobristKey, result: MoveScore, bounds: SearchBounds, depth: u8) -> Self {
        Self {
            key,
            depth,
            bestmove: result.mv,
            score: result.score,
            node_type: NodeType::new(result.score, bounds),
        }
    }

    /// The move and score of this entry.
    #[inline(always)]
    pub const fn result(&self) -> MoveScore {
        MoveScore::new(self.bestmove, self.score)
    }
}

/// Transposition Table.
///
/// Used during a search to keep track of previous search results on positions,
/// avoiding unnecessary re-computations.
#[derive(Debug)]
pub struct TTable {
    /// Internal cache of the TTable. Its length is always a power of two.
    cache: Vec<Option<TTableEntry>>,

    /// Number of stores that replaced an entry for a different position since last clearing.
    pub(crate) collisions: usize,

    /// Number of probes since last clearing.
    pub(crate) accesses: usize,

    /// Number of probes that found a matching entry since last clearing.
    pub(crate) hits: usize,
}

impl TTable {
    /// Default size of the Transposition Table, in megabytes.
    pub const DEFAULT_SIZE: usize = 16;

    /// Minimum size of the Transposition Table, in megabytes.
    pub const MIN_SIZE: usize = 1;

    /// Maximum size of the Transposition Table, in megabytes.
    pub const MAX_SIZE: usize = 1_024;

    /// Create a new [`TTable`] that is at most `size` megabytes.
    ///
    /// `size` is clamped to `[MIN_SIZE, MAX_SIZE]`.
    #[inline(always)]
    pub fn new(size: usize) -> Self {
        let size = size.clamp(Self::MIN_SIZE, Self::MAX_SIZE);
        Self::from_capacity((size * BYTES_IN_MB) / size_of::<Option<TTableEntry>>())
    }

    /// Create a new [`TTable`] that can hold up to `capacity` entries.
    ///
    /// The capacity is rounded down to a power of two (and is at least one).
    #[inline(always)]
    pub fn from_capacity(capacity: usize) -> Self {
        let capacity = match capacity {
            0 => 1,
            n if n.is_power_of_two() => n,
            n => n.next_power_of_two() >> 1,
        };

        Self {
            cache: vec![None; capacity],
            collisions: 0,
            accesses: 0,
            hits: 0,
        }
    }

    /// Clears the entries of this [`TTable`].
    #[inline(always)]
    pub fn clear(&mut self) {
        self.cache.iter_mut().for_each(|entry| *entry = None);
        self.collisions = 0;
        self.accesses = 0;
        self.hits = 0;
    }

    /// Returns the number of entries that can fit within this [`TTable`]
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.cache.len()
    }

    /// Returns the size of this [`TTable`], in megabytes.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.cache.len() * size_of::<Option<TTableEntry>>() / BYTES_IN_MB
    }

    /// Returns the number of `Some` entries in this [`TTable`].
    #[inline(always)]
    pub fn num_entries(&self) -> usize {
        self.cache.iter().filter(|entry| entry.is_some()).count()
    }

    /// Fill rate in permille, as reported by UCI's `hashfull`.
    #[inline(always)]
    pub fn hashfull(&self) -> usize {
        self.num_entries() * 1000 / self.capacity()
    }

    /// Number of probes that found a matching entry since the last [`TTable::clear`].
    #[inline(always)]
    pub const fn hits(&self) -> usize {
        self.hits
    }

    /// Number of probes since the last [`TTable::clear`].
    #[inline(always)]
    pub const fn accesses(&self) -> usize {
        self.accesses
    }

    /// Number of stores that evicted another position since the last [`TTable::clear`].
    #[inline(always)]
    pub const fn collisions(&self) -> usize {
        self.collisions
    }

    /// Map `key` to an index into this [`TTable`].
    #[inline(always)]
    pub fn index(&self, key: &ZobristKey) -> usize {
        key.inner() as usize & (self.capacity() - 1)
    }

    /// Get the entry if and only if it matches the provided key
    #[inline(always)]
    pub fn get(&self, key: &ZobristKey) -> Option<&TTableEntry> {
        self.entry(key).filter(|e| &e.key == key)
    }

    /// Like [`TTable::get`], but counts towards the table's hit statistics.
    #[inline(always)]
    pub fn probe(&mut self, key: &ZobristKey) -> Option<&TTableEntry> {
        self.accesses += 1;
        let index = self.index(key);
        let entry = self.cache[index].as_ref().filter(|e| &e.key == key);
        if entry.is_some() {
            self.hits += 1;
        }
        entry
    }

    /// Get the entry, without regards for whether it matches the provided key
    #[inline(always)]
    fn entry(&self, key: &ZobristKey) -> Option<&TTableEntry> {
        // Indexing is safe as the capacity is always at least one
        self.cache[self.index(key)].as_ref()
    }

    /// Store `entry` in the table at `entry.key`, overriding and returning whatever was there.
    #[inline(always)]
    pub fn store(&mut self, entry: TTableEntry) -> Option<TTableEntry> {
        let index = self.index(&entry.key);
        let old = self.cache[index].replace(entry);
        if old.is_some_and(|old| old.key != entry.key) {
            self.collisions += 1;
        }
        old
    }
}

impl Default for TTable {
    #[inline(always)]
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}
