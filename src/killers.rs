/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{tune, Move, MAX_DEPTH};

const SLOTS: usize = tune::killers_per_depth!();

/// Remembers the quiet moves that most recently caused a beta cutoff at each remaining depth.
///
/// See [Killer Heuristic](https://www.chessprogramming.org/Killer_Heuristic). Killers only ever
/// affect move ordering, never the score of a search.
#[derive(Debug, Clone)]
pub struct KillerTable(Box<[[Move; SLOTS]; MAX_DEPTH as usize + 1]>);

impl KillerTable {
    /// Clear the killer table, forgetting every recorded move.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.0.iter_mut().for_each(|slots| *slots = [Move::NULL; SLOTS]);
    }

    /// Records `mv` as the newest killer at `depth`, pushing older killers down a slot.
    ///
    /// Null moves and moves already stored at `depth` are ignored, so the slots never hold duplicates.
    #[inline(always)]
    pub fn record_cutoff(&mut self, mv: Move, depth: u8) {
        let Some(slots) = self.0.get_mut(depth as usize) else {
            return;
        };

        if mv.is_null() || slots.contains(&mv) {
            return;
        }

        slots.rotate_right(1);
        slots[0] = mv;
    }

    /// Returns `true` if `mv` is one of the killers stored at `depth`.
    #[inline(always)]
    pub fn is_killer(&self, mv: Move, depth: u8) -> bool {
        !mv.is_null()
            && self
                .0
                .get(depth as usize)
                .is_some_and(|slots| slots.contains(&mv))
    }

    /// The killers stored at `depth`, newest first. Unused slots hold [`Move::NULL`].
    #[inline(always)]
    pub fn killers(&self, depth: u8) -> [Move; SLOTS] {
        self.0
            .get(depth as usize)
            .copied()
            .unwrap_or([Move::NULL; SLOTS])
    }
}

impl Default for KillerTable {
    #[inline(always)]
    fn default() -> Self {
        Self(Box::new([[Move::NULL; SLOTS]; MAX_DEPTH as usize + 1]))
    }
}

impl fmt::Display for KillerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, slots) in self.0.iter().enumerate() {
            if slots.iter().all(Move::is_null) {
                continue;
            }

            write!(f, "{depth:>3}:")?;
            for mv in slots.iter().filter(|mv| !mv.is_null()) {
                write!(f, " {mv}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
