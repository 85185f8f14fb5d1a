/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Plies removed from the remaining depth when searching a null move.
macro_rules! nmp_reduction {
    () => {
        2
    };
}
pub(crate) use nmp_reduction;

/// Minimum remaining depth at which null move pruning may be tried.
///
/// Must be at least `nmp_reduction!()`, so the null search never starts below depth 0.
macro_rules! min_nmp_depth {
    () => {
        2
    };
}
pub(crate) use min_nmp_depth;

/// Killer moves remembered per depth.
macro_rules! killers_per_depth {
    () => {
        2
    };
}
pub(crate) use killers_per_depth;

/// Halfmove clock value at which the fifty-move rule declares a draw.
macro_rules! fifty_move_limit {
    () => {
        100
    };
}
pub(crate) use fifty_move_limit;

/// Depth searched when none is given.
macro_rules! default_depth {
    () => {
        6
    };
}
pub(crate) use default_depth;

/// Depth used by the `bench` command.
macro_rules! bench_depth {
    () => {
        5
    };
}
pub(crate) use bench_depth;
