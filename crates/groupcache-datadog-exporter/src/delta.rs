// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! Per-interval deltas between two snapshots of the same group.
//!
//! DogStatsD counts are increments, while groupcache counters only ever grow,
//! so every count metric is `current - previous`. Results are not clamped: a
//! counter that went backwards (cache restarted) yields a negative delta.

use crate::stats::{CacheCounters, GroupCounters};

/// A record whose fields are all monotonic counters.
pub trait CounterRecord: Copy + Default {
    /// Fieldwise `curr - prev`.
    fn delta(prev: &Self, curr: &Self) -> Self;
}

/// Fieldwise `curr - prev` for any counter record.
pub fn delta<T: CounterRecord>(prev: &T, curr: &T) -> T {
    T::delta(prev, curr)
}

impl CounterRecord for GroupCounters {
    fn delta(prev: &Self, curr: &Self) -> Self {
        GroupCounters {
            gets: curr.gets.wrapping_sub(prev.gets),
            hits: curr.hits.wrapping_sub(prev.hits),
            peer_loads: curr.peer_loads.wrapping_sub(prev.peer_loads),
            peer_errors: curr.peer_errors.wrapping_sub(prev.peer_errors),
            loads: curr.loads.wrapping_sub(prev.loads),
            loads_deduped: curr.loads_deduped.wrapping_sub(prev.loads_deduped),
            local_loads: curr.local_loads.wrapping_sub(prev.local_loads),
            local_load_errs: curr.local_load_errs.wrapping_sub(prev.local_load_errs),
            server_requests: curr.server_requests.wrapping_sub(prev.server_requests),
            crosstalk_refusals: curr.crosstalk_refusals.wrapping_sub(prev.crosstalk_refusals),
        }
    }
}

impl CounterRecord for CacheCounters {
    fn delta(prev: &Self, curr: &Self) -> Self {
        CacheCounters {
            gets: curr.gets.wrapping_sub(prev.gets),
            hits: curr.hits.wrapping_sub(prev.hits),
            evictions: curr.evictions.wrapping_sub(prev.evictions),
            evictions_nonexpired: curr
                .evictions_nonexpired
                .wrapping_sub(prev.evictions_nonexpired),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(gets: i64, hits: i64) -> GroupCounters {
        GroupCounters {
            gets,
            hits,
            loads: gets - hits,
            ..Default::default()
        }
    }

    #[test]
    fn test_delta_against_zero_is_identity() {
        let curr = GroupCounters {
            gets: 10,
            hits: 4,
            peer_loads: 1,
            peer_errors: 2,
            loads: 6,
            loads_deduped: 5,
            local_loads: 3,
            local_load_errs: 1,
            server_requests: 8,
            crosstalk_refusals: 9,
        };
        assert_eq!(delta(&GroupCounters::default(), &curr), curr);
    }

    #[test]
    fn test_delta_is_fieldwise_difference() {
        let d = delta(&group(10, 4), &group(15, 6));
        assert_eq!(d.gets, 5);
        assert_eq!(d.hits, 2);
        assert_eq!(d.loads, 3);
        assert_eq!(d.server_requests, 0);
    }

    #[test]
    fn test_unchanged_source_yields_zero() {
        let c = CacheCounters {
            gets: 7,
            hits: 3,
            evictions: 1,
            evictions_nonexpired: 1,
        };
        assert_eq!(delta(&c, &c), CacheCounters::default());
    }

    #[test]
    fn test_rollback_is_negative_not_clamped() {
        let prev = CacheCounters {
            gets: 100,
            hits: 50,
            evictions: 4,
            evictions_nonexpired: 2,
        };
        let curr = CacheCounters {
            gets: 3,
            hits: 1,
            evictions: 0,
            evictions_nonexpired: 0,
        };
        let d = delta(&prev, &curr);
        assert_eq!(d.gets, -97);
        assert_eq!(d.hits, -49);
        assert_eq!(d.evictions, -4);
        assert_eq!(d.evictions_nonexpired, -2);
    }
}
