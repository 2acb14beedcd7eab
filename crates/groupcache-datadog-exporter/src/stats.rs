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
//! Statistics snapshots read from a cache group.
//!
//! Counters are monotonic for the lifetime of the cache process; gauges are
//! instantaneous readings. All values are signed so deltas between two
//! snapshots can go negative when the source restarts.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Group-wide monotonic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCounters {
    /// Any get request, including from peers
    pub gets: i64,
    /// Either cache was good
    pub hits: i64,
    /// Either remote load or remote cache hit
    pub peer_loads: i64,
    /// Failed peer loads
    pub peer_errors: i64,
    /// Gets minus hits
    pub loads: i64,
    /// Loads after single-flight deduplication
    pub loads_deduped: i64,
    /// Total good local loads
    pub local_loads: i64,
    /// Total bad local loads
    pub local_load_errs: i64,
    /// Gets that came over the network from peers
    pub server_requests: i64,
    /// Requests refused because they came from another workspace
    pub crosstalk_refusals: i64,
}

/// Group statistics: counters plus the peer latency gauge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupStats {
    /// Monotonic group counters
    #[serde(flatten)]
    pub counters: GroupCounters,
    /// Slowest get-from-peers latency observed, in milliseconds
    pub get_from_peers_latency_slowest_ms: i64,
}

/// Monotonic counters of one cache partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheCounters {
    /// Lookups in this partition
    pub gets: i64,
    /// Lookups that found the key
    pub hits: i64,
    /// Entries removed, for any reason
    pub evictions: i64,
    /// Evictions of entries that had not expired yet
    pub evictions_nonexpired: i64,
}

/// Statistics of one cache partition (main or hot).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTypeStats {
    /// Monotonic partition counters
    #[serde(flatten)]
    pub counters: CacheCounters,
    /// Entries currently held
    pub items: i64,
    /// Bytes currently held
    pub bytes: i64,
}

/// Point-in-time snapshot of one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Group-wide statistics
    pub group: GroupStats,
    /// Keys this process owns
    pub main: CacheTypeStats,
    /// Keys borrowed from peers
    pub hot: CacheTypeStats,
}

/// Cache partition label used in the `type:` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheType {
    /// Keys this process owns
    Main,
    /// Popular keys owned by peers
    Hot,
}

impl CacheType {
    /// Both partitions in emission order
    pub const ALL: [CacheType; 2] = [CacheType::Main, CacheType::Hot];

    /// Value of the `type:` tag
    pub fn as_label(&self) -> &'static str {
        match self {
            CacheType::Main => "main",
            CacheType::Hot => "hot",
        }
    }

    /// Select this partition from a snapshot.
    pub fn of<'a>(&self, stats: &'a Stats) -> &'a CacheTypeStats {
        match self {
            CacheType::Main => &stats.main,
            CacheType::Hot => &stats.hot,
        }
    }
}

/// A named cache group that can be asked for its statistics.
///
/// Adapters for each cache library implement this. `collect` cannot fail:
/// an adapter that cannot read its cache reports zero or unchanged values.
pub trait StatsSource: Send + Sync + Debug {
    /// Group name, unique and stable for the life of the group
    fn name(&self) -> String;

    /// Read a fresh snapshot
    fn collect(&self) -> Stats;
}
