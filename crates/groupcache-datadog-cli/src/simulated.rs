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
//! In-process stand-in for a groupcache workspace
//!
//! A [`SimulatedGroup`] answers `get` from a byte-bounded LRU main cache and
//! loads misses through a getter: keys starting with `fake-` produce
//! [`FAKE_VALUE_SIZE`] bytes, any other key is read as a file path. Concurrent
//! misses on one key share a single load. It keeps the same counters a
//! groupcache group does, so the exporter sees realistic traffic. There are no
//! peers: peer and hot-cache statistics stay at zero.

use groupcache_datadog_exporter::{
    CacheCounters, CacheTypeStats, GroupCounters, GroupStats, Stats, StatsSource,
};
use moka::future::Cache;
use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;
use tracing::{debug, info};

/// Size of every value loaded for a `fake-` key
pub const FAKE_VALUE_SIZE: usize = 3000;

/// Prefix of keys answered with generated data
pub const FAKE_KEY_PREFIX: &str = "fake-";

const DEFAULT_TTL: Duration = Duration::from_secs(60);
const DEFAULT_LOAD_DELAY: Duration = Duration::from_millis(50);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct Counters {
    group: GroupCounters,
    main: CacheCounters,
}

fn build_cache(
    cache_bytes_limit: usize,
    ttl: Duration,
    counters: &Arc<Mutex<Counters>>,
) -> Cache<String, Arc<[u8]>> {
    let counters = Arc::clone(counters);
    Cache::builder()
        .max_capacity(cache_bytes_limit as u64)
        .eviction_policy(EvictionPolicy::lru())
        .weigher(|_key: &String, value: &Arc<[u8]>| -> u32 {
            value.len().try_into().unwrap_or(u32::MAX)
        })
        .time_to_live(ttl)
        .eviction_listener(move |key: Arc<String>, _value, cause| {
            let mut counters = lock(&counters);
            match cause {
                RemovalCause::Size => {
                    counters.main.evictions += 1;
                    counters.main.evictions_nonexpired += 1;
                }
                RemovalCause::Expired => counters.main.evictions += 1,
                _ => return,
            }
            debug!(key = %key, ?cause, "Evicted from main cache");
        })
        .build()
}

/// One cache group with a byte-bounded main cache.
pub struct SimulatedGroup {
    name: String,
    cache_bytes_limit: usize,
    ttl: Duration,
    load_delay: Duration,
    cache: Cache<String, Arc<[u8]>>,
    counters: Arc<Mutex<Counters>>,
}

impl SimulatedGroup {
    /// Group with an empty main cache of `cache_bytes_limit` bytes
    pub fn new(name: impl Into<String>, cache_bytes_limit: usize) -> Self {
        let counters = Arc::new(Mutex::new(Counters::default()));
        Self {
            name: name.into(),
            cache_bytes_limit,
            ttl: DEFAULT_TTL,
            load_delay: DEFAULT_LOAD_DELAY,
            cache: build_cache(cache_bytes_limit, DEFAULT_TTL, &counters),
            counters,
        }
    }

    /// Lifetime of loaded values
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self.cache = build_cache(self.cache_bytes_limit, ttl, &self.counters);
        self
    }

    /// Artificial latency of every load
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Fetch `key`, loading and caching it on a miss.
    ///
    /// Every miss counts as a load; only the caller that actually runs the
    /// getter counts a deduplicated load.
    pub async fn get(&self, key: &str) -> io::Result<Arc<[u8]>> {
        {
            let mut counters = lock(&self.counters);
            counters.group.gets += 1;
            counters.main.gets += 1;
        }

        if let Some(value) = self.cache.get(key).await {
            let mut counters = lock(&self.counters);
            counters.group.hits += 1;
            counters.main.hits += 1;
            return Ok(value);
        }
        lock(&self.counters).group.loads += 1;

        let result = self.cache.try_get_with(key.to_string(), self.load(key)).await;
        // Apply size evictions now so the next collect sees them.
        self.cache.run_pending_tasks().await;
        result.map_err(|e| io::Error::new(e.kind(), e.to_string()))
    }

    async fn load(&self, key: &str) -> io::Result<Arc<[u8]>> {
        lock(&self.counters).group.loads_deduped += 1;

        let data = if key.starts_with(FAKE_KEY_PREFIX) {
            Ok(vec![b'x'; FAKE_VALUE_SIZE])
        } else {
            tokio::fs::read(key).await
        };
        let data = match data {
            Ok(data) => data,
            Err(e) => {
                lock(&self.counters).group.local_load_errs += 1;
                return Err(e);
            }
        };

        info!(
            group = %self.name,
            key,
            size = data.len(),
            ttl_secs = self.ttl.as_secs(),
            "Loading value"
        );
        tokio::time::sleep(self.load_delay).await;
        lock(&self.counters).group.local_loads += 1;
        Ok(data.into())
    }
}

impl fmt::Debug for SimulatedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedGroup")
            .field("name", &self.name)
            .field("cache_bytes_limit", &self.cache_bytes_limit)
            .finish_non_exhaustive()
    }
}

impl StatsSource for SimulatedGroup {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn collect(&self) -> Stats {
        let counters = lock(&self.counters);
        Stats {
            group: GroupStats {
                counters: counters.group,
                get_from_peers_latency_slowest_ms: 0,
            },
            main: CacheTypeStats {
                counters: counters.main,
                items: self.cache.entry_count() as i64,
                bytes: self.cache.weighted_size() as i64,
            },
            hot: CacheTypeStats::default(),
        }
    }
}

/// Set of groups that can change while the exporter runs.
#[derive(Debug, Default)]
pub struct SimulatedWorkspace {
    groups: RwLock<Vec<Arc<SimulatedGroup>>>,
}

impl SimulatedWorkspace {
    /// Workspace with no groups
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group and return a handle to it
    pub fn add_group(&self, group: SimulatedGroup) -> Arc<SimulatedGroup> {
        let group = Arc::new(group);
        self.groups
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Arc::clone(&group));
        group
    }

    /// Current groups as stats sources, for a dynamic registry
    pub fn list_groups(&self) -> Vec<Arc<dyn StatsSource>> {
        self.groups
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|g| Arc::clone(g) as Arc<dyn StatsSource>)
            .collect()
    }
}
