//! Metric names emitted by the exporter.
//!
//! The DogStatsD client prefixes each name with its namespace
//! (`groupcache.` by default).

/// Any get request, including from peers (count)
pub const GETS: &str = "gets";

/// Gets served from either cache (count)
pub const HITS: &str = "hits";

/// Slowest get-from-peers latency in milliseconds (gauge)
pub const GET_FROM_PEERS_LATENCY_SLOWEST: &str = "get_from_peers_latency_slowest_milliseconds";

/// Remote loads or remote cache hits (count)
pub const PEER_LOADS: &str = "peer_loads";

/// Failed peer loads (count)
pub const PEER_ERRORS: &str = "peer_errors";

/// Gets that missed both caches (count)
pub const LOADS: &str = "loads";

/// Loads after single-flight deduplication (count)
pub const LOADS_DEDUPED: &str = "loads_deduped";

/// Successful local loads (count)
pub const LOCAL_LOADS: &str = "local_load";

/// Failed local loads (count)
pub const LOCAL_LOAD_ERRS: &str = "local_load_errs";

/// Gets received from peers over the network (count)
pub const SERVER_REQUESTS: &str = "server_requests";

/// Requests refused for coming from another workspace (count)
pub const CROSSTALK_REFUSALS: &str = "crosstalk_refusals";

/// Entries held by a cache partition (gauge)
pub const CACHE_ITEMS: &str = "cache_items";

/// Bytes held by a cache partition (gauge)
pub const CACHE_BYTES: &str = "cache_bytes";

/// Partition lookups (count)
pub const CACHE_GETS: &str = "cache_gets";

/// Partition hits (count)
pub const CACHE_HITS: &str = "cache_hits";

/// Partition evictions (count)
pub const CACHE_EVICTIONS: &str = "cache_evictions";

/// Partition evictions of unexpired entries (count)
pub const CACHE_EVICTIONS_NONEXPIRED: &str = "cache_evictions_nonexpired";

/// Metrics emitted per group and cycle: 11 group metrics plus 6 per partition.
pub const METRICS_PER_GROUP: usize = 11 + 2 * 6;
