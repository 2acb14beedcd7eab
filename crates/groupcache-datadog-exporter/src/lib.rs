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
//! Groupcache statistics exporter for DogStatsD
//!
//! Polls cache groups on a fixed interval and forwards their statistics to a
//! StatsD-style sink. Monotonic counters become per-interval counts; gauges
//! are reported as read.
//!
//! # Features
//!
//! - **Delta engine**: counts are the difference to the previous snapshot of
//!   the same group, with the zero snapshot as the first baseline
//! - **Static or dynamic groups**: fixed list or a callback evaluated per cycle
//! - **Failure isolation**: a rejected metric is logged and the cycle goes on
//! - **DogStatsD client**: UDP client with namespace, static tags and sampling
//!
//! # Metrics
//!
//! Per group and cycle, tagged `group:<name>` and `<hostname key>:<host>`:
//! 10 group counters plus the peer latency gauge, then for each of the main
//! and hot caches (tagged `type:main` / `type:hot`) two gauges and four
//! counters. See [`names`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use groupcache_datadog_exporter::{
//!     DatadogClientOptions, DogStatsdClient, Exporter, ExporterOptions, GroupRegistry,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DogStatsdClient::connect(DatadogClientOptions::default()).await?;
//!     let exporter = Exporter::new(
//!         GroupRegistry::dynamic(list_my_groups),
//!         Arc::new(client),
//!         ExporterOptions::default(),
//!     )?;
//!
//!     // ... run the cache ...
//!
//!     exporter.close().await?;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod delta;
pub mod error;
pub mod exporter;
pub mod mock;
pub mod names;
pub mod options;
mod poller;
pub mod registry;
pub mod sink;
pub mod stats;
pub mod tags;

pub use client::{DatadogClientOptions, DogStatsdClient, ResolvedClientOptions};
pub use delta::{delta, CounterRecord};
pub use error::{ExportError, ExportResult};
pub use exporter::Exporter;
pub use options::ExporterOptions;
pub use registry::GroupRegistry;
pub use sink::MetricSink;
pub use stats::{CacheCounters, CacheType, CacheTypeStats, GroupCounters, GroupStats, Stats, StatsSource};
