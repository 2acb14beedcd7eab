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
//! In-process sinks and sources for local runs and tests.
//!
//! - [`LoggingSink`] logs every observation instead of sending it anywhere.
//! - [`RecordingSink`] keeps every observation in memory for assertions.
//! - [`FixedSource`] serves a snapshot the caller controls.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use groupcache_datadog_exporter::mock::{FixedSource, RecordingSink};
//! use groupcache_datadog_exporter::{Exporter, ExporterOptions, GroupRegistry, StatsSource};
//!
//! #[tokio::main]
//! async fn main() -> groupcache_datadog_exporter::ExportResult<()> {
//!     let source: Arc<dyn StatsSource> = Arc::new(FixedSource::new("files"));
//!     let sink = Arc::new(RecordingSink::new());
//!     let exporter = Exporter::new(
//!         GroupRegistry::fixed(vec![source]),
//!         Arc::clone(&sink),
//!         ExporterOptions::default().without_hostname_tag(),
//!     )?;
//!     exporter.close().await?;
//!     println!("{} observations", sink.observations().len());
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::error::{ExportError, ExportResult};
use crate::sink::MetricSink;
use crate::stats::{Stats, StatsSource};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Sink that logs observations at info level and never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl LoggingSink {
    /// New logging sink
    pub fn new() -> Self {
        LoggingSink
    }
}

#[async_trait]
impl MetricSink for LoggingSink {
    async fn gauge(&self, name: &str, value: f64, tags: &[String], rate: f64) -> ExportResult<()> {
        info!(metric = name, value, ?tags, rate, "statsd mock gauge");
        Ok(())
    }

    async fn count(&self, name: &str, value: i64, tags: &[String], rate: f64) -> ExportResult<()> {
        info!(metric = name, value, ?tags, rate, "statsd mock count");
        Ok(())
    }

    async fn close(&self) -> ExportResult<()> {
        info!("statsd mock close");
        Ok(())
    }
}

/// Kind of a recorded observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Absolute value
    Gauge,
    /// Increment
    Count,
}

/// Recorded value, kept in the type the sink received.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    /// Value of a `gauge` call
    Gauge(f64),
    /// Value of a `count` call
    Count(i64),
}

impl MetricValue {
    /// Which sink call produced this value
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Gauge(_) => MetricKind::Gauge,
            MetricValue::Count(_) => MetricKind::Count,
        }
    }

    /// Gauge value, `None` for counts
    pub fn as_gauge(&self) -> Option<f64> {
        match *self {
            MetricValue::Gauge(v) => Some(v),
            MetricValue::Count(_) => None,
        }
    }

    /// Count value, `None` for gauges
    pub fn as_count(&self) -> Option<i64> {
        match *self {
            MetricValue::Count(v) => Some(v),
            MetricValue::Gauge(_) => None,
        }
    }
}

/// One call received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Metric name without namespace
    pub name: String,
    /// Submitted value
    pub value: MetricValue,
    /// Per-call tags, in submission order
    pub tags: Vec<String>,
    /// Sample rate passed with the call
    pub rate: f64,
}

impl Observation {
    /// Kind of the submitted value
    pub fn kind(&self) -> MetricKind {
        self.value.kind()
    }
}

/// Sink that records every call, for tests.
///
/// Submissions can be made to fail with [`RecordingSink::fail_submissions`];
/// failed calls are still recorded.
#[derive(Debug, Default)]
pub struct RecordingSink {
    observations: Mutex<Vec<Observation>>,
    fail: AtomicBool,
    fail_close: AtomicBool,
    closes: AtomicUsize,
}

impl RecordingSink {
    /// Empty sink that accepts every call
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent gauge/count calls return an error
    pub fn fail_submissions(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Make `close` return an error (the call is still counted)
    pub fn fail_close(&self, fail: bool) {
        self.fail_close.store(fail, Ordering::SeqCst);
    }

    /// Every observation so far, in call order
    pub fn observations(&self) -> Vec<Observation> {
        lock(&self.observations).clone()
    }

    /// Recorded gauge calls
    pub fn gauges(&self) -> Vec<Observation> {
        self.of_kind(MetricKind::Gauge)
    }

    /// Recorded count calls
    pub fn counts(&self) -> Vec<Observation> {
        self.of_kind(MetricKind::Count)
    }

    /// Latest count recorded for `name` with exactly these tags
    pub fn count_value(&self, name: &str, tags: &[&str]) -> Option<i64> {
        self.latest(MetricKind::Count, name, tags)
            .and_then(|v| v.as_count())
    }

    /// Latest gauge recorded for `name` with exactly these tags
    pub fn gauge_value(&self, name: &str, tags: &[&str]) -> Option<f64> {
        self.latest(MetricKind::Gauge, name, tags)
            .and_then(|v| v.as_gauge())
    }

    /// Number of `close` calls received
    pub fn close_calls(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    /// Forget recorded observations
    pub fn clear(&self) {
        lock(&self.observations).clear();
    }

    fn of_kind(&self, kind: MetricKind) -> Vec<Observation> {
        lock(&self.observations)
            .iter()
            .filter(|o| o.kind() == kind)
            .cloned()
            .collect()
    }

    fn latest(&self, kind: MetricKind, name: &str, tags: &[&str]) -> Option<MetricValue> {
        lock(&self.observations)
            .iter()
            .rev()
            .find(|o| o.kind() == kind && o.name == name && o.tags.iter().eq(tags.iter()))
            .map(|o| o.value)
    }

    fn record(&self, name: &str, value: MetricValue, tags: &[String], rate: f64) -> ExportResult<()> {
        lock(&self.observations).push(Observation {
            name: name.to_string(),
            value,
            tags: tags.to_vec(),
            rate,
        });
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExportError::sink(format!("rejected {}", name)));
        }
        Ok(())
    }
}

#[async_trait]
impl MetricSink for RecordingSink {
    async fn gauge(&self, name: &str, value: f64, tags: &[String], rate: f64) -> ExportResult<()> {
        self.record(name, MetricValue::Gauge(value), tags, rate)
    }

    async fn count(&self, name: &str, value: i64, tags: &[String], rate: f64) -> ExportResult<()> {
        self.record(name, MetricValue::Count(value), tags, rate)
    }

    async fn close(&self) -> ExportResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(ExportError::sink("close rejected"));
        }
        Ok(())
    }
}

/// Stats source returning whatever snapshot was last set.
#[derive(Debug)]
pub struct FixedSource {
    name: String,
    stats: Mutex<Stats>,
    collects: AtomicUsize,
}

impl FixedSource {
    /// Source reporting the zero snapshot
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_stats(name, Stats::default())
    }

    /// Source reporting `stats` until changed
    pub fn with_stats(name: impl Into<String>, stats: Stats) -> Self {
        Self {
            name: name.into(),
            stats: Mutex::new(stats),
            collects: AtomicUsize::new(0),
        }
    }

    /// Replace the snapshot returned by later collects
    pub fn set(&self, stats: Stats) {
        *lock(&self.stats) = stats;
    }

    /// Number of times the exporter collected from this source
    pub fn collect_calls(&self) -> usize {
        self.collects.load(Ordering::SeqCst)
    }
}

impl StatsSource for FixedSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn collect(&self) -> Stats {
        self.collects.fetch_add(1, Ordering::SeqCst);
        *lock(&self.stats)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_sink_accepts_everything() {
        tokio_test::block_on(async {
            let sink = LoggingSink::new();
            let tags = vec!["group:files".to_string()];
            assert!(sink.gauge("cache_items", 2.0, &tags, 1.0).await.is_ok());
            assert!(sink.count("gets", 10, &tags, 1.0).await.is_ok());
            assert!(sink.close().await.is_ok());
        });
    }

    #[tokio::test]
    async fn test_recording_sink_lookup() {
        let sink = RecordingSink::new();
        let tags = vec!["group:files".to_string()];
        sink.count("gets", 10, &tags, 1.0).await.unwrap();
        sink.count("gets", 5, &tags, 1.0).await.unwrap();
        sink.gauge("cache_items", 2.0, &tags, 1.0).await.unwrap();

        assert_eq!(sink.count_value("gets", &["group:files"]), Some(5));
        assert_eq!(sink.count_value("gets", &["group:other"]), None);
        assert_eq!(sink.gauge_value("cache_items", &["group:files"]), Some(2.0));
        assert_eq!(sink.counts().len(), 2);
        assert_eq!(sink.gauges().len(), 1);
    }

    #[tokio::test]
    async fn test_large_counts_are_kept_exact() {
        let sink = RecordingSink::new();
        let big = (1i64 << 53) + 1;
        sink.count("gets", big, &[], 1.0).await.unwrap();
        sink.count("hits", i64::MIN, &[], 1.0).await.unwrap();

        assert_eq!(sink.count_value("gets", &[]), Some(big));
        assert_eq!(sink.count_value("hits", &[]), Some(i64::MIN));
        assert_eq!(sink.gauge_value("gets", &[]), None);
        assert_eq!(sink.observations()[0].value, MetricValue::Count(big));
    }

    #[tokio::test]
    async fn test_recording_sink_failure_mode() {
        let sink = RecordingSink::new();
        sink.fail_submissions(true);
        let err = sink.count("gets", 1, &[], 1.0).await.unwrap_err();
        assert!(matches!(err, ExportError::Sink(_)));
        assert_eq!(sink.observations().len(), 1);
        sink.close().await.unwrap();
        assert_eq!(sink.close_calls(), 1);
    }

    #[test]
    fn test_fixed_source() {
        let source = FixedSource::new("files");
        assert_eq!(source.name(), "files");
        assert_eq!(source.collect(), Stats::default());

        let mut stats = Stats::default();
        stats.group.counters.gets = 3;
        source.set(stats);
        assert_eq!(source.collect().group.counters.gets, 3);
        assert_eq!(source.collect_calls(), 2);
    }
}
