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
//! One export cycle: snapshot, delta, emit.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::delta::delta;
use crate::names;
use crate::registry::GroupRegistry;
use crate::sink::MetricSink;
use crate::stats::{CacheType, CacheTypeStats, Stats, StatsSource};
use crate::tags::{cache_type_tags, group_tags};

/// Outcome of one export cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CycleReport {
    /// Groups polled
    pub(crate) groups: usize,
    /// Metrics handed to the sink
    pub(crate) submitted: usize,
    /// Submissions the sink rejected
    pub(crate) failed: usize,
}

/// Polling state owned by the exporter task.
///
/// `previous` maps a group name to the snapshot exported last cycle. It lives
/// only here; a group missing from it is diffed against the zero snapshot.
pub(crate) struct Poller<S: MetricSink + ?Sized> {
    registry: GroupRegistry,
    sink: Arc<S>,
    sample_rate: f64,
    debug: bool,
    hostname_tag: Option<String>,
    previous: HashMap<String, Stats>,
}

impl<S: MetricSink + ?Sized> Poller<S> {
    pub(crate) fn new(
        registry: GroupRegistry,
        sink: Arc<S>,
        sample_rate: f64,
        debug: bool,
        hostname_tag: Option<String>,
    ) -> Self {
        Self {
            registry,
            sink,
            sample_rate,
            debug,
            hostname_tag,
            previous: HashMap::new(),
        }
    }

    /// Export every current group once, sequentially in registry order.
    pub(crate) async fn export_once(&mut self) -> CycleReport {
        let groups = self.registry.current_groups();
        debug!(groups = groups.len(), "Export cycle started");
        let mut report = CycleReport {
            groups: groups.len(),
            ..Default::default()
        };

        for group in &groups {
            self.export_group(group.as_ref(), &mut report).await;
        }

        debug!(
            groups = report.groups,
            submitted = report.submitted,
            failed = report.failed,
            "Export cycle finished"
        );
        report
    }

    async fn export_group(&mut self, source: &dyn StatsSource, report: &mut CycleReport) {
        let name = source.name();
        let tags = group_tags(&name, self.hostname_tag.as_deref());

        let previous = self.previous.get(&name).copied().unwrap_or_default();
        let stats = source.collect();

        let d = delta(&previous.group.counters, &stats.group.counters);
        let latency = stats.group.get_from_peers_latency_slowest_ms as f64;

        self.count(names::GETS, d.gets, &tags, report).await;
        self.count(names::HITS, d.hits, &tags, report).await;
        self.gauge(names::GET_FROM_PEERS_LATENCY_SLOWEST, latency, &tags, report)
            .await;
        self.count(names::PEER_LOADS, d.peer_loads, &tags, report).await;
        self.count(names::PEER_ERRORS, d.peer_errors, &tags, report).await;
        self.count(names::LOADS, d.loads, &tags, report).await;
        self.count(names::LOADS_DEDUPED, d.loads_deduped, &tags, report)
            .await;
        self.count(names::LOCAL_LOADS, d.local_loads, &tags, report).await;
        self.count(names::LOCAL_LOAD_ERRS, d.local_load_errs, &tags, report)
            .await;
        self.count(names::SERVER_REQUESTS, d.server_requests, &tags, report)
            .await;
        self.count(names::CROSSTALK_REFUSALS, d.crosstalk_refusals, &tags, report)
            .await;

        for cache_type in CacheType::ALL {
            self.export_cache_type(
                cache_type.of(&previous),
                cache_type.of(&stats),
                &tags,
                cache_type,
                report,
            )
            .await;
        }

        self.previous.insert(name, stats);
    }

    async fn export_cache_type(
        &self,
        prev: &CacheTypeStats,
        curr: &CacheTypeStats,
        group_tags: &[String],
        cache_type: CacheType,
        report: &mut CycleReport,
    ) {
        let tags = cache_type_tags(group_tags, cache_type);
        let d = delta(&prev.counters, &curr.counters);

        self.gauge(names::CACHE_ITEMS, curr.items as f64, &tags, report)
            .await;
        self.gauge(names::CACHE_BYTES, curr.bytes as f64, &tags, report)
            .await;
        self.count(names::CACHE_GETS, d.gets, &tags, report).await;
        self.count(names::CACHE_HITS, d.hits, &tags, report).await;
        self.count(names::CACHE_EVICTIONS, d.evictions, &tags, report)
            .await;
        self.count(
            names::CACHE_EVICTIONS_NONEXPIRED,
            d.evictions_nonexpired,
            &tags,
            report,
        )
        .await;
    }

    async fn count(&self, name: &str, value: i64, tags: &[String], report: &mut CycleReport) {
        if self.debug {
            info!(metric = name, value, ?tags, rate = self.sample_rate, "Exporting count");
        }
        report.submitted += 1;
        if let Err(e) = self.sink.count(name, value, tags, self.sample_rate).await {
            report.failed += 1;
            error!(metric = name, error = %e, "Count submission failed");
        }
    }

    async fn gauge(&self, name: &str, value: f64, tags: &[String], report: &mut CycleReport) {
        if self.debug {
            info!(metric = name, value, ?tags, rate = self.sample_rate, "Exporting gauge");
        }
        report.submitted += 1;
        if let Err(e) = self.sink.gauge(name, value, tags, self.sample_rate).await {
            report.failed += 1;
            error!(metric = name, error = %e, "Gauge submission failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{FixedSource, MetricValue, Observation, RecordingSink};
    use crate::stats::{CacheCounters, GroupCounters, GroupStats};
    use std::io;
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    /// Log sink for a thread-local subscriber.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Run one cycle with `debug` set as given and return what was logged.
    async fn logged_cycle(debug: bool) -> String {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let source = Arc::new(FixedSource::with_stats("files", files_stats(10, 4)));
        let sink = Arc::new(RecordingSink::new());
        let group = Arc::clone(&source) as Arc<dyn StatsSource>;
        let mut poller = Poller::new(GroupRegistry::fixed(vec![group]), sink, 1.0, debug, None);
        poller.export_once().await;
        logs.text()
    }

    fn files_stats(gets: i64, hits: i64) -> Stats {
        Stats {
            group: GroupStats {
                counters: GroupCounters {
                    gets,
                    hits,
                    loads: gets - hits,
                    ..Default::default()
                },
                get_from_peers_latency_slowest_ms: 12,
            },
            main: CacheTypeStats {
                counters: CacheCounters {
                    gets,
                    hits,
                    evictions: 0,
                    evictions_nonexpired: 0,
                },
                items: 2,
                bytes: 200,
            },
            hot: CacheTypeStats::default(),
        }
    }

    fn poller(
        source: &Arc<FixedSource>,
        sink: &Arc<RecordingSink>,
        hostname_tag: Option<&str>,
    ) -> Poller<RecordingSink> {
        let group: Arc<dyn StatsSource> = Arc::clone(source) as Arc<dyn StatsSource>;
        Poller::new(
            GroupRegistry::fixed(vec![group]),
            Arc::clone(sink),
            1.0,
            false,
            hostname_tag.map(str::to_string),
        )
    }

    #[tokio::test]
    async fn test_first_and_second_cycle() {
        let source = Arc::new(FixedSource::with_stats("files", files_stats(10, 4)));
        let sink = Arc::new(RecordingSink::new());
        let mut poller = poller(&source, &sink, None);

        let report = poller.export_once().await;
        assert_eq!(report.groups, 1);
        assert_eq!(report.submitted, names::METRICS_PER_GROUP);
        assert_eq!(report.failed, 0);

        let group = ["group:files"];
        let main = ["group:files", "type:main"];
        assert_eq!(sink.count_value(names::GETS, &group), Some(10));
        assert_eq!(sink.count_value(names::HITS, &group), Some(4));
        assert_eq!(sink.gauge_value(names::CACHE_ITEMS, &main), Some(2.0));
        assert_eq!(sink.count_value(names::CACHE_EVICTIONS, &main), Some(0));

        sink.clear();
        let mut next = files_stats(15, 6);
        next.main.items = 3;
        source.set(next);
        poller.export_once().await;

        assert_eq!(sink.count_value(names::GETS, &group), Some(5));
        assert_eq!(sink.count_value(names::HITS, &group), Some(2));
        assert_eq!(sink.gauge_value(names::CACHE_ITEMS, &main), Some(3.0));
        assert_eq!(
            sink.gauge_value(names::GET_FROM_PEERS_LATENCY_SLOWEST, &group),
            Some(12.0)
        );
    }

    #[tokio::test]
    async fn test_unchanged_source_emits_zero_deltas() {
        let source = Arc::new(FixedSource::with_stats("files", files_stats(10, 4)));
        let sink = Arc::new(RecordingSink::new());
        let mut poller = poller(&source, &sink, None);

        poller.export_once().await;
        let first_gauges: Vec<Observation> = sink.gauges();
        sink.clear();
        poller.export_once().await;

        assert!(sink
            .counts()
            .iter()
            .all(|o| o.value == MetricValue::Count(0)));
        assert_eq!(sink.counts().len(), 18);
        assert_eq!(sink.gauges(), first_gauges);
    }

    #[tokio::test]
    async fn test_counter_rollback_is_reported_negative() {
        let source = Arc::new(FixedSource::with_stats("files", files_stats(100, 40)));
        let sink = Arc::new(RecordingSink::new());
        let mut poller = poller(&source, &sink, None);

        poller.export_once().await;
        sink.clear();
        source.set(files_stats(3, 1));
        poller.export_once().await;

        assert_eq!(sink.count_value(names::GETS, &["group:files"]), Some(-97));
        assert_eq!(
            sink.count_value(names::CACHE_HITS, &["group:files", "type:main"]),
            Some(-39)
        );
    }

    #[tokio::test]
    async fn test_partitions_are_diffed_independently() {
        let mut stats = files_stats(10, 4);
        stats.hot.counters.gets = 1;
        let source = Arc::new(FixedSource::with_stats("files", stats));
        let sink = Arc::new(RecordingSink::new());
        let mut poller = poller(&source, &sink, None);
        poller.export_once().await;

        sink.clear();
        stats.main.counters.gets = 30;
        stats.hot.counters.gets = 4;
        source.set(stats);
        poller.export_once().await;

        let main = ["group:files", "type:main"];
        let hot = ["group:files", "type:hot"];
        assert_eq!(sink.count_value(names::CACHE_GETS, &main), Some(20));
        assert_eq!(sink.count_value(names::CACHE_GETS, &hot), Some(3));
    }

    #[tokio::test]
    async fn test_groups_keep_separate_baselines() {
        let files = Arc::new(FixedSource::with_stats("files", files_stats(10, 4)));
        let images = Arc::new(FixedSource::with_stats("images", files_stats(50, 5)));
        let sink = Arc::new(RecordingSink::new());
        let groups: Vec<Arc<dyn StatsSource>> = vec![
            Arc::clone(&files) as Arc<dyn StatsSource>,
            Arc::clone(&images) as Arc<dyn StatsSource>,
        ];
        let mut poller = Poller::new(
            GroupRegistry::fixed(groups),
            Arc::clone(&sink),
            1.0,
            false,
            None,
        );

        poller.export_once().await;
        assert_eq!(sink.count_value(names::GETS, &["group:images"]), Some(50));

        sink.clear();
        files.set(files_stats(11, 4));
        images.set(files_stats(52, 5));
        let report = poller.export_once().await;
        assert_eq!(report.submitted, 2 * names::METRICS_PER_GROUP);
        assert_eq!(sink.count_value(names::GETS, &["group:files"]), Some(1));
        assert_eq!(sink.count_value(names::GETS, &["group:images"]), Some(2));
    }

    #[tokio::test]
    async fn test_sink_failures_do_not_abort_cycle() {
        let source = Arc::new(FixedSource::with_stats("files", files_stats(10, 4)));
        let sink = Arc::new(RecordingSink::new());
        sink.fail_submissions(true);
        let mut poller = poller(&source, &sink, None);

        let report = poller.export_once().await;
        assert_eq!(report.submitted, names::METRICS_PER_GROUP);
        assert_eq!(report.failed, names::METRICS_PER_GROUP);

        // The snapshot is still stored, so the next cycle deltas against it.
        sink.fail_submissions(false);
        source.set(files_stats(12, 4));
        poller.export_once().await;
        assert_eq!(sink.count_value(names::GETS, &["group:files"]), Some(2));
    }

    #[tokio::test]
    async fn test_hostname_tag_and_sample_rate_are_attached() {
        let source = Arc::new(FixedSource::with_stats("files", files_stats(1, 1)));
        let sink = Arc::new(RecordingSink::new());
        let group: Arc<dyn StatsSource> = Arc::clone(&source) as Arc<dyn StatsSource>;
        let mut poller = Poller::new(
            GroupRegistry::fixed(vec![group]),
            Arc::clone(&sink),
            0.5,
            false,
            Some("pod_name:web-1".to_string()),
        );
        poller.export_once().await;

        let all = sink.observations();
        assert_eq!(all.len(), names::METRICS_PER_GROUP);
        assert!(all.iter().all(|o| o.rate == 0.5));
        assert!(all
            .iter()
            .all(|o| o.tags[0] == "group:files" && o.tags[1] == "pod_name:web-1"));
        assert_eq!(
            sink.count_value(names::CACHE_HITS, &["group:files", "pod_name:web-1", "type:hot"]),
            Some(0)
        );
    }

    #[tokio::test]
    async fn test_debug_logs_every_metric() {
        let logs = logged_cycle(true).await;
        assert_eq!(logs.matches("Exporting count").count(), 18);
        assert_eq!(logs.matches("Exporting gauge").count(), 5);
        assert!(logs.contains("Export cycle started"));
        assert!(logs.contains("Export cycle finished"));
    }

    #[tokio::test]
    async fn test_metrics_not_logged_without_debug() {
        let logs = logged_cycle(false).await;
        assert!(!logs.contains("Exporting count"));
        assert!(!logs.contains("Exporting gauge"));
        assert!(logs.contains("Export cycle started"));
    }

    #[tokio::test]
    async fn test_empty_registry_skips_cycle() {
        let sink = Arc::new(RecordingSink::new());
        let mut poller = Poller::new(GroupRegistry::default(), Arc::clone(&sink), 1.0, false, None);
        assert_eq!(poller.export_once().await, CycleReport::default());
        assert!(sink.observations().is_empty());
    }
}
