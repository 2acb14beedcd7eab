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
//! Exporter lifecycle and background polling task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{ExportError, ExportResult};
use crate::options::ExporterOptions;
use crate::poller::Poller;
use crate::registry::GroupRegistry;
use crate::sink::MetricSink;
use crate::tags::hostname_tag;

/// Periodically exports groupcache statistics to a [`MetricSink`].
///
/// Construction validates the options, resolves the hostname tag and spawns
/// the polling task on the current tokio runtime; the first cycle runs
/// immediately. [`Exporter::close`] stops the task and closes the sink.
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use groupcache_datadog_exporter::{mock::LoggingSink, Exporter, ExporterOptions, GroupRegistry};
/// # #[tokio::main]
/// # async fn main() -> groupcache_datadog_exporter::ExportResult<()> {
/// let exporter = Exporter::new(
///     GroupRegistry::fixed(Vec::new()),
///     Arc::new(LoggingSink::new()),
///     ExporterOptions::default(),
/// )?;
/// // ... serve traffic ...
/// exporter.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Exporter<S: MetricSink + ?Sized = dyn MetricSink> {
    sink: Arc<S>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl<S: MetricSink + ?Sized + 'static> Exporter<S> {
    /// Validate `options` and start exporting.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid options or when called
    /// outside a tokio runtime. Hostname lookup failures are not errors: the
    /// exporter runs without the hostname tag.
    pub fn new(registry: GroupRegistry, sink: Arc<S>, options: ExporterOptions) -> ExportResult<Self> {
        options.validate()?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| ExportError::Runtime(e.to_string()))?;

        let hostname_tag = hostname_tag(&options.hostname_tag_key, options.disable_hostname_tag);
        info!(
            interval_secs = options.export_interval.as_secs_f64(),
            sample_rate = options.sample_rate,
            hostname_tag = hostname_tag.as_deref().unwrap_or(""),
            registry = ?registry,
            "Starting groupcache exporter"
        );

        let poller = Poller::new(
            registry,
            Arc::clone(&sink),
            options.sample_rate,
            options.debug,
            hostname_tag,
        );
        let cancel = CancellationToken::new();
        let task = runtime.spawn(run(poller, options.export_interval, cancel.clone()));

        Ok(Self {
            sink,
            cancel,
            task: Mutex::new(Some(task)),
            closed: AtomicBool::new(false),
        })
    }

    /// Whether [`Exporter::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stop exporting and close the sink.
    ///
    /// A cycle already in flight finishes first; no cycle starts afterwards.
    /// Returns the sink's close error, if any. Later calls do nothing and
    /// return `Ok(())`.
    pub async fn close(&self) -> ExportResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("Exporter already closed");
            return Ok(());
        }

        self.cancel.cancel();
        if let Some(task) = self.task.lock().await.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Export task ended abnormally");
            }
        }

        let result = self.sink.close().await;
        info!(ok = result.is_ok(), "Groupcache exporter closed");
        result
    }
}

impl<S: MetricSink + ?Sized> Drop for Exporter<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run<S: MetricSink + ?Sized>(
    mut poller: Poller<S>,
    interval: Duration,
    cancel: CancellationToken,
) {
    // The first tick completes immediately.
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let report = poller.export_once().await;
                if report.failed > 0 {
                    warn!(
                        failed = report.failed,
                        submitted = report.submitted,
                        "Some metrics were dropped this cycle"
                    );
                }
            }
        }
    }
    debug!("Export loop stopped");
}
