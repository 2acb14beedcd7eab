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

//! `groupcache-datadog-demo`: simulated groupcache traffic exported to DogStatsD.

use anyhow::Result;
use clap::Parser;
use groupcache_datadog_cli::{
    query_loop, shutdown_signal, DemoConfig, SimulatedGroup, SimulatedWorkspace,
    DEFAULT_REPEAT_KEY,
};
use groupcache_datadog_exporter::mock::LoggingSink;
use groupcache_datadog_exporter::{DogStatsdClient, Exporter, GroupRegistry, MetricSink};
use groupcache_datadog_observability::{init_tracing, LogFormat};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "groupcache-datadog-demo")]
#[command(version, about = "Export a simulated groupcache group to DogStatsD")]
struct Cli {
    /// Log metrics instead of sending them to a DogStatsD agent
    #[arg(long)]
    mock_statsd: bool,

    /// Log every exported metric
    #[arg(long)]
    debug_exporter: bool,

    /// Log the resolved DogStatsD client settings
    #[arg(long)]
    debug_dogstatsd: bool,

    /// Seconds between export cycles [default: 20]
    #[arg(long, value_name = "SECS")]
    export_interval: Option<u64>,

    /// Seconds between query rounds [default: 5]
    #[arg(long, value_name = "SECS")]
    query_interval: Option<u64>,

    /// TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log format (pretty|compact|json)
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    log_format: LogFormat,

    /// Key queried every round
    #[arg(long, value_name = "KEY", default_value = DEFAULT_REPEAT_KEY)]
    repeat_key: String,
}

impl Cli {
    fn apply(&self, config: &mut DemoConfig) {
        if let Some(secs) = self.export_interval {
            config.exporter.export_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.query_interval {
            config.demo.query_interval_secs = secs;
        }
        if self.debug_exporter {
            config.exporter.debug = true;
        }
        if self.debug_dogstatsd {
            config.datadog.debug = true;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format, None)?;

    let mut config = match &cli.config {
        Some(path) => DemoConfig::load_file(path).await?,
        None => DemoConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;
    info!(mock_statsd = cli.mock_statsd, "Starting demo");

    let workspace = Arc::new(SimulatedWorkspace::new());
    let files = workspace.add_group(
        SimulatedGroup::new("files", config.demo.cache_bytes_limit).with_ttl(config.demo.ttl()),
    );

    let sink: Arc<dyn MetricSink> = if cli.mock_statsd {
        Arc::new(LoggingSink::new())
    } else {
        Arc::new(DogStatsdClient::connect(config.datadog.clone()).await?)
    };

    let listed = Arc::clone(&workspace);
    let exporter: Exporter = Exporter::new(
        GroupRegistry::dynamic(move || listed.list_groups()),
        sink,
        config.exporter.clone(),
    )?;

    let rounds = query_loop(
        &files,
        &cli.repeat_key,
        config.demo.query_interval(),
        shutdown_signal(),
    )
    .await;

    info!(rounds, "Stopping exporter");
    exporter.close().await?;
    Ok(())
}
