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
//! DogStatsD client over UDP.
//!
//! Encoding is done by `cadence`; each observation is one datagram:
//!
//! ```text
//! groupcache.cache_items:2|g|#env:prod,service:svc,group:files,type:main
//! groupcache.gets:5|c|@0.5|#service:svc,group:files
//! ```
//!
//! Unset options fall back to the Datadog agent environment variables
//! (`DD_AGENT_HOST`, `DD_AGENT_PORT`, `DD_SERVICE`, `DD_TAGS`).

use async_trait::async_trait;
use cadence::prelude::*;
use cadence::{Metric, MetricBuilder, StatsdClient, UdpMetricSink};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::lookup_host;
use tracing::info;

use crate::error::{ExportError, ExportResult};
use crate::sink::MetricSink;
use crate::tags::merge_static_tags;

/// Agent host variable
pub const ENV_AGENT_HOST: &str = "DD_AGENT_HOST";
/// Agent port variable
pub const ENV_AGENT_PORT: &str = "DD_AGENT_PORT";
/// Service name variable
pub const ENV_SERVICE: &str = "DD_SERVICE";
/// Whitespace separated static tags
pub const ENV_TAGS: &str = "DD_TAGS";

/// Host used when neither the options nor the environment set one
pub const DEFAULT_AGENT_HOST: &str = "localhost";
/// Standard DogStatsD port
pub const DEFAULT_AGENT_PORT: &str = "8125";
/// Metric name prefix
pub const DEFAULT_NAMESPACE: &str = "groupcache";
/// Service tag value when none is configured
pub const DEFAULT_SERVICE: &str = "service-unknown";

/// Options for [`DogStatsdClient`]. Empty fields are filled by
/// [`DatadogClientOptions::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatadogClientOptions {
    /// Agent host; defaults to `DD_AGENT_HOST`, then "localhost"
    pub host: String,

    /// Agent port; defaults to `DD_AGENT_PORT`, then "8125"
    pub port: String,

    /// Prefix for every metric name; defaults to "groupcache"
    pub namespace: String,

    /// Service name for the `service:` tag; defaults to `DD_SERVICE`
    pub service: String,

    /// Static tags; default to the whitespace separated `DD_TAGS`
    pub tags: Vec<String>,

    /// Log the resolved settings
    pub debug: bool,
}

/// Fully resolved client settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedClientOptions {
    /// Agent host
    pub host: String,
    /// Agent port, not yet parsed
    pub port: String,
    /// Metric name prefix
    pub namespace: String,
    /// Value of the `service:` tag
    pub service: String,
    /// Sorted, deduplicated static tags including `service:<service>`
    pub tags: Vec<String>,
    /// Log the resolved settings on connect
    pub debug: bool,
}

impl ResolvedClientOptions {
    /// `host:port` as configured
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatadogClientOptions {
    /// Fill empty fields from the process environment and merge the tags.
    pub fn resolve(self) -> ResolvedClientOptions {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    /// Same as [`DatadogClientOptions::resolve`] with an explicit variable lookup.
    pub fn resolve_with<F>(self, env: F) -> ResolvedClientOptions
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = or_env(self.host, &env, ENV_AGENT_HOST, DEFAULT_AGENT_HOST);
        let port = or_env(self.port, &env, ENV_AGENT_PORT, DEFAULT_AGENT_PORT);
        let namespace = if self.namespace.is_empty() {
            DEFAULT_NAMESPACE.to_string()
        } else {
            self.namespace
        };
        let service = or_env(self.service, &env, ENV_SERVICE, DEFAULT_SERVICE);
        let tags = if self.tags.is_empty() {
            env_string(&env, ENV_TAGS, "")
                .split_whitespace()
                .map(str::to_string)
                .collect()
        } else {
            self.tags
        };
        let tags = merge_static_tags(tags, &service);

        ResolvedClientOptions {
            host,
            port,
            namespace,
            service,
            tags,
            debug: self.debug,
        }
    }
}

fn or_env<F>(value: String, env: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if value.is_empty() {
        env_string(env, name, default)
    } else {
        value
    }
}

/// Read `name`, falling back to `default` when unset or empty. The outcome is
/// logged so a misconfigured agent address is visible at startup.
fn env_string<F>(env: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    match env(name).filter(|v| !v.is_empty()) {
        Some(value) => {
            info!(variable = name, value = %value, default, "Using environment value");
            value
        }
        None => {
            info!(variable = name, default, "Environment variable unset, using default");
            default.to_string()
        }
    }
}

/// DogStatsD client built on `cadence`.
///
/// Datagrams are sent from a non-blocking UDP socket, so submissions never
/// wait on the agent. Sampling happens here: with a rate below 1 a metric is
/// dropped with probability `1 - rate` and counts carry the rate so the agent
/// scales them back up.
#[derive(Debug)]
pub struct DogStatsdClient {
    client: StatsdClient,
    tags: Vec<String>,
    closed: AtomicBool,
}

impl DogStatsdClient {
    /// Resolve `options` and connect to the agent.
    pub async fn connect(options: DatadogClientOptions) -> ExportResult<Self> {
        Self::connect_resolved(options.resolve()).await
    }

    /// Connect using already resolved settings.
    ///
    /// # Errors
    ///
    /// [`ExportError::InvalidAgentAddress`] when the port does not parse or the
    /// host does not resolve; I/O errors when the local socket cannot be set up.
    pub async fn connect_resolved(options: ResolvedClientOptions) -> ExportResult<Self> {
        let address = options.address();
        let port: u16 = options
            .port
            .parse()
            .map_err(|e| ExportError::invalid_agent_address(&address, format!("bad port: {}", e)))?;

        let target = lookup_host((options.host.as_str(), port))
            .await
            .map_err(|e| ExportError::invalid_agent_address(&address, e.to_string()))?
            .next()
            .ok_or_else(|| ExportError::invalid_agent_address(&address, "host did not resolve"))?;

        let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = std::net::UdpSocket::bind(local)?;
        socket.set_nonblocking(true)?;
        let sink = UdpMetricSink::from(target, socket)?;

        let mut builder = StatsdClient::builder(&options.namespace, sink);
        for tag in &options.tags {
            builder = match split_tag(tag) {
                (Some(key), value) => builder.with_tag(key, value),
                (None, value) => builder.with_tag_value(value),
            };
        }

        if options.debug {
            info!(
                host = %address,
                target = %target,
                namespace = %options.namespace,
                service = %options.service,
                tags = ?options.tags,
                "DogStatsD client connected"
            );
        }

        Ok(Self {
            client: builder.build(),
            tags: options.tags,
            closed: AtomicBool::new(false),
        })
    }

    /// Static tags attached to every metric
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Fails once closed; otherwise reports whether this submission is kept.
    fn admit(&self, rate: f64) -> ExportResult<bool> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ExportError::SinkClosed);
        }
        Ok(rate >= 1.0 || rand::random::<f64>() < rate)
    }
}

#[async_trait]
impl MetricSink for DogStatsdClient {
    async fn gauge(&self, name: &str, value: f64, tags: &[String], rate: f64) -> ExportResult<()> {
        if !self.admit(rate)? {
            return Ok(());
        }
        with_metric_tags(self.client.gauge_with_tags(name, value), tags).try_send()?;
        Ok(())
    }

    async fn count(&self, name: &str, value: i64, tags: &[String], rate: f64) -> ExportResult<()> {
        if !self.admit(rate)? {
            return Ok(());
        }
        let mut builder = self.client.count_with_tags(name, value);
        if rate < 1.0 {
            builder = builder.with_sampling_rate(rate);
        }
        with_metric_tags(builder, tags).try_send()?;
        Ok(())
    }

    async fn close(&self) -> ExportResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn with_metric_tags<'m, 'c, T>(
    mut builder: MetricBuilder<'m, 'c, T>,
    tags: &'m [String],
) -> MetricBuilder<'m, 'c, T>
where
    T: Metric + From<String>,
{
    for tag in tags {
        builder = match split_tag(tag) {
            (Some(key), value) => builder.with_tag(key, value),
            (None, value) => builder.with_tag_value(value),
        };
    }
    builder
}

/// `key:value` splits at the first colon; anything else is a bare value.
fn split_tag(tag: &str) -> (Option<&str>, &str) {
    match tag.split_once(':') {
        Some((key, value)) => (Some(key), value),
        None => (None, tag),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::net::UdpSocket;

    fn fake_env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_defaults() {
        let resolved = DatadogClientOptions::default().resolve_with(fake_env(&[]));
        assert_eq!(resolved.address(), "localhost:8125");
        assert_eq!(resolved.namespace, "groupcache");
        assert_eq!(resolved.service, "service-unknown");
        assert_eq!(resolved.tags, strings(&["service:service-unknown"]));
    }

    #[test]
    fn test_resolve_from_environment() {
        let resolved = DatadogClientOptions::default().resolve_with(fake_env(&[
            (ENV_AGENT_HOST, "agent.local"),
            (ENV_AGENT_PORT, "9125"),
            (ENV_SERVICE, "svc"),
            (ENV_TAGS, "  b a\ta "),
        ]));
        assert_eq!(resolved.address(), "agent.local:9125");
        assert_eq!(resolved.tags, strings(&["a", "b", "service:svc"]));
    }

    #[test]
    fn test_explicit_options_win_over_environment() {
        let options = DatadogClientOptions {
            host: "10.0.0.1".to_string(),
            service: "svc".to_string(),
            tags: strings(&["b", "a", "a"]),
            namespace: "cache".to_string(),
            ..Default::default()
        };
        let resolved = options.resolve_with(fake_env(&[
            (ENV_AGENT_HOST, "ignored"),
            (ENV_SERVICE, "ignored"),
            (ENV_TAGS, "ignored:tag"),
        ]));
        assert_eq!(resolved.host, "10.0.0.1");
        assert_eq!(resolved.port, "8125");
        assert_eq!(resolved.namespace, "cache");
        assert_eq!(resolved.tags, strings(&["a", "b", "service:svc"]));
    }

    #[tokio::test]
    async fn test_invalid_port_is_configuration_error() {
        let options = DatadogClientOptions {
            host: "127.0.0.1".to_string(),
            port: "not-a-port".to_string(),
            service: "svc".to_string(),
            tags: strings(&["x"]),
            ..Default::default()
        };
        let err = DogStatsdClient::connect(options).await.unwrap_err();
        assert!(err.is_configuration());
        assert!(matches!(err, ExportError::InvalidAgentAddress { address, .. } if address == "127.0.0.1:not-a-port"));
    }

    #[test]
    fn test_split_tag() {
        assert_eq!(split_tag("group:files"), (Some("group"), "files"));
        assert_eq!(split_tag("pod_name:web-1:a"), (Some("pod_name"), "web-1:a"));
        assert_eq!(split_tag("canary"), (None, "canary"));
    }

    fn parse_datagram(raw: &[u8]) -> (String, Vec<String>) {
        let line = std::str::from_utf8(raw).unwrap();
        let (head, tags) = line.split_once("|#").unwrap();
        let mut tags: Vec<String> = tags.split(',').map(str::to_string).collect();
        tags.sort();
        (head.to_string(), tags)
    }

    #[tokio::test]
    async fn test_sends_datagrams_and_refuses_after_close() {
        let agent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = agent.local_addr().unwrap().port();

        let options = DatadogClientOptions {
            host: "127.0.0.1".to_string(),
            port: port.to_string(),
            service: "svc".to_string(),
            tags: strings(&["env:test"]),
            debug: true,
            ..Default::default()
        };
        let client = DogStatsdClient::connect(options).await.unwrap();
        assert_eq!(client.tags(), strings(&["env:test", "service:svc"]).as_slice());

        let tags = strings(&["group:files"]);
        client.count("gets", -3, &tags, 1.0).await.unwrap();
        client.gauge("cache_bytes", 200.5, &tags, 1.0).await.unwrap();

        let expected_tags = strings(&["env:test", "group:files", "service:svc"]);
        let mut buf = [0u8; 512];
        let n = agent.recv(&mut buf).await.unwrap();
        assert_eq!(
            parse_datagram(&buf[..n]),
            ("groupcache.gets:-3|c".to_string(), expected_tags.clone())
        );
        let n = agent.recv(&mut buf).await.unwrap();
        assert_eq!(
            parse_datagram(&buf[..n]),
            ("groupcache.cache_bytes:200.5|g".to_string(), expected_tags)
        );

        client.close().await.unwrap();
        assert!(matches!(
            client.count("gets", 1, &tags, 1.0).await,
            Err(ExportError::SinkClosed)
        ));
    }
}
