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
//! Exporter options.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ExportError, ExportResult};

/// Default tag key for the local host name (Kubernetes pod name)
pub const DEFAULT_HOSTNAME_TAG_KEY: &str = "pod_name";

/// Default time between export cycles
pub const DEFAULT_EXPORT_INTERVAL: Duration = Duration::from_secs(60);

/// Options controlling the polling loop.
///
/// Deserializes from a config table where the interval is given in seconds:
///
/// ```toml
/// sample_rate = 1.0
/// export_interval_secs = 20
/// hostname_tag_key = "pod_name"
/// disable_hostname_tag = false
/// debug = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterOptions {
    /// Sample rate passed to every sink call, in (0, 1]
    pub sample_rate: f64,

    /// Time between export cycles
    #[serde(rename = "export_interval_secs", with = "duration_secs")]
    pub export_interval: Duration,

    /// Tag key carrying the local host name
    pub hostname_tag_key: String,

    /// Do not tag metrics with the host name
    pub disable_hostname_tag: bool,

    /// Log every metric before it is submitted
    pub debug: bool,
}

impl Default for ExporterOptions {
    fn default() -> Self {
        Self {
            sample_rate: 1.0,
            export_interval: DEFAULT_EXPORT_INTERVAL,
            hostname_tag_key: DEFAULT_HOSTNAME_TAG_KEY.to_string(),
            disable_hostname_tag: false,
            debug: false,
        }
    }
}

impl ExporterOptions {
    /// Set the sample rate
    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Set the export interval
    pub fn with_export_interval(mut self, interval: Duration) -> Self {
        self.export_interval = interval;
        self
    }

    /// Set the hostname tag key
    pub fn with_hostname_tag_key(mut self, key: impl Into<String>) -> Self {
        self.hostname_tag_key = key.into();
        self
    }

    /// Suppress the hostname tag
    pub fn without_hostname_tag(mut self) -> Self {
        self.disable_hostname_tag = true;
        self
    }

    /// Enable per-metric debug logging
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Check option values; called by [`crate::Exporter::new`].
    pub fn validate(&self) -> ExportResult<()> {
        if !(self.sample_rate > 0.0 && self.sample_rate <= 1.0) {
            return Err(ExportError::invalid_option(
                "sample_rate",
                format!("must be in (0, 1], got {}", self.sample_rate),
            ));
        }
        if self.export_interval.is_zero() {
            return Err(ExportError::invalid_option(
                "export_interval",
                "must be greater than zero",
            ));
        }
        if !self.disable_hostname_tag && self.hostname_tag_key.trim().is_empty() {
            return Err(ExportError::invalid_option(
                "hostname_tag_key",
                "must not be empty unless the hostname tag is disabled",
            ));
        }
        Ok(())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
