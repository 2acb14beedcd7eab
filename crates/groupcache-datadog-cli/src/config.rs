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
//! Demo configuration file
//!
//! ```toml
//! [exporter]
//! export_interval_secs = 20
//! debug = true
//!
//! [datadog]
//! namespace = "groupcache"
//! tags = ["env:dev"]
//!
//! [demo]
//! query_interval_secs = 5
//! cache_bytes_limit = 8000
//! ttl_secs = 60
//! ```
//!
//! Every table and field is optional; command-line flags override the file.

use groupcache_datadog_exporter::{DatadogClientOptions, ExportError, ExporterOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors loading the demo configuration
#[derive(Error, Debug)]
pub enum DemoConfigError {
    /// The configuration file could not be read
    #[error("Failed to read configuration file {}: {source}", path.display())]
    Read {
        /// File that was requested
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`DemoConfig`]
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A `[demo]` setting is out of range
    #[error("Invalid demo setting '{field}': {reason}")]
    InvalidValue {
        /// Setting name
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// The `[exporter]` table failed exporter validation
    #[error(transparent)]
    Exporter(#[from] ExportError),
}

impl DemoConfigError {
    /// Create an invalid value error
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DemoConfigError::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for demo configuration
pub type DemoConfigResult<T> = Result<T, DemoConfigError>;

/// Size limit of the "files" group's main cache
pub const DEFAULT_CACHE_BYTES_LIMIT: usize = 8000;

/// Demo loop settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    /// Pause between two rounds of queries
    pub query_interval_secs: u64,

    /// Main cache capacity in bytes
    pub cache_bytes_limit: usize,

    /// Lifetime of a loaded value
    pub ttl_secs: u64,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            query_interval_secs: 5,
            cache_bytes_limit: DEFAULT_CACHE_BYTES_LIMIT,
            ttl_secs: 60,
        }
    }
}

impl DemoSettings {
    /// [`Self::query_interval_secs`] as a duration
    pub fn query_interval(&self) -> Duration {
        Duration::from_secs(self.query_interval_secs)
    }

    /// [`Self::ttl_secs`] as a duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Whole demo configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// `[exporter]` table
    pub exporter: ExporterOptions,
    /// `[datadog]` table
    pub datadog: DatadogClientOptions,
    /// `[demo]` table
    pub demo: DemoSettings,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            // The demo exports more often than the library default.
            exporter: ExporterOptions::default().with_export_interval(Duration::from_secs(20)),
            datadog: DatadogClientOptions::default(),
            demo: DemoSettings::default(),
        }
    }
}

impl DemoConfig {
    /// Read, parse and validate a TOML file
    pub async fn load_file(path: impl AsRef<Path>) -> DemoConfigResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading demo configuration");

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| DemoConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_toml(&content)?;

        info!(path = %path.display(), "Loaded demo configuration");
        Ok(config)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> DemoConfigResult<Self> {
        let config: DemoConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the exporter options and the demo settings
    pub fn validate(&self) -> DemoConfigResult<()> {
        self.exporter.validate()?;
        if self.demo.query_interval_secs == 0 {
            return Err(DemoConfigError::invalid_value(
                "query_interval_secs",
                "must be greater than zero",
            ));
        }
        if self.demo.cache_bytes_limit == 0 {
            return Err(DemoConfigError::invalid_value(
                "cache_bytes_limit",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}
