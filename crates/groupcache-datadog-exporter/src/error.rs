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
//! Exporter error type.

use thiserror::Error;

/// Errors raised while configuring the exporter or submitting metrics.
///
/// Only configuration problems reach the caller of [`crate::Exporter::new`];
/// submission failures are logged by the polling loop and dropped.
#[derive(Error, Debug)]
pub enum ExportError {
    /// An exporter option is out of range
    #[error("Invalid exporter option '{field}': {reason}")]
    InvalidOption {
        /// Option name
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// The agent `host:port` cannot be parsed or resolved
    #[error("Invalid DogStatsD agent address '{address}': {reason}")]
    InvalidAgentAddress {
        /// Address as configured
        address: String,
        /// Parse or lookup failure
        reason: String,
    },

    /// Local socket setup failed
    #[error("IO error talking to the metrics agent: {0}")]
    Io(#[from] std::io::Error),

    /// The DogStatsD client rejected or failed to send a metric
    #[error("DogStatsD client error: {0}")]
    Client(#[from] cadence::MetricError),

    /// Submission after `close`
    #[error("Metric sink is closed")]
    SinkClosed,

    /// Any other sink failure
    #[error("Metric submission failed: {0}")]
    Sink(String),

    /// The exporter was created outside a tokio runtime
    #[error("No tokio runtime to run the export loop on: {0}")]
    Runtime(String),
}

impl ExportError {
    /// [`ExportError::InvalidOption`] from any string-like parts
    pub fn invalid_option(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ExportError::InvalidOption {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// [`ExportError::InvalidAgentAddress`] from any string-like parts
    pub fn invalid_agent_address(address: impl Into<String>, reason: impl Into<String>) -> Self {
        ExportError::InvalidAgentAddress {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// [`ExportError::Sink`] with a message
    pub fn sink(message: impl Into<String>) -> Self {
        ExportError::Sink(message.into())
    }

    /// True for errors that should stop the process at startup.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ExportError::InvalidOption { .. }
                | ExportError::InvalidAgentAddress { .. }
                | ExportError::Runtime(_)
        )
    }
}

/// Result alias for exporter operations
pub type ExportResult<T> = Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(ExportError::invalid_option("sample_rate", "must be > 0").is_configuration());
        assert!(ExportError::invalid_agent_address("nohost:x", "bad port").is_configuration());
        assert!(!ExportError::SinkClosed.is_configuration());
        assert!(!ExportError::sink("agent unreachable").is_configuration());
    }

    #[test]
    fn test_messages() {
        let err = ExportError::invalid_agent_address("localhost:99999", "port out of range");
        assert_eq!(
            err.to_string(),
            "Invalid DogStatsD agent address 'localhost:99999': port out of range"
        );
    }
}
