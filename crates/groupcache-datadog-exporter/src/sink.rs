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
//! Destination for exported metrics.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::ExportResult;

/// A StatsD-style metrics client.
///
/// Implemented by [`crate::DogStatsdClient`] for a real agent and by the sinks
/// in [`crate::mock`] for local runs and tests. Methods take `&self` so the
/// sink can be shared between the polling task and [`crate::Exporter::close`].
///
/// # Errors
///
/// `gauge` and `count` fail when a single observation cannot be submitted;
/// the exporter logs such failures and moves on to the next metric.
#[async_trait]
pub trait MetricSink: Send + Sync + Debug {
    /// Record the value of a metric at this instant.
    async fn gauge(&self, name: &str, value: f64, tags: &[String], rate: f64) -> ExportResult<()>;

    /// Record how many times something happened since the last report.
    async fn count(&self, name: &str, value: i64, tags: &[String], rate: f64) -> ExportResult<()>;

    /// Flush and release the client.
    async fn close(&self) -> ExportResult<()>;
}
