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
//! Query loop driving traffic through a simulated group

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::simulated::{SimulatedGroup, FAKE_KEY_PREFIX};

/// Key queried every round; cached after the first load.
pub const DEFAULT_REPEAT_KEY: &str = "/etc/passwd";

/// Fetch `key` once and log the answer size and latency.
pub async fn query(group: &SimulatedGroup, key: &str) -> Option<usize> {
    let begin = Instant::now();
    let result = group.get(key).await;
    let elapsed = begin.elapsed();

    match result {
        Ok(value) => {
            info!(key, bytes = value.len(), elapsed = ?elapsed, "Cache answer");
            Some(value.len())
        }
        Err(e) => {
            warn!(key, error = %e, elapsed = ?elapsed, "Cache query failed");
            None
        }
    }
}

/// Query `repeat_key` and a fresh `fake-<n>` key every `interval` until
/// `shutdown` completes. Returns the number of rounds run.
///
/// The repeated key should hit after its first load; the fresh keys always
/// miss and push older entries out of the main cache.
pub async fn query_loop<F>(
    group: &SimulatedGroup,
    repeat_key: &str,
    interval: Duration,
    shutdown: F,
) -> u64
where
    F: Future<Output = ()>,
{
    let mut shutdown = std::pin::pin!(shutdown);
    let mut rounds = 0u64;

    loop {
        query(group, repeat_key).await;
        query(group, &format!("{}{}", FAKE_KEY_PREFIX, rounds)).await;
        rounds += 1;

        tokio::select! {
            _ = &mut shutdown => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    rounds
}

/// Wait for Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
