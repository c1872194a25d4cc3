// Copyright PingCAP Inc. 2025.
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; version 2 of the License.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use crate::observability::metrics as prom_metrics;
use crate::store::SessionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::{interval, MissedTickBehavior};

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Background task that purges expired sessions
///
/// Between sweeps an expired session is already invisible to callers but
/// still occupies memory. The sweep interval bounds how long that lasts.
pub struct ExpirySweeper {
    sessions: Arc<dyn SessionStore>,
    interval: Duration,
}

impl ExpirySweeper {
    pub fn new(sessions: Arc<dyn SessionStore>, interval: Duration) -> Self {
        Self { sessions, interval }
    }

    /// Spawn the sweeper as a background task
    ///
    /// The task exits when `stop_rx` fires or its sender is dropped.
    pub fn spawn(self, stop_rx: oneshot::Receiver<()>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run_loop(stop_rx).await;
        })
    }

    async fn run_loop(&self, mut stop_rx: oneshot::Receiver<()>) {
        tracing::info!(
            "Starting session sweeper (interval: {}s)",
            self.interval.as_secs()
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip the first immediate tick
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;

                _ = &mut stop_rx => break,

                _ = ticker.tick() => {
                    // Awaited inline, so at most one sweep is in flight
                    self.sweep_once().await;
                }
            }
        }

        tracing::info!("Session sweeper stopped");
    }

    /// Run a single sweep. Returns how many sessions were removed.
    pub async fn sweep_once(&self) -> usize {
        match self.sessions.delete_expired().await {
            Ok(removed) => {
                if removed > 0 {
                    tracing::info!(removed, "Session sweep completed");
                } else {
                    tracing::debug!("Session sweep: no expired sessions");
                }
                prom_metrics::increment_sessions_swept(removed);
                removed
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session sweep failed");
                0
            }
        }
    }
}
