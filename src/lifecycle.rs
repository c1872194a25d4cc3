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

//! Start and stop the stores.
//!
//! Startup spawns each owner task (and, for sessions, the sweeper).
//! Shutdown stops the sweeper first, waits a short grace period so no sweep
//! is left talking to a stopped owner, then stops the owners.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::actor::{
    ActorRecordStore, ActorSessionStore, Metrics, RecordStoreActor, SessionStoreActor,
};
use crate::config::{Config, RecordConfig, SessionConfig};
use crate::store::record::load_records;
use crate::store::{ExpirySweeper, LoadError, RecordStore, SessionStore};

/// A spawned task together with the signal that stops it.
struct Stoppable {
    name: &'static str,
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl Stoppable {
    async fn stop(self) {
        // Err means the task already exited
        let _ = self.stop_tx.send(());
        if let Err(e) = self.handle.await {
            tracing::warn!(task = self.name, error = %e, "task ended abnormally");
        }
    }
}

/// Running session store: owner task plus expiry sweeper.
pub struct SessionService {
    store: ActorSessionStore,
    owner: Stoppable,
    sweeper: Stoppable,
    stop_grace: Duration,
}

impl SessionService {
    pub fn start(cfg: &SessionConfig) -> Self {
        let metrics = Arc::new(Metrics::new());
        let (tx, rx) = mpsc::channel(cfg.channel_capacity);
        let (owner_stop_tx, owner_stop_rx) = oneshot::channel();

        let actor = SessionStoreActor::new(cfg.lifetime(), rx, owner_stop_rx, metrics.clone());
        let owner = Stoppable {
            name: "session-store",
            stop_tx: owner_stop_tx,
            handle: tokio::spawn(actor.run()),
        };

        let store = ActorSessionStore::new(tx, metrics);

        let (sweeper_stop_tx, sweeper_stop_rx) = oneshot::channel();
        let sweeper = ExpirySweeper::new(Arc::new(store.clone()), cfg.sweep_interval());
        let sweeper = Stoppable {
            name: "session-sweeper",
            stop_tx: sweeper_stop_tx,
            handle: sweeper.spawn(sweeper_stop_rx),
        };

        Self {
            store,
            owner,
            sweeper,
            stop_grace: cfg.stop_grace(),
        }
    }

    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::new(self.store.clone())
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.store.metrics().clone()
    }

    pub async fn stop(self) {
        self.sweeper.stop().await;
        tokio::time::sleep(self.stop_grace).await;
        self.owner.stop().await;

        let metrics = self.store.metrics();
        tracing::info!(
            commands_ok = metrics.get_commands_ok(),
            commands_failed = metrics.get_commands_failed(),
            sessions_created = metrics.get_sessions_created(),
            sessions_deleted = metrics.get_sessions_deleted(),
            sessions_swept = metrics.get_sessions_swept(),
            unanswered = metrics.get_message_queue_depth(),
            "session service stopped"
        );
    }
}

/// Running record store.
pub struct RecordService {
    store: ActorRecordStore,
    owner: Stoppable,
}

impl RecordService {
    /// Load the users file and spawn the owner. A load failure is fatal.
    pub async fn start(cfg: &RecordConfig) -> Result<Self, LoadError> {
        let records = load_records(&cfg.path).await?;
        tracing::info!(path = %cfg.path.display(), count = records.len(), "user records loaded");

        let metrics = Arc::new(Metrics::new());
        let (tx, rx) = mpsc::channel(cfg.channel_capacity);
        let (stop_tx, stop_rx) = oneshot::channel();

        let actor = RecordStoreActor::new(records, rx, stop_rx, metrics.clone());
        let owner = Stoppable {
            name: "record-store",
            stop_tx,
            handle: tokio::spawn(actor.run()),
        };

        Ok(Self {
            store: ActorRecordStore::new(tx, metrics),
            owner,
        })
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        Arc::new(self.store.clone())
    }

    pub fn metrics(&self) -> Arc<Metrics> {
        self.store.metrics().clone()
    }

    pub async fn stop(self) {
        self.owner.stop().await;

        let metrics = self.store.metrics();
        tracing::info!(
            commands_ok = metrics.get_commands_ok(),
            commands_failed = metrics.get_commands_failed(),
            "record service stopped"
        );
    }
}

/// Both stores, started and stopped together.
pub struct Stores {
    pub sessions: SessionService,
    pub records: RecordService,
}

impl Stores {
    pub async fn start(cfg: &Config) -> Result<Self, LoadError> {
        let records = RecordService::start(&cfg.records).await?;
        let sessions = SessionService::start(&cfg.session);
        Ok(Self { sessions, records })
    }

    pub async fn stop(self) {
        self.sessions.stop().await;
        self.records.stop().await;
        tracing::info!("stores stopped");
    }
}
