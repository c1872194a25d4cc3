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

//! Session store actor
//!
//! Owns the session map. Commands are handled one at a time, so the map
//! needs no lock. Expired entries stay in the map, invisible to callers,
//! until a `DeleteExpired` sweep removes them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::actor::messages::SessionCommand;
use crate::actor::metrics::Metrics;
use crate::observability::metrics as prom_metrics;
use crate::store::{ConsistencyToken, SessionData, SessionId, StoreError};

/// Default session lifetime, extended on every load and save.
pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::from_secs(3 * 60);

struct Entry {
    data: SessionData,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

pub struct SessionStoreActor {
    sessions: HashMap<SessionId, Entry>,

    lifetime: Duration,

    /// Incoming command channel
    rx: mpsc::Receiver<SessionCommand>,

    /// Fires (or is dropped) to stop the loop
    stop_rx: oneshot::Receiver<()>,

    metrics: Arc<Metrics>,
}

impl SessionStoreActor {
    pub fn new(
        lifetime: Duration,
        rx: mpsc::Receiver<SessionCommand>,
        stop_rx: oneshot::Receiver<()>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            sessions: HashMap::new(),
            lifetime,
            rx,
            stop_rx,
            metrics,
        }
    }

    /// Run the actor event loop
    ///
    /// Stops when the stop signal fires or every sender is gone. The stop
    /// branch is checked first, so nothing queued behind it is handled.
    pub async fn run(mut self) {
        tracing::info!(lifetime_secs = self.lifetime.as_secs(), "SessionStoreActor started");

        loop {
            tokio::select! {
                biased;

                _ = &mut self.stop_rx => break,

                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd),
                    None => break,
                },
            }
        }

        tracing::info!(remaining = self.sessions.len(), "SessionStoreActor stopped");
    }

    fn handle(&mut self, cmd: SessionCommand) {
        self.metrics.inc_message_received();
        let op = cmd.name();
        let op_start = std::time::Instant::now();

        let result = match cmd {
            SessionCommand::Create { reply } => {
                let res = Ok(self.handle_create());
                let _ = reply.send(res.clone());
                res.map(|_| ())
            }

            SessionCommand::LoadStore { id, reply } => {
                let res = self.handle_load_store(&id);
                let outcome = res.as_ref().map(|_| ()).map_err(|e| e.clone());
                let _ = reply.send(res);
                outcome
            }

            SessionCommand::SaveStore { id, data, reply } => {
                let res = self.handle_save_store(&id, data);
                let _ = reply.send(res.clone());
                res
            }

            SessionCommand::Delete { id, reply } => {
                let res = self.handle_delete(&id);
                let _ = reply.send(res.clone());
                res
            }

            SessionCommand::DeleteExpired { reply } => {
                let removed = self.handle_delete_expired();
                let _ = reply.send(Ok(removed));
                Ok(())
            }

            SessionCommand::Count { reply } => {
                let _ = reply.send(Ok(self.sessions.len()));
                Ok(())
            }
        };

        self.metrics.record_outcome(result.is_ok());
        let label = match &result {
            Ok(()) => "ok",
            Err(e) => e.kind(),
        };
        prom_metrics::record_store_command("session", op, label, op_start.elapsed().as_secs_f64());
        prom_metrics::set_sessions_active(self.sessions.len());
    }

    fn handle_create(&mut self) -> SessionId {
        let id = SessionId::generate();
        let expires_at = Instant::now() + self.lifetime;
        self.sessions.insert(
            id.clone(),
            Entry {
                data: SessionData::new(ConsistencyToken::generate()),
                expires_at,
            },
        );
        self.metrics.inc_sessions_created();
        tracing::debug!(session = %id, "session created");
        id
    }

    /// Look up a live entry. Expired entries read as absent.
    fn live_entry(&mut self, id: &SessionId, now: Instant) -> Result<&mut Entry, StoreError> {
        match self.sessions.get_mut(id) {
            Some(entry) if !entry.is_expired(now) => Ok(entry),
            _ => Err(StoreError::NotFound),
        }
    }

    fn handle_load_store(&mut self, id: &SessionId) -> Result<SessionData, StoreError> {
        let now = Instant::now();
        let lifetime = self.lifetime;
        let entry = self.live_entry(id, now)?;
        entry.expires_at = now + lifetime;
        tracing::debug!(session = %id, values = entry.data.values.len(), "session loaded");
        Ok(entry.data.clone())
    }

    fn handle_save_store(&mut self, id: &SessionId, data: SessionData) -> Result<(), StoreError> {
        let now = Instant::now();
        let lifetime = self.lifetime;
        let entry = self.live_entry(id, now)?;
        if entry.data.consistency_token != data.consistency_token {
            tracing::debug!(session = %id, "stale consistency token");
            return Err(StoreError::InvalidToken);
        }
        entry.data = SessionData {
            values: data.values,
            consistency_token: ConsistencyToken::generate(),
        };
        entry.expires_at = now + lifetime;
        tracing::debug!(session = %id, values = entry.data.values.len(), "session saved");
        Ok(())
    }

    fn handle_delete(&mut self, id: &SessionId) -> Result<(), StoreError> {
        self.live_entry(id, Instant::now())?;
        self.sessions.remove(id);
        self.metrics.inc_sessions_deleted();
        tracing::debug!(session = %id, "session deleted");
        Ok(())
    }

    fn handle_delete_expired(&mut self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|id, entry| {
            let expired = entry.is_expired(now);
            if expired {
                tracing::debug!(session = %id, "expired session removed");
            }
            !expired
        });
        let removed = before - self.sessions.len();
        self.metrics.add_sessions_swept(removed as u64);
        removed
    }
}
