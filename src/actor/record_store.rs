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

//! Record store actor
//!
//! Owns the user records loaded at startup. Nothing mutates the map after
//! construction; the actor exists so every reader goes through the same
//! command protocol as the session store and gets its own copy.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::actor::messages::RecordCommand;
use crate::actor::metrics::Metrics;
use crate::observability::metrics as prom_metrics;
use crate::store::{FindMode, RecordId, StoreError, UserRecord};

pub struct RecordStoreActor {
    records: HashMap<RecordId, UserRecord>,

    /// Incoming command channel
    rx: mpsc::Receiver<RecordCommand>,

    stop_rx: oneshot::Receiver<()>,

    metrics: Arc<Metrics>,
}

impl RecordStoreActor {
    /// Build the actor from decoded records, keyed by id.
    pub fn new(
        records: Vec<UserRecord>,
        rx: mpsc::Receiver<RecordCommand>,
        stop_rx: oneshot::Receiver<()>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let mut map = HashMap::with_capacity(records.len());
        for record in records {
            if let Some(prev) = map.insert(record.id.clone(), record) {
                tracing::warn!(id = %prev.id, "duplicate record id, keeping the later entry");
            }
        }

        Self {
            records: map,
            rx,
            stop_rx,
            metrics,
        }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        tracing::info!(records = self.records.len(), "RecordStoreActor started");

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

        tracing::info!("RecordStoreActor stopped");
    }

    fn handle(&self, cmd: RecordCommand) {
        self.metrics.inc_message_received();
        let op = cmd.name();
        let op_start = std::time::Instant::now();

        let result = match cmd {
            RecordCommand::FindAll { reply } => {
                let _ = reply.send(Ok(self.find_all()));
                Ok(())
            }

            RecordCommand::FindById { id, reply } => {
                let res = self.find_by_id(&id);
                let outcome = res.as_ref().map(|_| ()).map_err(|e| e.clone());
                let _ = reply.send(res);
                outcome
            }

            RecordCommand::FindByUserId {
                user_id,
                mode,
                reply,
            } => {
                let res = self.find_by_user_id(&user_id, mode);
                let outcome = res.as_ref().map(|_| ()).map_err(|e| e.clone());
                if let Err(e) = &res {
                    tracing::debug!(user_id = %user_id, ?mode, error = %e, "record lookup failed");
                }
                let _ = reply.send(res);
                outcome
            }

            RecordCommand::Count { reply } => {
                let _ = reply.send(Ok(self.records.len()));
                Ok(())
            }
        };

        self.metrics.record_outcome(result.is_ok());
        let label = match &result {
            Ok(()) => "ok",
            Err(e) => e.kind(),
        };
        prom_metrics::record_store_command("record", op, label, op_start.elapsed().as_secs_f64());
    }

    fn find_all(&self) -> Vec<UserRecord> {
        self.records.values().cloned().collect()
    }

    fn find_by_id(&self, id: &RecordId) -> Result<UserRecord, StoreError> {
        self.records.get(id).cloned().ok_or(StoreError::NotFound)
    }

    fn find_by_user_id(
        &self,
        user_id: &str,
        mode: FindMode,
    ) -> Result<Vec<UserRecord>, StoreError> {
        let mut results = Vec::new();
        for record in self.records.values() {
            if record.user_id == user_id {
                results.push(record.clone());
                if mode == FindMode::First {
                    break;
                }
            }
        }

        if results.is_empty() {
            return Err(StoreError::NotFound);
        }
        if mode == FindMode::Unique && results.len() > 1 {
            return Err(StoreError::MultipleResults);
        }
        Ok(results)
    }
}
