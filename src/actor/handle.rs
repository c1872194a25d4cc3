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

//! Store implementations that delegate to the owning actors.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::actor::messages::{RecordCommand, SessionCommand};
use crate::actor::metrics::Metrics;
use crate::actor::send_command;
use crate::store::{
    FindMode, RecordId, RecordStore, SessionData, SessionId, SessionStore, StoreError, UserRecord,
};

/// Log failures the caller cannot be expected to handle.
fn log_unclassified<T>(store: &str, op: &str, res: &Result<T, StoreError>) {
    if let Err(StoreError::Other(msg)) = res {
        tracing::error!(store, op, "store command failed: {}", msg);
    }
}

/// Session store backed by a [`SessionStoreActor`](crate::actor::SessionStoreActor).
#[derive(Clone)]
pub struct ActorSessionStore {
    tx: mpsc::Sender<SessionCommand>,
    metrics: Arc<Metrics>,
}

impl ActorSessionStore {
    pub fn new(tx: mpsc::Sender<SessionCommand>, metrics: Arc<Metrics>) -> Self {
        Self { tx, metrics }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    async fn request<T>(
        &self,
        op: &str,
        make_command: impl FnOnce(crate::actor::messages::Reply<T>) -> SessionCommand,
    ) -> Result<T, StoreError> {
        self.metrics.inc_message_sent();
        let res = send_command(&self.tx, make_command).await;
        log_unclassified("session", op, &res);
        res
    }
}

#[async_trait]
impl SessionStore for ActorSessionStore {
    async fn create(&self) -> Result<SessionId, StoreError> {
        self.request("create", |reply| SessionCommand::Create { reply }).await
    }

    async fn load_store(&self, id: &SessionId) -> Result<SessionData, StoreError> {
        let id = id.clone();
        self.request("load_store", |reply| SessionCommand::LoadStore { id, reply }).await
    }

    async fn save_store(&self, id: &SessionId, data: SessionData) -> Result<(), StoreError> {
        let id = id.clone();
        self.request("save_store", |reply| SessionCommand::SaveStore { id, data, reply }).await
    }

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError> {
        let id = id.clone();
        self.request("delete", |reply| SessionCommand::Delete { id, reply }).await
    }

    async fn delete_expired(&self) -> Result<usize, StoreError> {
        self.request("delete_expired", |reply| SessionCommand::DeleteExpired { reply }).await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.request("count", |reply| SessionCommand::Count { reply }).await
    }
}

/// Record store backed by a [`RecordStoreActor`](crate::actor::RecordStoreActor).
#[derive(Clone)]
pub struct ActorRecordStore {
    tx: mpsc::Sender<RecordCommand>,
    metrics: Arc<Metrics>,
}

impl ActorRecordStore {
    pub fn new(tx: mpsc::Sender<RecordCommand>, metrics: Arc<Metrics>) -> Self {
        Self { tx, metrics }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    async fn request<T>(
        &self,
        op: &str,
        make_command: impl FnOnce(crate::actor::messages::Reply<T>) -> RecordCommand,
    ) -> Result<T, StoreError> {
        self.metrics.inc_message_sent();
        let res = send_command(&self.tx, make_command).await;
        log_unclassified("record", op, &res);
        res
    }
}

#[async_trait]
impl RecordStore for ActorRecordStore {
    async fn find_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        self.request("find_all", |reply| RecordCommand::FindAll { reply }).await
    }

    async fn find_by_id(&self, id: &RecordId) -> Result<UserRecord, StoreError> {
        let id = id.clone();
        self.request("find_by_id", |reply| RecordCommand::FindById { id, reply }).await
    }

    async fn find_by_user_id(
        &self,
        user_id: &str,
        mode: FindMode,
    ) -> Result<Vec<UserRecord>, StoreError> {
        let user_id = user_id.to_string();
        self.request("find_by_user_id", |reply| RecordCommand::FindByUserId {
            user_id,
            mode,
            reply,
        })
        .await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        self.request("count", |reply| RecordCommand::Count { reply }).await
    }
}
