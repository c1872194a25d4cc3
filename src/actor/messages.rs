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

//! Message types for actor communication
//!
//! Every command carries its own oneshot reply slot. The owning actor
//! answers each command exactly once.

use tokio::sync::oneshot;

use crate::store::{FindMode, RecordId, SessionData, SessionId, StoreError, UserRecord};

pub type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

/// Commands sent to the SessionStoreActor
#[derive(Debug)]
pub enum SessionCommand {
    /// Allocate a new empty session
    Create { reply: Reply<SessionId> },

    /// Read a session's payload (slides its expiry)
    LoadStore {
        id: SessionId,
        reply: Reply<SessionData>,
    },

    /// Replace a session's payload if the token is current
    SaveStore {
        id: SessionId,
        data: SessionData,
        reply: Reply<()>,
    },

    /// Remove a live session
    Delete { id: SessionId, reply: Reply<()> },

    /// Remove every expired session
    DeleteExpired { reply: Reply<usize> },

    /// Number of sessions held
    Count { reply: Reply<usize> },
}

impl SessionCommand {
    pub fn name(&self) -> &'static str {
        match self {
            SessionCommand::Create { .. } => "create",
            SessionCommand::LoadStore { .. } => "load_store",
            SessionCommand::SaveStore { .. } => "save_store",
            SessionCommand::Delete { .. } => "delete",
            SessionCommand::DeleteExpired { .. } => "delete_expired",
            SessionCommand::Count { .. } => "count",
        }
    }
}

/// Commands sent to the RecordStoreActor
#[derive(Debug)]
pub enum RecordCommand {
    FindAll {
        reply: Reply<Vec<UserRecord>>,
    },

    FindById {
        id: RecordId,
        reply: Reply<UserRecord>,
    },

    FindByUserId {
        user_id: String,
        mode: FindMode,
        reply: Reply<Vec<UserRecord>>,
    },

    Count {
        reply: Reply<usize>,
    },
}

impl RecordCommand {
    pub fn name(&self) -> &'static str {
        match self {
            RecordCommand::FindAll { .. } => "find_all",
            RecordCommand::FindById { .. } => "find_by_id",
            RecordCommand::FindByUserId { .. } => "find_by_user_id",
            RecordCommand::Count { .. } => "count",
        }
    }
}
