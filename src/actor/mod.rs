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

//! Actor-based stores for gatehouse
//!
//! Each store's state is owned by exactly one task. Callers never touch it
//! directly: they send a command carrying a oneshot reply slot and await the
//! answer. The owner handles commands strictly in arrival order, which makes
//! every store operation linearizable without any lock.

pub mod handle;
pub mod messages;
pub mod metrics;
pub mod record_store;
pub mod session_store;

pub use handle::{ActorRecordStore, ActorSessionStore};
pub use messages::{RecordCommand, SessionCommand};
pub use metrics::Metrics;
pub use record_store::RecordStoreActor;
pub use session_store::{SessionStoreActor, DEFAULT_SESSION_LIFETIME};

use tokio::sync::{mpsc, oneshot};

use crate::store::StoreError;

/// Send a command to an actor and wait for its reply.
///
/// A closed channel or a dropped reply slot means the owner has stopped;
/// both surface as [`StoreError::Other`].
pub async fn send_command<C, T>(
    actor_tx: &mpsc::Sender<C>,
    make_command: impl FnOnce(oneshot::Sender<Result<T, StoreError>>) -> C,
) -> Result<T, StoreError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    let cmd = make_command(reply_tx);

    actor_tx
        .send(cmd)
        .await
        .map_err(|_| StoreError::Other("actor channel closed".to_string()))?;

    reply_rx
        .await
        .map_err(|_| StoreError::Other("actor reply failed".to_string()))?
}
