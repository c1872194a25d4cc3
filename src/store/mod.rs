//! Store interfaces for sessions and user records.
//!
//! Handlers only ever see these traits. The implementations live in
//! [`crate::actor`], where each store's state is owned by a single task.

use async_trait::async_trait;
use thiserror::Error;

pub mod record;
pub mod session;
pub mod sweeper;

pub use record::{FindMode, LoadError, RecordId, Role, UserRecord};
pub use session::{ConsistencyToken, SessionData, SessionId};
pub use sweeper::ExpirySweeper;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("invalid consistency token")]
    InvalidToken,
    #[error("bad parameter: {0}")]
    BadParameter(String),
    #[error("multiple results")]
    MultipleResults,
    #[error("invalid command")]
    InvalidCommand,
    #[error("not implemented")]
    NotImplemented,
    #[error("store error: {0}")]
    Other(String),
}

impl StoreError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound => "not_found",
            StoreError::InvalidToken => "invalid_token",
            StoreError::BadParameter(_) => "bad_parameter",
            StoreError::MultipleResults => "multiple_results",
            StoreError::InvalidCommand => "invalid_command",
            StoreError::NotImplemented => "not_implemented",
            StoreError::Other(_) => "other",
        }
    }
}

/// Per-browser login state with sliding expiry and optimistic concurrency.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Allocate a new, empty session and return its id.
    async fn create(&self) -> Result<SessionId, StoreError>;

    /// Read a copy of the session payload and its current consistency token.
    ///
    /// Extends the session's expiry as a side effect.
    async fn load_store(&self, id: &SessionId) -> Result<SessionData, StoreError>;

    /// Replace the payload. `data.consistency_token` must be the token from
    /// the most recent read, otherwise [`StoreError::InvalidToken`].
    async fn save_store(&self, id: &SessionId, data: SessionData) -> Result<(), StoreError>;

    async fn delete(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Drop every session whose expiry has passed. Returns how many were removed.
    async fn delete_expired(&self) -> Result<usize, StoreError>;

    /// Number of sessions physically held, including expired ones not yet swept.
    async fn count(&self) -> Result<usize, StoreError>;
}

/// Read-only user records loaded at startup.
#[async_trait]
pub trait RecordStore: Send + Sync + 'static {
    async fn find_all(&self) -> Result<Vec<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: &RecordId) -> Result<UserRecord, StoreError>;

    /// Look records up by their login name.
    async fn find_by_user_id(
        &self,
        user_id: &str,
        mode: FindMode,
    ) -> Result<Vec<UserRecord>, StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}
