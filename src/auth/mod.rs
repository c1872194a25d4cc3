use std::sync::Arc;
use thiserror::Error;

use crate::observability::metrics as prom_metrics;
use crate::store::{FindMode, RecordStore, Role, SessionId, SessionStore, StoreError, UserRecord};

pub mod cookie;
pub mod password;

pub use cookie::SessionCookie;
pub use password::PasswordHasher;

/// Session payload key holding the logged-in user's login name.
pub const USER_ID_KEY: &str = "user_id";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no session")]
    NoSession,
    #[error("session has no user")]
    NoUser,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("access denied")]
    Denied,
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("internal auth error: {0}")]
    Internal(String),
}

/// Login, logout and access checks on top of the two stores.
#[derive(Clone)]
pub struct Authenticator {
    sessions: Arc<dyn SessionStore>,
    records: Arc<dyn RecordStore>,
    hasher: PasswordHasher,
}

impl Authenticator {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        records: Arc<dyn RecordStore>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            sessions,
            records,
            hasher,
        }
    }

    /// Verify credentials and open a session bound to `user_id`.
    ///
    /// Returns the new session id and the matched record.
    pub async fn login(
        &self,
        user_id: &str,
        password: &str,
    ) -> Result<(SessionId, UserRecord), AuthError> {
        let record = match self.first_record(user_id).await {
            Ok(record) => record,
            Err(AuthError::Store(StoreError::NotFound)) => {
                prom_metrics::increment_auth_failure("login");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        if !self.hasher.verify(password, &record.password) {
            prom_metrics::increment_auth_failure("login");
            return Err(AuthError::InvalidCredentials);
        }

        let id = self.sessions.create().await?;
        let mut data = self.sessions.load_store(&id).await?;
        data.insert(USER_ID_KEY, user_id);
        self.sessions.save_store(&id, data).await?;

        prom_metrics::increment_auth_success("login");
        tracing::info!(user_id, "user logged in");
        Ok((id, record))
    }

    pub async fn logout(&self, id: &SessionId) -> Result<(), AuthError> {
        self.sessions.delete(id).await?;
        tracing::debug!("session deleted");
        Ok(())
    }

    /// Login name bound to the session. Loading also extends the session.
    pub async fn session_user(&self, id: Option<&SessionId>) -> Result<String, AuthError> {
        let id = id.ok_or(AuthError::NoSession)?;
        let data = self.sessions.load_store(id).await?;
        data.get(USER_ID_KEY)
            .map(str::to_string)
            .ok_or(AuthError::NoUser)
    }

    /// Allow only the session whose user is `user_id`.
    pub async fn check_user_id(
        &self,
        id: Option<&SessionId>,
        user_id: &str,
    ) -> Result<(), AuthError> {
        let res = match self.session_user(id).await {
            Ok(current) if current == user_id => Ok(()),
            Ok(_) => Err(AuthError::Denied),
            Err(e) => Err(e),
        };
        record_check("user_id", &res);
        res
    }

    /// Allow only a session whose user holds `role`. Returns the user's record.
    pub async fn check_role(
        &self,
        id: Option<&SessionId>,
        role: Role,
    ) -> Result<UserRecord, AuthError> {
        let res = self.session_record_with_role(id, role).await;
        record_check("role", &res);
        res
    }

    async fn session_record_with_role(
        &self,
        id: Option<&SessionId>,
        role: Role,
    ) -> Result<UserRecord, AuthError> {
        let user_id = self.session_user(id).await?;
        let record = self.first_record(&user_id).await?;
        if record.has_role(role) {
            Ok(record)
        } else {
            Err(AuthError::Denied)
        }
    }

    pub async fn has_role_by_user_id(&self, user_id: &str, role: Role) -> Result<bool, AuthError> {
        Ok(self.first_record(user_id).await?.has_role(role))
    }

    async fn first_record(&self, user_id: &str) -> Result<UserRecord, AuthError> {
        self.records
            .find_by_user_id(user_id, FindMode::First)
            .await?
            .into_iter()
            .next()
            .ok_or(AuthError::Store(StoreError::NotFound))
    }
}

fn record_check<T>(check: &str, res: &Result<T, AuthError>) {
    match res {
        Ok(_) => prom_metrics::increment_auth_success(check),
        Err(e) => {
            tracing::debug!(check, error = %e, "access check denied");
            prom_metrics::increment_auth_failure(check);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{
        ActorRecordStore, ActorSessionStore, Metrics, RecordStoreActor, SessionStoreActor,
    };
    use crate::store::record::PasswordDigest;
    use crate::store::RecordId;
    use std::time::Duration;
    use tokio::sync::{mpsc, oneshot};

    struct Fixture {
        auth: Authenticator,
        sessions: Arc<dyn SessionStore>,
        _stops: Vec<oneshot::Sender<()>>,
    }

    fn record(id: &str, user_id: &str, hasher: &PasswordHasher, pw: &str, roles: Vec<Role>) -> UserRecord {
        UserRecord {
            id: RecordId::from(id),
            user_id: user_id.to_string(),
            password: PasswordDigest::new(hasher.digest(pw)),
            full_name: user_id.to_uppercase(),
            roles,
        }
    }

    fn fixture() -> Fixture {
        let hasher = PasswordHasher::new(b"test-key").unwrap();
        let records = vec![
            record("1", "alice", &hasher, "alice-pw", vec![Role::Admin]),
            record("2", "bob", &hasher, "bob-pw", vec![Role::User]),
        ];

        let (s_tx, s_rx) = mpsc::channel(16);
        let (s_stop_tx, s_stop_rx) = oneshot::channel();
        let metrics = Arc::new(Metrics::new());
        tokio::spawn(
            SessionStoreActor::new(Duration::from_secs(180), s_rx, s_stop_rx, metrics.clone()).run(),
        );
        let sessions: Arc<dyn SessionStore> = Arc::new(ActorSessionStore::new(s_tx, metrics));

        let (r_tx, r_rx) = mpsc::channel(16);
        let (r_stop_tx, r_stop_rx) = oneshot::channel();
        let metrics = Arc::new(Metrics::new());
        tokio::spawn(RecordStoreActor::new(records, r_rx, r_stop_rx, metrics.clone()).run());
        let records: Arc<dyn RecordStore> = Arc::new(ActorRecordStore::new(r_tx, metrics));

        Fixture {
            auth: Authenticator::new(sessions.clone(), records, hasher),
            sessions,
            _stops: vec![s_stop_tx, r_stop_tx],
        }
    }

    #[tokio::test]
    async fn test_login_binds_user_to_session() {
        let f = fixture();
        let (id, rec) = f.auth.login("alice", "alice-pw").await.unwrap();
        assert_eq!(rec.user_id, "alice");

        let data = f.sessions.load_store(&id).await.unwrap();
        assert_eq!(data.get(USER_ID_KEY), Some("alice"));
        assert_eq!(f.auth.session_user(Some(&id)).await.unwrap(), "alice");
    }

    #[tokio::test]
    async fn test_login_rejects_bad_password_and_unknown_user() {
        let f = fixture();
        assert!(matches!(
            f.auth.login("alice", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            f.auth.login("nobody", "x").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert_eq!(f.sessions.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_check_user_id() {
        let f = fixture();
        let (id, _) = f.auth.login("bob", "bob-pw").await.unwrap();

        assert!(f.auth.check_user_id(Some(&id), "bob").await.is_ok());
        assert!(matches!(
            f.auth.check_user_id(Some(&id), "alice").await,
            Err(AuthError::Denied)
        ));
        assert!(matches!(
            f.auth.check_user_id(None, "bob").await,
            Err(AuthError::NoSession)
        ));
        assert!(matches!(
            f.auth.check_user_id(Some(&SessionId::from("bogus")), "bob").await,
            Err(AuthError::Store(StoreError::NotFound))
        ));
    }

    #[tokio::test]
    async fn test_check_role() {
        let f = fixture();
        let (admin, _) = f.auth.login("alice", "alice-pw").await.unwrap();
        let (user, _) = f.auth.login("bob", "bob-pw").await.unwrap();

        let rec = f.auth.check_role(Some(&admin), Role::Admin).await.unwrap();
        assert_eq!(rec.user_id, "alice");
        assert!(matches!(
            f.auth.check_role(Some(&user), Role::Admin).await,
            Err(AuthError::Denied)
        ));
        assert!(f.auth.has_role_by_user_id("bob", Role::User).await.unwrap());
        assert!(!f.auth.has_role_by_user_id("bob", Role::Admin).await.unwrap());
    }

    #[tokio::test]
    async fn test_logout_deletes_session() {
        let f = fixture();
        let (id, _) = f.auth.login("bob", "bob-pw").await.unwrap();
        f.auth.logout(&id).await.unwrap();

        assert!(matches!(
            f.auth.session_user(Some(&id)).await,
            Err(AuthError::Store(StoreError::NotFound))
        ));
        assert!(matches!(
            f.auth.logout(&id).await,
            Err(AuthError::Store(StoreError::NotFound))
        ));
    }
}
