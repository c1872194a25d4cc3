use crate::auth::{Authenticator, PasswordHasher, SessionCookie};
use crate::store::{RecordStore, SessionStore};
use std::sync::Arc;

/// Shared state for the web handlers
#[derive(Clone)]
pub struct BaseHandler {
    pub sessions: Arc<dyn SessionStore>,
    pub records: Arc<dyn RecordStore>,
    pub auth: Authenticator,
    pub cookie: SessionCookie,
}

impl BaseHandler {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        records: Arc<dyn RecordStore>,
        hasher: PasswordHasher,
        cookie: SessionCookie,
    ) -> Self {
        let auth = Authenticator::new(sessions.clone(), records.clone(), hasher);
        Self {
            sessions,
            records,
            auth,
            cookie,
        }
    }
}
