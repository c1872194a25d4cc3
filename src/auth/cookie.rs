use axum::http::{header, HeaderMap, HeaderValue};

use crate::config::SessionConfig;
use crate::store::SessionId;

/// Name and lifetime of the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    max_age_secs: u64,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, max_age_secs: u64) -> Self {
        Self {
            name: name.into(),
            max_age_secs,
        }
    }

    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self::new(cfg.cookie_name.clone(), cfg.cookie_max_age_secs)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Session id from the request's `Cookie` header, if present and non-empty.
    pub fn read(&self, headers: &HeaderMap) -> Option<SessionId> {
        let prefix = format!("{}=", self.name);
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|s| s.split(';'))
            .map(|part| part.trim())
            .find_map(|part| part.strip_prefix(&prefix))
            .filter(|value| !value.is_empty())
            .map(SessionId::from)
    }

    /// `Set-Cookie` value carrying `id`.
    pub fn write(&self, id: &SessionId) -> Option<HeaderValue> {
        self.header(id.as_str(), self.max_age_secs)
    }

    /// `Set-Cookie` value that removes the cookie.
    pub fn clear(&self) -> Option<HeaderValue> {
        self.header("", 0)
    }

    fn header(&self, value: &str, max_age: u64) -> Option<HeaderValue> {
        let s = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, value, max_age
        );
        match HeaderValue::from_str(&s) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(cookie = %self.name, error = %e, "invalid cookie header");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie() -> SessionCookie {
        SessionCookie::new("sid", 3600)
    }

    #[test]
    fn test_read_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, "theme=dark; sid=abc-123; lang=en".parse().unwrap());
        assert_eq!(cookie().read(&headers), Some(SessionId::from("abc-123")));
    }

    #[test]
    fn test_read_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(cookie().read(&headers), None);

        headers.insert(header::COOKIE, "sid=; other=1".parse().unwrap());
        assert_eq!(cookie().read(&headers), None);

        // Prefix of another cookie name must not match
        headers.insert(header::COOKIE, "sidx=1".parse().unwrap());
        assert_eq!(cookie().read(&headers), None);
    }

    #[test]
    fn test_write_and_clear() {
        let set = cookie().write(&SessionId::from("abc")).unwrap();
        assert_eq!(set, "sid=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600");

        let cleared = cookie().clear().unwrap();
        assert_eq!(cleared, "sid=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    }
}
