//! User records and the startup file they are read from.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Primary key of a user record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hex-encoded keyed password digest, as stored in the users file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw digest bytes. Either hex case is accepted; `None` if malformed.
    pub fn decode(&self) -> Option<Vec<u8>> {
        let hex = self.0.as_bytes();
        if hex.len() % 2 != 0 || !hex.iter().all(u8::is_ascii_hexdigit) {
            return None;
        }
        hex.chunks(2)
            .map(|pair| {
                let pair = std::str::from_utf8(pair).ok()?;
                u8::from_str_radix(pair, 16).ok()
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::User => f.write_str("user"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: RecordId,
    /// Login name. Not guaranteed unique across records.
    pub user_id: String,
    pub password: PasswordDigest,
    pub full_name: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl UserRecord {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Cardinality expected from a secondary-key lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindMode {
    /// Every match.
    All,
    /// Stop at the first match.
    First,
    /// Every match, but more than one is an error.
    Unique,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read and decode the whole users file.
pub async fn load_records(path: &Path) -> Result<Vec<UserRecord>, LoadError> {
    let raw = tokio::fs::read(path).await.map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const USERS: &str = r#"[
        {"id": "1", "user_id": "alice", "password": "aa11", "full_name": "Alice", "roles": ["admin", "user"]},
        {"id": "2", "user_id": "bob", "password": "bb22", "full_name": "Bob"}
    ]"#;

    #[tokio::test]
    async fn test_load_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, USERS).unwrap();

        let records = load_records(&path).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].user_id, "alice");
        assert!(records[0].has_role(Role::Admin));
        assert!(records[1].roles.is_empty());
        assert!(!records[1].has_role(Role::User));
    }

    #[tokio::test]
    async fn test_load_records_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_records(&dir.path().join("nope.json")).await.unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
    }

    #[tokio::test]
    async fn test_load_records_malformed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, r#"[{"id": "1"}]"#).unwrap();

        let err = load_records(&path).await.unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
        assert!(err.to_string().contains("users.json"));
    }

    #[test]
    fn test_digest_decode() {
        let expected = Some(vec![0xab, 0xcd, 0xef, 0x01]);
        assert_eq!(PasswordDigest::new("ABCDEF01").decode(), expected);
        assert_eq!(PasswordDigest::new("abcdef01").decode(), expected);
        assert_eq!(PasswordDigest::new("").decode(), Some(vec![]));

        assert_eq!(PasswordDigest::new("abc").decode(), None);
        assert_eq!(PasswordDigest::new("zz00").decode(), None);
        assert_eq!(PasswordDigest::new("+1").decode(), None);
        assert_eq!(PasswordDigest::new("é0").decode(), None);
    }
}
