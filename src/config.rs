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

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::actor::DEFAULT_SESSION_LIFETIME;
use crate::store::sweeper::DEFAULT_SWEEP_INTERVAL;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP listen address, e.g. "127.0.0.1:3000"
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub records: RecordConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            session: SessionConfig::default(),
            records: RecordConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Sliding session lifetime in seconds
    #[serde(default = "default_lifetime_secs")]
    pub lifetime_secs: u64,
    /// Interval between expiry sweeps in seconds
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Pause between stopping the sweeper and stopping the store
    #[serde(default = "default_stop_grace_ms")]
    pub stop_grace_ms: u64,
    /// Bound of the command channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_cookie_max_age_secs")]
    pub cookie_max_age_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime_secs: default_lifetime_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            stop_grace_ms: default_stop_grace_ms(),
            channel_capacity: default_channel_capacity(),
            cookie_name: default_cookie_name(),
            cookie_max_age_secs: default_cookie_max_age_secs(),
        }
    }
}

impl SessionConfig {
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordConfig {
    /// JSON file with the user records, read once at startup
    #[serde(default = "default_records_path")]
    pub path: PathBuf,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            path: default_records_path(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Key for the password digest. Must match the key the users file was hashed with.
    #[serde(default = "default_password_key")]
    pub password_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            password_key: default_password_key(),
        }
    }
}

impl Config {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml(&s).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validate().map_err(|reason| ConfigError::Invalid {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(cfg)
    }

    /// Reject values the runtime cannot work with.
    ///
    /// Timer periods, lifetimes and channel bounds must be non-zero.
    pub fn validate(&self) -> Result<(), String> {
        let non_zero = [
            ("session.lifetime_secs", self.session.lifetime_secs),
            ("session.sweep_interval_secs", self.session.sweep_interval_secs),
            ("session.channel_capacity", self.session.channel_capacity as u64),
            ("records.channel_capacity", self.records.channel_capacity as u64),
        ];
        if let Some((field, _)) = non_zero.iter().find(|(_, v)| *v == 0) {
            return Err(format!("{} must be greater than zero", field));
        }
        if self.session.cookie_name.is_empty() {
            return Err("session.cookie_name must not be empty".to_string());
        }
        Ok(())
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_lifetime_secs() -> u64 {
    DEFAULT_SESSION_LIFETIME.as_secs()
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL.as_secs()
}

fn default_stop_grace_ms() -> u64 {
    100
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_cookie_name() -> String {
    "gatehouse_session_id".to_string()
}

fn default_cookie_max_age_secs() -> u64 {
    3600 // 1 hour
}

fn default_records_path() -> PathBuf {
    PathBuf::from("data/users.json")
}

fn default_password_key() -> String {
    "change-me".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg.listen_addr, "127.0.0.1:3000");
        assert_eq!(cfg.session.lifetime(), Duration::from_secs(180));
        assert_eq!(cfg.session.sweep_interval(), Duration::from_secs(60));
        assert_eq!(cfg.session.stop_grace(), Duration::from_millis(100));
        assert_eq!(cfg.session.cookie_name, "gatehouse_session_id");
        assert_eq!(cfg.records.path, PathBuf::from("data/users.json"));
    }

    #[test]
    fn test_partial_override() {
        let cfg = Config::from_toml(
            r#"
            listen_addr = "0.0.0.0:8080"

            [session]
            lifetime_secs = 30

            [records]
            path = "/srv/users.json"

            [auth]
            password_key = "k"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.session.lifetime_secs, 30);
        assert_eq!(cfg.session.sweep_interval_secs, 60);
        assert_eq!(cfg.records.path, PathBuf::from("/srv/users.json"));
        assert_eq!(cfg.auth.password_key, "k");
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        for (toml, field) in [
            ("[session]\nsweep_interval_secs = 0", "session.sweep_interval_secs"),
            ("[session]\nlifetime_secs = 0", "session.lifetime_secs"),
            ("[session]\nchannel_capacity = 0", "session.channel_capacity"),
            ("[records]\nchannel_capacity = 0", "records.channel_capacity"),
        ] {
            let cfg = Config::from_toml(toml).unwrap();
            let reason = cfg.validate().unwrap_err();
            assert!(reason.contains(field), "{}: {}", toml, reason);
        }

        let cfg = Config::from_toml("[session]\ncookie_name = \"\"").unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_from_path_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatehouse.toml");
        let contents = "[session]\nsweep_interval_secs = 0\nchannel_capacity = 0\n";
        std::fs::write(&path, contents).unwrap();

        let err = Config::from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("sweep_interval_secs"));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_path("/nonexistent/gatehouse.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
