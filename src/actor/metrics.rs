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

//! Lock-free metrics using atomics
//!
//! Each actor and its handles share one `Metrics` instance. Counters are
//! updated with relaxed atomics, so reading them never touches the actor.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free actor counters
#[derive(Debug, Default)]
pub struct Metrics {
    // Actor health
    pub messages_sent: AtomicU64,
    pub messages_received: AtomicU64,

    // Outcomes
    pub commands_ok: AtomicU64,
    pub commands_failed: AtomicU64,

    // Session lifecycle
    pub sessions_created: AtomicU64,
    pub sessions_deleted: AtomicU64,
    pub sessions_swept: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_outcome(&self, ok: bool) {
        if ok {
            self.commands_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.commands_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn inc_sessions_created(&self) {
        self.sessions_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_sessions_deleted(&self) {
        self.sessions_deleted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_sessions_swept(&self, n: u64) {
        self.sessions_swept.fetch_add(n, Ordering::Relaxed);
    }

    // Readers
    pub fn get_commands_ok(&self) -> u64 {
        self.commands_ok.load(Ordering::Relaxed)
    }

    pub fn get_commands_failed(&self) -> u64 {
        self.commands_failed.load(Ordering::Relaxed)
    }

    pub fn get_sessions_created(&self) -> u64 {
        self.sessions_created.load(Ordering::Relaxed)
    }

    pub fn get_sessions_deleted(&self) -> u64 {
        self.sessions_deleted.load(Ordering::Relaxed)
    }

    pub fn get_sessions_swept(&self) -> u64 {
        self.sessions_swept.load(Ordering::Relaxed)
    }

    pub fn get_message_queue_depth(&self) -> i64 {
        let sent = self.messages_sent.load(Ordering::Relaxed) as i64;
        let received = self.messages_received.load(Ordering::Relaxed) as i64;
        sent - received
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_depth() {
        let m = Metrics::new();
        m.inc_message_sent();
        m.inc_message_sent();
        m.inc_message_received();
        assert_eq!(m.get_message_queue_depth(), 1);
    }

    #[test]
    fn test_outcomes() {
        let m = Metrics::new();
        m.record_outcome(true);
        m.record_outcome(false);
        m.record_outcome(false);
        assert_eq!(m.get_commands_ok(), 1);
        assert_eq!(m.get_commands_failed(), 2);
    }

    #[test]
    fn test_session_lifecycle_counters() {
        let m = Metrics::new();
        m.inc_sessions_created();
        m.inc_sessions_created();
        m.inc_sessions_deleted();
        m.add_sessions_swept(3);
        assert_eq!(m.get_sessions_created(), 2);
        assert_eq!(m.get_sessions_deleted(), 1);
        assert_eq!(m.get_sessions_swept(), 3);
    }
}
