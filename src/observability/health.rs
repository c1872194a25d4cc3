/// Health checks for the session and record stores
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::{RecordStore, SessionStore, StoreError};

/// Overall health status
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub checks: Vec<HealthCheck>,
}

/// Individual health check result
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    /// Entries held by the store, when it answered
    pub count: Option<usize>,
    pub message: Option<String>,
    pub duration_ms: f64,
}

impl HealthCheck {
    fn from_count(name: &str, res: Result<usize, StoreError>, start: std::time::Instant) -> Self {
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        match res {
            Ok(count) => HealthCheck {
                name: name.to_string(),
                status: "healthy".to_string(),
                count: Some(count),
                message: None,
                duration_ms,
            },
            Err(e) => HealthCheck {
                name: name.to_string(),
                status: "unhealthy".to_string(),
                count: None,
                message: Some(format!("{} store check failed: {}", name, e)),
                duration_ms,
            },
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Check the session store owner is answering
pub async fn check_session_health(sessions: &Arc<dyn SessionStore>) -> HealthCheck {
    let start = std::time::Instant::now();
    HealthCheck::from_count("sessions", sessions.count().await, start)
}

/// Check the record store owner is answering
pub async fn check_record_health(records: &Arc<dyn RecordStore>) -> HealthCheck {
    let start = std::time::Instant::now();
    HealthCheck::from_count("records", records.count().await, start)
}

/// Get overall health status by checking both stores
pub async fn get_health_status(
    sessions: &Arc<dyn SessionStore>,
    records: &Arc<dyn RecordStore>,
) -> HealthStatus {
    let checks = vec![
        check_session_health(sessions).await,
        check_record_health(records).await,
    ];

    let all_healthy = checks.iter().all(HealthCheck::is_healthy);

    HealthStatus {
        status: if all_healthy {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
        checks,
    }
}
