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

/// Prometheus metrics definitions for gatehouse
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram_vec, Counter,
    CounterVec, Gauge, HistogramVec, TextEncoder,
};

lazy_static! {
    // ============================================================================
    // HTTP Metrics
    // ============================================================================

    /// HTTP request duration in seconds
    pub static ref HTTP_REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "endpoint", "status"],
        vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0]
    ).unwrap();

    /// HTTP request count
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "endpoint", "status"]
    ).unwrap();

    // ============================================================================
    // Authentication Metrics
    // ============================================================================

    /// Login and page-access checks by outcome
    pub static ref AUTH_TOTAL: CounterVec = register_counter_vec!(
        "auth_total",
        "Total authentication attempts",
        &["result", "auth_type"]
    ).unwrap();

    // ============================================================================
    // Store Metrics
    // ============================================================================

    /// Time spent by an actor handling one command
    pub static ref STORE_COMMAND_DURATION: HistogramVec = register_histogram_vec!(
        "store_command_duration_seconds",
        "Store command handling duration in seconds",
        &["store", "operation"],
        vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.010, 0.050, 0.100]
    ).unwrap();

    /// Store commands by outcome
    pub static ref STORE_COMMANDS_TOTAL: CounterVec = register_counter_vec!(
        "store_commands_total",
        "Total store commands handled",
        &["store", "operation", "result"]
    ).unwrap();

    /// Sessions currently held (alive or awaiting sweep)
    pub static ref SESSIONS_ACTIVE: Gauge = register_gauge!(
        "sessions_active",
        "Sessions currently held in memory"
    ).unwrap();

    /// Sessions removed by the expiry sweeper
    pub static ref SESSIONS_SWEPT_TOTAL: Counter = register_counter!(
        "sessions_swept_total",
        "Total expired sessions removed by the sweeper"
    ).unwrap();
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Record one handled store command
pub fn record_store_command(store: &str, operation: &str, result: &str, duration: f64) {
    STORE_COMMAND_DURATION
        .with_label_values(&[store, operation])
        .observe(duration);
    STORE_COMMANDS_TOTAL
        .with_label_values(&[store, operation, result])
        .inc();
}

/// Set the number of sessions held
pub fn set_sessions_active(count: usize) {
    SESSIONS_ACTIVE.set(count as f64);
}

/// Add to the swept sessions counter
pub fn increment_sessions_swept(count: usize) {
    SESSIONS_SWEPT_TOTAL.inc_by(count as f64);
}

/// Increment successful authentication counter
pub fn increment_auth_success(auth_type: &str) {
    AUTH_TOTAL
        .with_label_values(&["success", auth_type])
        .inc();
}

/// Increment failed authentication counter
pub fn increment_auth_failure(auth_type: &str) {
    AUTH_TOTAL
        .with_label_values(&["failure", auth_type])
        .inc();
}

/// Increment HTTP request counter
pub fn increment_http_request(method: &str, endpoint: &str, status: &str) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, status])
        .inc();
}

/// Record HTTP request duration
pub fn record_http_duration(method: &str, endpoint: &str, status: &str, duration: f64) {
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, endpoint, status])
        .observe(duration);
}

/// Gather all metrics for Prometheus exposition
pub fn gather_metrics() -> Vec<u8> {
    use prometheus::Encoder;
    let encoder = TextEncoder::new();
    // Use the default registry since our metrics are registered there
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("failed to encode metrics: {}", e);
    }
    buffer
}
