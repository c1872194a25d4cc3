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

use gatehouse::config::SessionConfig;
use gatehouse::lifecycle::SessionService;
use gatehouse::store::{SessionId, StoreError};
use std::time::Duration;
use tokio::time::sleep;

/// 3 minute lifetime; the sweeper is kept out of the way unless a test asks for it.
fn config(sweep_interval_secs: u64) -> SessionConfig {
    SessionConfig {
        lifetime_secs: 180,
        sweep_interval_secs,
        stop_grace_ms: 1,
        ..SessionConfig::default()
    }
}

#[tokio::test(start_paused = true)]
async fn fresh_session_is_empty_with_token() {
    let service = SessionService::start(&config(3600));
    let store = service.store();

    let id = store.create().await.unwrap();
    let data = store.load_store(&id).await.unwrap();
    assert!(data.is_empty());
    assert!(!data.consistency_token.is_empty());

    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn create_save_load_delete() {
    let service = SessionService::start(&config(3600));
    let store = service.store();

    let id = store.create().await.unwrap();
    let mut data = store.load_store(&id).await.unwrap();
    data.insert("user_id", "bob");
    store.save_store(&id, data).await.unwrap();

    let data = store.load_store(&id).await.unwrap();
    assert_eq!(data.get("user_id"), Some("bob"));

    store.delete(&id).await.unwrap();
    assert_eq!(store.load_store(&id).await.unwrap_err(), StoreError::NotFound);
    assert_eq!(store.delete(&id).await.unwrap_err(), StoreError::NotFound);

    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn concurrent_saves_lose_to_first_writer() {
    let service = SessionService::start(&config(3600));
    let store = service.store();
    let id = store.create().await.unwrap();

    let mut first = store.load_store(&id).await.unwrap();
    let mut second = store.load_store(&id).await.unwrap();
    assert_eq!(first.consistency_token, second.consistency_token);

    first.insert("step", "1");
    store.save_store(&id, first).await.unwrap();

    second.insert("step", "2");
    assert_eq!(
        store.save_store(&id, second).await.unwrap_err(),
        StoreError::InvalidToken
    );

    let data = store.load_store(&id).await.unwrap();
    assert_eq!(data.get("step"), Some("1"));

    // The fresh token from the latest load is accepted
    store.save_store(&id, data).await.unwrap();

    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn save_extends_expiry() {
    let service = SessionService::start(&config(3600));
    let store = service.store();
    let id = store.create().await.unwrap();
    let data = store.load_store(&id).await.unwrap();

    sleep(Duration::from_secs(100)).await;
    store.save_store(&id, data).await.unwrap();

    // Past the expiry set at creation, inside the one set by the save
    sleep(Duration::from_secs(150)).await;
    assert!(store.load_store(&id).await.is_ok());

    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn load_slides_expiry() {
    let service = SessionService::start(&config(3600));
    let store = service.store();
    let id = store.create().await.unwrap();

    for _ in 0..5 {
        sleep(Duration::from_secs(120)).await;
        store.load_store(&id).await.unwrap();
    }

    sleep(Duration::from_secs(181)).await;
    assert_eq!(store.load_store(&id).await.unwrap_err(), StoreError::NotFound);

    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn expired_session_is_invisible_before_sweep() {
    let service = SessionService::start(&config(3600));
    let store = service.store();
    let id = store.create().await.unwrap();
    let data = store.load_store(&id).await.unwrap();

    sleep(Duration::from_secs(200)).await;

    assert_eq!(store.load_store(&id).await.unwrap_err(), StoreError::NotFound);
    assert_eq!(
        store.save_store(&id, data).await.unwrap_err(),
        StoreError::NotFound
    );
    assert_eq!(store.delete(&id).await.unwrap_err(), StoreError::NotFound);

    // Still held until a sweep runs
    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.delete_expired().await.unwrap(), 1);
    assert_eq!(store.count().await.unwrap(), 0);

    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn delete_expired_is_idempotent() {
    let service = SessionService::start(&config(3600));
    let store = service.store();
    store.create().await.unwrap();
    store.create().await.unwrap();

    sleep(Duration::from_secs(181)).await;
    let live = store.create().await.unwrap();

    assert_eq!(store.delete_expired().await.unwrap(), 2);
    assert_eq!(store.delete_expired().await.unwrap(), 0);
    assert_eq!(store.count().await.unwrap(), 1);
    assert!(store.load_store(&live).await.is_ok());

    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn sweeper_purges_only_expired() {
    let service = SessionService::start(&config(60));
    let store = service.store();

    let old = store.create().await.unwrap();
    sleep(Duration::from_secs(130)).await;
    let young = store.create().await.unwrap();

    // old expires at 180, swept at 240; young lives until 310
    sleep(Duration::from_secs(120)).await;

    assert_eq!(store.count().await.unwrap(), 1);
    assert_eq!(store.load_store(&old).await.unwrap_err(), StoreError::NotFound);
    assert!(store.load_store(&young).await.is_ok());

    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn lifecycle_counters_track_store_activity() {
    let service = SessionService::start(&config(3600));
    let store = service.store();
    let metrics = service.metrics();

    let kept = store.create().await.unwrap();
    let dropped = store.create().await.unwrap();
    store.delete(&dropped).await.unwrap();
    assert!(store.delete(&dropped).await.is_err());

    sleep(Duration::from_secs(181)).await;
    assert_eq!(store.delete_expired().await.unwrap(), 1);
    assert_eq!(store.load_store(&kept).await.unwrap_err(), StoreError::NotFound);

    assert_eq!(metrics.get_sessions_created(), 2);
    assert_eq!(metrics.get_sessions_deleted(), 1);
    assert_eq!(metrics.get_sessions_swept(), 1);

    service.stop().await;
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let service = SessionService::start(&config(3600));
    let store = service.store();

    let id = SessionId::from("no-such-session");
    assert_eq!(store.load_store(&id).await.unwrap_err(), StoreError::NotFound);

    service.stop().await;
}

#[tokio::test]
async fn stopped_store_reports_other() {
    let service = SessionService::start(&config(3600));
    let store = service.store();
    service.stop().await;

    assert!(matches!(store.create().await, Err(StoreError::Other(_))));
}
