use std::sync::Arc;
use std::time::Duration;

use bson::oid::ObjectId;
use sitedesk_db::models::{NotificationKind, UserRole};
use sitedesk_services::notify::{ChangeEvent, NotificationRepo, NotificationStore};
use tokio::time::{sleep, timeout};

use crate::fixtures::{self, memory::MemoryRepo};

const WINDOW: usize = 50;

fn store_with(repo: &Arc<MemoryRepo>, window: usize) -> NotificationStore {
    let repo: Arc<MemoryRepo> = repo.clone();
    NotificationStore::new(repo, window)
}

/// Blocks until the store signals a change or the deadline passes.
async fn wait_for_change(store: &NotificationStore) {
    let mut changes = store.watch_changes();
    let _ = timeout(Duration::from_secs(1), changes.changed()).await;
}

#[tokio::test]
async fn activation_loads_the_recent_window() {
    let admin_id = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());
    repo.seed(vec![
        fixtures::notification(admin_id, 1_000, true),
        fixtures::notification(admin_id, 2_000, false),
        fixtures::notification(admin_id, 3_000, false),
        // Another recipient's row never leaks in.
        fixtures::notification(ObjectId::new(), 4_000, false),
    ]);

    let store = store_with(&repo, WINDOW);
    store.activate(admin_id, UserRole::Admin).await.unwrap();

    let feed = store.feed();
    assert_eq!(feed.notifications.len(), 3);
    assert_eq!(feed.unread_count, 2);
    assert!(!feed.is_loading);
    let times: Vec<i64> = feed
        .notifications
        .iter()
        .map(|n| n.created_at.timestamp_millis())
        .collect();
    assert_eq!(times, vec![3_000, 2_000, 1_000]);
    assert_eq!(store.active_recipient(), Some(admin_id));
}

#[tokio::test]
async fn non_admin_activation_is_a_noop() {
    let user_id = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());
    repo.seed(vec![fixtures::notification(user_id, 1_000, false)]);

    let store = store_with(&repo, WINDOW);
    store.activate(user_id, UserRole::Member).await.unwrap();

    assert_eq!(store.active_recipient(), None);
    assert!(store.feed().notifications.is_empty());
    assert_eq!(repo.hub().subscriber_count(&user_id), 0);
}

#[tokio::test]
async fn insert_racing_the_initial_fetch_is_merged() {
    let admin_id = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());
    repo.seed(vec![
        fixtures::notification(admin_id, 1_000, false),
        fixtures::notification(admin_id, 2_000, false),
        fixtures::notification(admin_id, 3_000, false),
    ]);
    let gate = repo.gate_fetches();

    let store = Arc::new(store_with(&repo, WINDOW));
    let activation = {
        let store = store.clone();
        tokio::spawn(async move { store.activate(admin_id, UserRole::Admin).await })
    };

    // Let activation subscribe and park inside the gated fetch.
    sleep(Duration::from_millis(20)).await;
    assert_eq!(repo.hub().subscriber_count(&admin_id), 1);

    // A write lands while the bulk fetch is still in flight. The event
    // reaches the consumer now; the row is also in the fetch result.
    let racing = fixtures::notification(admin_id, 4_000, false);
    repo.insert(racing.clone()).await.unwrap();
    sleep(Duration::from_millis(20)).await;

    gate.notify_one();
    activation.await.unwrap().unwrap();

    let feed = store.feed();
    assert_eq!(feed.notifications.len(), 4);
    assert_eq!(feed.notifications[0].id, racing.id);
    let ids: Vec<_> = feed.notifications.iter().map(|n| n.id).collect();
    let mut deduped = ids.clone();
    deduped.dedup();
    assert_eq!(ids, deduped);
}

#[tokio::test]
async fn live_insert_updates_the_feed() {
    let admin_id = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());

    let store = store_with(&repo, WINDOW);
    store.activate(admin_id, UserRole::Admin).await.unwrap();

    let mut changes = store.watch_changes();
    repo.insert(fixtures::notification(admin_id, 5_000, false))
        .await
        .unwrap();
    let _ = timeout(Duration::from_secs(1), changes.changed()).await;

    let feed = store.feed();
    assert_eq!(feed.notifications.len(), 1);
    assert_eq!(feed.unread_count, 1);
    store.deactivate();
}

#[tokio::test]
async fn duplicate_event_delivery_is_deduplicated() {
    let admin_id = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());

    let store = store_with(&repo, WINDOW);
    store.activate(admin_id, UserRole::Admin).await.unwrap();

    let row = fixtures::notification(admin_id, 5_000, false);
    repo.hub()
        .publish(admin_id, ChangeEvent::Inserted(row.clone()));
    repo.hub()
        .publish(admin_id, ChangeEvent::Inserted(row.clone()));
    wait_for_change(&store).await;
    sleep(Duration::from_millis(20)).await;

    assert_eq!(store.feed().notifications.len(), 1);
    store.deactivate();
}

#[tokio::test]
async fn update_for_an_unfetched_row_is_kept() {
    let admin_id = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());

    let store = store_with(&repo, WINDOW);
    store.activate(admin_id, UserRole::Admin).await.unwrap();

    let mut row = fixtures::notification(admin_id, 5_000, false);
    row.is_read = true;
    repo.hub().publish(admin_id, ChangeEvent::Updated(row));
    wait_for_change(&store).await;

    let feed = store.feed();
    assert_eq!(feed.notifications.len(), 1);
    assert_eq!(feed.unread_count, 0);
    store.deactivate();
}

#[tokio::test]
async fn window_is_enforced_on_live_inserts() {
    let admin_id = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());

    let store = store_with(&repo, 3);
    store.activate(admin_id, UserRole::Admin).await.unwrap();

    for i in 0..5 {
        repo.insert(fixtures::notification(admin_id, 1_000 + i, false))
            .await
            .unwrap();
    }
    sleep(Duration::from_millis(50)).await;

    let feed = store.feed();
    assert_eq!(feed.notifications.len(), 3);
    assert_eq!(feed.notifications[0].created_at.timestamp_millis(), 1_004);
    store.deactivate();
}

#[tokio::test]
async fn mark_as_read_is_optimistic_and_idempotent() {
    let admin_id = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());
    let row = fixtures::notification(admin_id, 1_000, false);
    let id = row.id.unwrap();
    repo.seed(vec![row]);

    let store = store_with(&repo, WINDOW);
    store.activate(admin_id, UserRole::Admin).await.unwrap();

    store.mark_as_read(id).await.unwrap();
    assert_eq!(store.unread_count(), 0);
    assert!(repo.stored()[0].is_read);

    // Second call is a no-op, locally and against the store.
    store.mark_as_read(id).await.unwrap();
    assert_eq!(store.unread_count(), 0);
    store.deactivate();
}

#[tokio::test]
async fn mark_as_read_failure_keeps_optimistic_state() {
    let admin_id = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());
    let row = fixtures::notification(admin_id, 1_000, false);
    let id = row.id.unwrap();
    repo.seed(vec![row]);

    let store = store_with(&repo, WINDOW);
    store.activate(admin_id, UserRole::Admin).await.unwrap();

    repo.set_fail_writes(true);
    assert!(store.mark_as_read(id).await.is_err());

    // Local state stays flipped; the persistent row does not.
    assert_eq!(store.unread_count(), 0);
    assert!(!repo.stored()[0].is_read);
    store.deactivate();
}

#[tokio::test]
async fn mark_all_as_read_clears_the_feed() {
    let admin_id = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());
    repo.seed(vec![
        fixtures::notification(admin_id, 1_000, false),
        fixtures::notification(admin_id, 2_000, false),
        fixtures::notification(admin_id, 3_000, true),
    ]);

    let store = store_with(&repo, WINDOW);
    store.activate(admin_id, UserRole::Admin).await.unwrap();

    store.mark_all_as_read().await.unwrap();
    assert_eq!(store.unread_count(), 0);
    assert!(repo.stored().iter().all(|n| n.is_read));
    store.deactivate();
}

#[tokio::test]
async fn mark_all_read_fans_out_the_committed_rows() {
    let admin_id = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());
    repo.seed(vec![
        fixtures::notification(admin_id, 1_000, false),
        fixtures::notification(admin_id, 2_000, false),
    ]);

    let mut subscription = repo.hub().subscribe(admin_id);
    let modified = repo.mark_all_read(admin_id).await.unwrap();
    assert_eq!(modified, 2);

    // Every fanned-out row matches what the store actually committed.
    let stored = repo.stored();
    for _ in 0..2 {
        let event = subscription.recv().await.unwrap();
        let row = event.row();
        assert!(row.is_read);
        let committed = stored.iter().find(|n| n.id == row.id).unwrap();
        assert!(committed.is_read);
        assert_eq!(committed.updated_at, row.updated_at);
    }
}

#[tokio::test]
async fn reactivation_tears_down_the_previous_session() {
    let first = ObjectId::new();
    let second = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());
    repo.seed(vec![fixtures::notification(second, 1_000, false)]);

    let store = store_with(&repo, WINDOW);
    store.activate(first, UserRole::Admin).await.unwrap();
    store.activate(second, UserRole::Admin).await.unwrap();
    sleep(Duration::from_millis(20)).await;

    // The first session's subscription died with its consumer task.
    assert_eq!(repo.hub().subscriber_count(&first), 0);
    assert_eq!(repo.hub().subscriber_count(&second), 1);

    // A write for the old recipient never reaches the feed.
    repo.insert(fixtures::notification(first, 9_000, false))
        .await
        .unwrap();
    sleep(Duration::from_millis(20)).await;

    let feed = store.feed();
    assert_eq!(store.active_recipient(), Some(second));
    assert_eq!(feed.notifications.len(), 1);
    assert_eq!(feed.notifications[0].recipient_id, second);
    store.deactivate();
}

#[tokio::test]
async fn deactivation_clears_state_and_subscription() {
    let admin_id = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());
    repo.seed(vec![fixtures::notification(admin_id, 1_000, false)]);

    let store = store_with(&repo, WINDOW);
    store.activate(admin_id, UserRole::Admin).await.unwrap();
    store.deactivate();
    sleep(Duration::from_millis(20)).await;

    assert_eq!(store.active_recipient(), None);
    assert!(store.feed().notifications.is_empty());
    assert_eq!(repo.hub().subscriber_count(&admin_id), 0);
}

#[tokio::test]
async fn manual_fetch_replaces_local_state() {
    let admin_id = ObjectId::new();
    let repo = Arc::new(MemoryRepo::new());

    let store = store_with(&repo, WINDOW);
    store.activate(admin_id, UserRole::Admin).await.unwrap();
    assert!(store.feed().notifications.is_empty());

    // Simulate rows that arrived without events, then refetch.
    repo.seed(vec![
        fixtures::notification(admin_id, 1_000, false),
        fixtures::notification(admin_id, 2_000, false),
    ]);
    store.fetch().await.unwrap();

    let feed = store.feed();
    assert_eq!(feed.notifications.len(), 2);
    assert_eq!(feed.notifications[0].kind, NotificationKind::ExpenseAdded);
    store.deactivate();
}
