use std::sync::Arc;

use bson::oid::ObjectId;
use parking_lot::Mutex;
use serde::Serialize;
use sitedesk_db::models::{Notification, UserRole};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::event::{ChangeEvent, RecvError, Subscription};
use super::repo::NotificationRepo;
use crate::dao::base::DaoResult;

/// Snapshot consumed by the presentation layer. `unread_count` is always
/// recomputed from the records, never stored independently.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread_count: usize,
    pub is_loading: bool,
}

#[derive(Default)]
struct FeedState {
    /// Bumped on every activation and deactivation; stale consumer tasks
    /// and in-flight fetches check it before touching the list.
    epoch: u64,
    recipient_id: Option<ObjectId>,
    items: Vec<Notification>,
    is_loading: bool,
}

impl FeedState {
    /// Realtime delivery may duplicate an insert; merge by id.
    fn apply_insert(&mut self, row: Notification, window: usize) -> bool {
        if row.id.is_some() && self.items.iter().any(|n| n.id == row.id) {
            return false;
        }
        self.items.push(row);
        self.sort_and_truncate(window);
        true
    }

    fn apply_update(&mut self, row: Notification, window: usize) -> bool {
        if let Some(slot) = self
            .items
            .iter_mut()
            .find(|n| n.id.is_some() && n.id == row.id)
        {
            *slot = row;
        } else {
            // An update for a row the bulk fetch has not delivered yet;
            // never drop it.
            self.items.push(row);
        }
        self.sort_and_truncate(window);
        true
    }

    fn sort_and_truncate(&mut self, window: usize) {
        self.items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        self.items.truncate(window);
    }

    fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.is_read).count()
    }
}

struct Session {
    task: JoinHandle<()>,
}

/// Live, ordered, deduplicated view of one recipient's most recent
/// notifications, kept synchronized with the persistent store by an
/// eager bulk fetch plus a per-recipient change-event subscription.
pub struct NotificationStore {
    repo: Arc<dyn NotificationRepo>,
    window: usize,
    state: Arc<Mutex<FeedState>>,
    session: Mutex<Option<Session>>,
    changed: watch::Sender<u64>,
}

impl NotificationStore {
    pub fn new(repo: Arc<dyn NotificationRepo>, window: usize) -> Self {
        let (changed, _) = watch::channel(0);
        Self {
            repo,
            window,
            state: Arc::new(Mutex::new(FeedState::default())),
            session: Mutex::new(None),
            changed,
        }
    }

    /// Starts a live session for `recipient_id`. Only the admin role
    /// receives notifications; any other role is a logged no-op. A
    /// previous session is always torn down first, so the store never
    /// holds two live subscriptions.
    ///
    /// The subscription opens before the bulk fetch so events that race
    /// the fetch are merged instead of lost; fetched rows merge by id
    /// into whatever the consumer already applied.
    pub async fn activate(&self, recipient_id: ObjectId, role: UserRole) -> DaoResult<()> {
        if role != UserRole::Admin {
            debug!(%recipient_id, "Ignoring notification store activation for non-admin session");
            return Ok(());
        }

        self.deactivate();

        let epoch = {
            let mut state = self.state.lock();
            state.epoch += 1;
            state.recipient_id = Some(recipient_id);
            state.items.clear();
            state.is_loading = true;
            state.epoch
        };
        self.notify_changed();

        let subscription = self.repo.subscribe(recipient_id);
        let task = tokio::spawn(consume_events(
            subscription,
            self.repo.clone(),
            self.state.clone(),
            self.window,
            epoch,
            self.changed.clone(),
        ));
        *self.session.lock() = Some(Session { task });

        let fetched = self
            .repo
            .recent_for_recipient(recipient_id, self.window as i64)
            .await;

        let result = {
            let mut state = self.state.lock();
            if state.epoch != epoch {
                // Re-activated while the fetch was in flight.
                return Ok(());
            }
            state.is_loading = false;
            match fetched {
                Ok(rows) => {
                    for row in rows {
                        state.apply_insert(row, self.window);
                    }
                    Ok(())
                }
                Err(e) => Err(e),
            }
        };
        self.notify_changed();

        if let Err(e) = &result {
            warn!(%recipient_id, %e, "Initial notification fetch failed");
        }
        result
    }

    /// Tears down the live session: the consumer task is aborted, which
    /// drops the subscription guard with it, so no event for the previous
    /// recipient can land after this returns.
    pub fn deactivate(&self) {
        if let Some(session) = self.session.lock().take() {
            session.task.abort();
        }
        let mut state = self.state.lock();
        if state.recipient_id.take().is_some() {
            state.epoch += 1;
            state.items.clear();
            state.is_loading = false;
            drop(state);
            self.notify_changed();
        }
    }

    /// Optimistic: local state flips first and is not rolled back if the
    /// server write fails; the echoed update event or the next resync
    /// reconciles. Marking an already-read notification is a no-op.
    pub async fn mark_as_read(&self, id: ObjectId) -> DaoResult<()> {
        let recipient_id = {
            let mut state = self.state.lock();
            let Some(recipient_id) = state.recipient_id else {
                return Ok(());
            };
            if let Some(item) = state.items.iter_mut().find(|n| n.id == Some(id)) {
                if item.is_read {
                    return Ok(());
                }
                item.is_read = true;
            }
            recipient_id
        };
        self.notify_changed();

        if let Err(e) = self.repo.mark_read(recipient_id, id).await {
            warn!(%id, %e, "mark-as-read write failed; keeping optimistic local state");
            return Err(e);
        }
        Ok(())
    }

    pub async fn mark_all_as_read(&self) -> DaoResult<()> {
        let recipient_id = {
            let mut state = self.state.lock();
            let Some(recipient_id) = state.recipient_id else {
                return Ok(());
            };
            for item in state.items.iter_mut() {
                item.is_read = true;
            }
            recipient_id
        };
        self.notify_changed();

        if let Err(e) = self.repo.mark_all_read(recipient_id).await {
            warn!(%recipient_id, %e, "mark-all-as-read write failed; keeping optimistic local state");
            return Err(e);
        }
        Ok(())
    }

    /// Manual refetch: replaces local state with the store's current
    /// window for the active recipient.
    pub async fn fetch(&self) -> DaoResult<()> {
        let (recipient_id, epoch) = {
            let state = self.state.lock();
            (state.recipient_id, state.epoch)
        };
        let Some(recipient_id) = recipient_id else {
            return Ok(());
        };

        let rows = self
            .repo
            .recent_for_recipient(recipient_id, self.window as i64)
            .await?;

        let mut state = self.state.lock();
        if state.epoch == epoch {
            state.items = rows;
            state.sort_and_truncate(self.window);
            drop(state);
            self.notify_changed();
        }
        Ok(())
    }

    pub fn feed(&self) -> NotificationFeed {
        let state = self.state.lock();
        NotificationFeed {
            notifications: state.items.clone(),
            unread_count: state.unread_count(),
            is_loading: state.is_loading,
        }
    }

    pub fn unread_count(&self) -> usize {
        self.state.lock().unread_count()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }

    pub fn active_recipient(&self) -> Option<ObjectId> {
        self.state.lock().recipient_id
    }

    /// Change signal for reactive consumers: the value bumps whenever the
    /// feed snapshot may have changed.
    pub fn watch_changes(&self) -> watch::Receiver<u64> {
        self.changed.subscribe()
    }

    fn notify_changed(&self) {
        self.changed.send_modify(|v| *v += 1);
    }
}

impl Drop for NotificationStore {
    fn drop(&mut self) {
        if let Some(session) = self.session.lock().take() {
            session.task.abort();
        }
    }
}

async fn consume_events(
    mut subscription: Subscription,
    repo: Arc<dyn NotificationRepo>,
    state: Arc<Mutex<FeedState>>,
    window: usize,
    epoch: u64,
    changed: watch::Sender<u64>,
) {
    let recipient_id = subscription.recipient_id();
    loop {
        match subscription.recv().await {
            Ok(event) => {
                let applied = {
                    let mut guard = state.lock();
                    if guard.epoch != epoch {
                        break;
                    }
                    match event {
                        ChangeEvent::Inserted(row) => guard.apply_insert(row, window),
                        ChangeEvent::Updated(row) => guard.apply_update(row, window),
                    }
                };
                if applied {
                    changed.send_modify(|v| *v += 1);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                // A gap in events leaves the local window stale; a fresh
                // bulk fetch fully resynchronizes.
                warn!(%recipient_id, skipped, "Notification stream lagged; resynchronizing");
                match repo.recent_for_recipient(recipient_id, window as i64).await {
                    Ok(rows) => {
                        let mut guard = state.lock();
                        if guard.epoch != epoch {
                            break;
                        }
                        guard.items = rows;
                        guard.sort_and_truncate(window);
                        drop(guard);
                        changed.send_modify(|v| *v += 1);
                    }
                    Err(e) => warn!(%recipient_id, %e, "Resync fetch failed"),
                }
            }
            Err(RecvError::Closed) => break,
        }
    }
}
