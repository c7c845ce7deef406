use std::sync::Arc;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use mongodb::Database;
use sitedesk_db::models::Notification;

use super::event::{ChangeEvent, ChangeHub, Subscription};
use crate::dao::base::{BaseDao, DaoResult};

/// Store-access capability for notification records. The dispatcher and
/// the live store consume only this interface; which implementation (and
/// which privilege level) gets injected is the caller's choice.
#[async_trait]
pub trait NotificationRepo: Send + Sync {
    async fn insert(&self, notification: Notification) -> DaoResult<Notification>;
    async fn recent_for_recipient(
        &self,
        recipient_id: ObjectId,
        limit: i64,
    ) -> DaoResult<Vec<Notification>>;
    async fn mark_read(&self, recipient_id: ObjectId, id: ObjectId) -> DaoResult<bool>;
    async fn mark_all_read(&self, recipient_id: ObjectId) -> DaoResult<u64>;
    fn subscribe(&self, recipient_id: ObjectId) -> Subscription;
}

pub struct MongoNotificationRepo {
    base: BaseDao<Notification>,
    hub: Arc<ChangeHub>,
}

impl MongoNotificationRepo {
    pub fn new(db: &Database, hub: Arc<ChangeHub>) -> Self {
        Self {
            base: BaseDao::new(db, Notification::COLLECTION),
            hub,
        }
    }

    pub fn hub(&self) -> &Arc<ChangeHub> {
        &self.hub
    }
}

#[async_trait]
impl NotificationRepo for MongoNotificationRepo {
    async fn insert(&self, mut notification: Notification) -> DaoResult<Notification> {
        // Assign the id up front so the committed row can be fanned out
        // without a readback.
        if notification.id.is_none() {
            notification.id = Some(ObjectId::new());
        }
        self.base.insert_one(&notification).await?;
        self.hub.publish(
            notification.recipient_id,
            ChangeEvent::Inserted(notification.clone()),
        );
        Ok(notification)
    }

    async fn recent_for_recipient(
        &self,
        recipient_id: ObjectId,
        limit: i64,
    ) -> DaoResult<Vec<Notification>> {
        self.base
            .find_many(
                doc! { "recipient_id": recipient_id },
                Some(doc! { "created_at": -1, "_id": -1 }),
                Some(limit),
            )
            .await
    }

    async fn mark_read(&self, recipient_id: ObjectId, id: ObjectId) -> DaoResult<bool> {
        // Row-scoped to the owner, filtered on the unread flag so the
        // false->true transition is idempotent.
        let modified = self
            .base
            .update_one(
                doc! { "_id": id, "recipient_id": recipient_id, "is_read": false },
                doc! { "$set": { "is_read": true } },
            )
            .await?;
        if modified {
            let row = self.base.find_by_id(id).await?;
            self.hub.publish(recipient_id, ChangeEvent::Updated(row));
        }
        Ok(modified)
    }

    async fn mark_all_read(&self, recipient_id: ObjectId) -> DaoResult<u64> {
        let unread = self
            .base
            .find_many(
                doc! { "recipient_id": recipient_id, "is_read": false },
                None,
                None,
            )
            .await?;
        let ids: Vec<ObjectId> = unread.into_iter().filter_map(|n| n.id).collect();
        if ids.is_empty() {
            return Ok(0);
        }

        // Update exactly the rows that will be fanned out; a row inserted
        // after the read stays unread until the next call.
        let modified = self
            .base
            .update_many(
                doc! { "_id": { "$in": ids.clone() }, "is_read": false },
                doc! { "$set": { "is_read": true } },
            )
            .await?;

        // Re-read so the published rows carry the committed state.
        let committed = self
            .base
            .find_many(doc! { "_id": { "$in": ids } }, None, None)
            .await?;
        for row in committed {
            self.hub.publish(recipient_id, ChangeEvent::Updated(row));
        }
        Ok(modified)
    }

    fn subscribe(&self, recipient_id: ObjectId) -> Subscription {
        self.hub.subscribe(recipient_id)
    }
}
