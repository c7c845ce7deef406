use bson::oid::ObjectId;
use dashmap::DashMap;
use sitedesk_db::models::Notification;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::RecvError;

const CHANNEL_CAPACITY: usize = 256;

/// A row-level change event, carrying the post-change row.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    Inserted(Notification),
    Updated(Notification),
}

impl ChangeEvent {
    pub fn row(&self) -> &Notification {
        match self {
            Self::Inserted(row) | Self::Updated(row) => row,
        }
    }
}

/// In-process fan-out of notification change events, keyed by recipient.
/// Each recipient can have multiple live subscribers (multiple tabs or
/// devices); within one recipient's stream events are delivered in
/// commit order because publishers send after the store write returns.
pub struct ChangeHub {
    channels: DashMap<ObjectId, broadcast::Sender<ChangeEvent>>,
}

impl ChangeHub {
    pub fn new() -> Self {
        Self {
            channels: DashMap::new(),
        }
    }

    pub fn subscribe(&self, recipient_id: ObjectId) -> Subscription {
        let rx = self
            .channels
            .entry(recipient_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();
        Subscription { recipient_id, rx }
    }

    pub fn publish(&self, recipient_id: ObjectId, event: ChangeEvent) {
        let dead = match self.channels.get(&recipient_id) {
            Some(tx) => tx.send(event).is_err(),
            None => return,
        };
        if dead {
            // Last subscriber went away; prune the channel.
            self.channels
                .remove_if(&recipient_id, |_, tx| tx.receiver_count() == 0);
        }
    }

    pub fn subscriber_count(&self, recipient_id: &ObjectId) -> usize {
        self.channels
            .get(recipient_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

/// A live change-event stream scoped to one recipient. Dropping the
/// guard ends the stream, so subscription lifetime is bound to whoever
/// owns it and released on every exit path.
pub struct Subscription {
    recipient_id: ObjectId,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn recipient_id(&self) -> ObjectId {
        self.recipient_id
    }

    pub async fn recv(&mut self) -> Result<ChangeEvent, RecvError> {
        self.rx.recv().await
    }
}
