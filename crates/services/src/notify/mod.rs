pub mod directory;
pub mod dispatcher;
pub mod event;
pub mod names;
pub mod recipient;
pub mod repo;
pub mod store;

pub use directory::{Directory, MongoDirectory};
pub use dispatcher::{
    AccountAction, ChangeAction, DispatchError, LedgerEvent, NotificationDispatcher,
    ProjectChange,
};
pub use event::{ChangeEvent, ChangeHub, Subscription};
pub use names::{FallbackStyle, NameResolver};
pub use recipient::RecipientResolver;
pub use repo::{MongoNotificationRepo, NotificationRepo};
pub use store::{NotificationFeed, NotificationStore};
