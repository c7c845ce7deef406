
use std::sync::Arc;

use bson::{DateTime, doc, oid::ObjectId};
use sitedesk_db::models::{
    Expense, LedgerEntry, Notification, NotificationKind, Profile, Project, User, UserRole,
};
use sitedesk_services::notify::{
    Directory, FallbackStyle, NameResolver, NotificationDispatcher, RecipientResolver,
};

use self::memory::{MemoryDirectory, MemoryRepo};

pub fn user(id: ObjectId, name: &str, auth_id: Option<&str>, role: UserRole) -> User {
    let now = DateTime::now();
    User {
        id: Some(id),
        email: format!("{}@test.com", name.to_lowercase().replace(' ', ".")),
        name: Some(name.to_string()),
        auth_id: auth_id.map(|s| s.to_string()),
        role,
        password_hash: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

pub fn profile(auth_id: &str, full_name: &str) -> Profile {
    Profile {
        id: auth_id.to_string(),
        full_name: Some(full_name.to_string()),
        email: None,
        created_at: DateTime::now(),
    }
}

pub fn project(id: ObjectId, name: &str, admin_id: Option<ObjectId>) -> Project {
    let now = DateTime::now();
    Project {
        id: Some(id),
        name: name.to_string(),
        admin_id,
        address: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

pub fn expense(project_id: ObjectId, amount: f64) -> Expense {
    let now = DateTime::now();
    Expense {
        id: Some(ObjectId::new()),
        project_id,
        entry: LedgerEntry::Expense,
        amount,
        category: "Cement".to_string(),
        note: None,
        created_by: "auth0|uri".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn notification(recipient_id: ObjectId, created_ms: i64, is_read: bool) -> Notification {
    Notification {
        id: Some(ObjectId::new()),
        recipient_id,
        actor_id: "auth0|actor".to_string(),
        subject_id: None,
        kind: NotificationKind::ExpenseAdded,
        title: NotificationKind::ExpenseAdded.title().to_string(),
        message: "someone added an expense".to_string(),
        payload: doc! {},
        is_read,
        created_at: DateTime::from_millis(created_ms),
        updated_at: DateTime::from_millis(created_ms),
    }
}

pub fn dispatcher(
    repo: Arc<MemoryRepo>,
    directory: Arc<MemoryDirectory>,
    fallback: FallbackStyle,
) -> NotificationDispatcher {
    let directory: Arc<dyn Directory> = directory;
    NotificationDispatcher::new(
        repo,
        NameResolver::new(directory.clone(), fallback),
        RecipientResolver::new(directory),
    )
}
