use bson::{DateTime, Document, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// A delivered, attributable system event addressed to exactly one
/// recipient. Immutable after creation except for the read flag;
/// `title`/`message` are snapshots taken at creation time and are never
/// recomputed when names change upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub recipient_id: ObjectId,
    /// Raw identifier of the user whose action triggered the event.
    /// Kept opaque: it may be an external auth id or a user id in hex.
    pub actor_id: String,
    /// Project the event concerns; absent for account-level events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<ObjectId>,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Event-specific context (amount, category, resolved names, ...)
    /// stored untyped for forward compatibility.
    #[serde(default)]
    pub payload: Document,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ExpenseAdded,
    ExpenseUpdated,
    ExpenseDeleted,
    IncomeAdded,
    IncomeUpdated,
    IncomeDeleted,
    PhaseAdded,
    PhaseUpdated,
    PhaseDeleted,
    MaterialAdded,
    MaterialUpdated,
    MaterialDeleted,
    ProjectCreated,
    ProjectUpdated,
    UserJoined,
    UserUpdated,
}

impl NotificationKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::ExpenseAdded => "Expense Added",
            Self::ExpenseUpdated => "Expense Updated",
            Self::ExpenseDeleted => "Expense Deleted",
            Self::IncomeAdded => "Income Added",
            Self::IncomeUpdated => "Income Updated",
            Self::IncomeDeleted => "Income Deleted",
            Self::PhaseAdded => "Phase Added",
            Self::PhaseUpdated => "Phase Updated",
            Self::PhaseDeleted => "Phase Deleted",
            Self::MaterialAdded => "Material Added",
            Self::MaterialUpdated => "Material Updated",
            Self::MaterialDeleted => "Material Deleted",
            Self::ProjectCreated => "Project Created",
            Self::ProjectUpdated => "Project Updated",
            Self::UserJoined => "User Joined",
            Self::UserUpdated => "User Updated",
        }
    }
}

impl Notification {
    pub const COLLECTION: &'static str = "notifications";
}
