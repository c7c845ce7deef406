use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

/// Admin-managed user record. The same logical person may also exist as
/// a self-registration [`super::Profile`] keyed by the auth identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    /// Display name; optional because admin-created records may only
    /// carry an email until the user completes their profile.
    pub name: Option<String>,
    /// Identifier of the linked external auth account, if any.
    pub auth_id: Option<String>,
    pub role: UserRole,
    pub password_hash: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Member,
}

impl User {
    pub const COLLECTION: &'static str = "users";
}
