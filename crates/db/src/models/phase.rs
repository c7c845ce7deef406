use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub name: String,
    pub starts_on: Option<DateTime>,
    pub ends_on: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Phase {
    pub const COLLECTION: &'static str = "phases";
}
