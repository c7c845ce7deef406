use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub project_id: ObjectId,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Material {
    pub const COLLECTION: &'static str = "materials";
}
