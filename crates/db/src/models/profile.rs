use bson::DateTime;
use serde::{Deserialize, Serialize};

/// Self-registration profile, keyed directly by the external auth
/// identifier. Last resort of the display-name fallback chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "_id")]
    pub id: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime,
}

impl Profile {
    pub const COLLECTION: &'static str = "profiles";
}
