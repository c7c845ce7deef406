use bson::{DateTime, doc};
use mongodb::Database;
use sitedesk_db::models::Profile;

use super::base::{BaseDao, DaoResult};

pub struct ProfileDao {
    pub base: BaseDao<Profile>,
}

impl ProfileDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Profile::COLLECTION),
        }
    }

    pub async fn upsert(
        &self,
        auth_id: String,
        full_name: Option<String>,
        email: Option<String>,
    ) -> DaoResult<Profile> {
        let profile = Profile {
            id: auth_id,
            full_name,
            email,
            created_at: DateTime::now(),
        };
        // Profiles are keyed by the auth id, so re-registration replaces
        // the previous record.
        self.base
            .collection()
            .replace_one(doc! { "_id": &profile.id }, &profile)
            .upsert(true)
            .await?;
        Ok(profile)
    }

    pub async fn find(&self, auth_id: &str) -> DaoResult<Option<Profile>> {
        self.base.find_one(doc! { "_id": auth_id }).await
    }
}
