use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use sitedesk_db::models::Phase;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct PhaseDao {
    pub base: BaseDao<Phase>,
}

impl PhaseDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Phase::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        project_id: ObjectId,
        name: String,
        starts_on: Option<DateTime>,
        ends_on: Option<DateTime>,
    ) -> DaoResult<Phase> {
        let now = DateTime::now();
        let phase = Phase {
            id: None,
            project_id,
            name,
            starts_on,
            ends_on,
            created_at: now,
            updated_at: now,
        };
        let id = self.base.insert_one(&phase).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_in_project(
        &self,
        phase_id: ObjectId,
        project_id: ObjectId,
    ) -> DaoResult<Phase> {
        self.base
            .find_one(doc! { "_id": phase_id, "project_id": project_id })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn list_for_project(&self, project_id: ObjectId) -> DaoResult<Vec<Phase>> {
        self.base
            .find_many(
                doc! { "project_id": project_id },
                Some(doc! { "starts_on": 1 }),
                None,
            )
            .await
    }

    pub async fn rename(&self, phase_id: ObjectId, name: String) -> DaoResult<bool> {
        self.base
            .update_by_id(phase_id, doc! { "$set": { "name": name } })
            .await
    }

    pub async fn delete(&self, phase_id: ObjectId) -> DaoResult<u64> {
        self.base.hard_delete(doc! { "_id": phase_id }).await
    }
}
