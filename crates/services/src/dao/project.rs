use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use sitedesk_db::models::Project;

use super::base::{BaseDao, DaoResult};

pub struct ProjectDao {
    pub base: BaseDao<Project>,
}

impl ProjectDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Project::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        name: String,
        admin_id: Option<ObjectId>,
        address: Option<String>,
    ) -> DaoResult<Project> {
        let now = DateTime::now();
        let project = Project {
            id: None,
            name,
            admin_id,
            address,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let id = self.base.insert_one(&project).await?;
        self.base.find_by_id(id).await
    }

    pub async fn list(&self) -> DaoResult<Vec<Project>> {
        self.base
            .find_many(
                doc! { "deleted_at": null },
                Some(doc! { "created_at": -1 }),
                None,
            )
            .await
    }

    pub async fn update_fields(
        &self,
        project_id: ObjectId,
        name: Option<String>,
        address: Option<String>,
    ) -> DaoResult<bool> {
        let mut update = bson::Document::new();
        if let Some(name) = name {
            update.insert("name", name);
        }
        if let Some(address) = address {
            update.insert("address", address);
        }
        if update.is_empty() {
            return Ok(false);
        }
        self.base
            .update_by_id(project_id, doc! { "$set": update })
            .await
    }
}
