use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use sitedesk_db::models::Material;

use super::base::{BaseDao, DaoError, DaoResult};

pub struct MaterialDao {
    pub base: BaseDao<Material>,
}

impl MaterialDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Material::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        project_id: ObjectId,
        name: String,
        quantity: f64,
        unit: String,
    ) -> DaoResult<Material> {
        let now = DateTime::now();
        let material = Material {
            id: None,
            project_id,
            name,
            quantity,
            unit,
            created_at: now,
            updated_at: now,
        };
        let id = self.base.insert_one(&material).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_in_project(
        &self,
        material_id: ObjectId,
        project_id: ObjectId,
    ) -> DaoResult<Material> {
        self.base
            .find_one(doc! { "_id": material_id, "project_id": project_id })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn list_for_project(&self, project_id: ObjectId) -> DaoResult<Vec<Material>> {
        self.base
            .find_many(
                doc! { "project_id": project_id },
                Some(doc! { "name": 1 }),
                None,
            )
            .await
    }

    pub async fn update_quantity(&self, material_id: ObjectId, quantity: f64) -> DaoResult<bool> {
        self.base
            .update_by_id(material_id, doc! { "$set": { "quantity": quantity } })
            .await
    }

    pub async fn delete(&self, material_id: ObjectId) -> DaoResult<u64> {
        self.base.hard_delete(doc! { "_id": material_id }).await
    }
}
