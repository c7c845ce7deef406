use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use sitedesk_db::models::{User, UserRole};

use super::base::{BaseDao, DaoError, DaoResult};

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        email: String,
        name: Option<String>,
        role: UserRole,
        password_hash: String,
    ) -> DaoResult<User> {
        let now = DateTime::now();
        let user = User {
            id: None,
            email,
            name,
            auth_id: None,
            role,
            password_hash: Some(password_hash),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn find_by_email(&self, email: &str) -> DaoResult<User> {
        self.base
            .find_one(doc! { "email": email, "deleted_at": null })
            .await?
            .ok_or(DaoError::NotFound)
    }

    pub async fn list_admins(&self) -> DaoResult<Vec<User>> {
        self.base
            .find_many(
                doc! { "role": "admin", "deleted_at": null },
                Some(doc! { "created_at": 1 }),
                None,
            )
            .await
    }

    pub async fn find_by_auth_id(&self, auth_id: &str) -> DaoResult<Option<User>> {
        self.base
            .find_one(doc! { "auth_id": auth_id, "deleted_at": null })
            .await
    }

    pub async fn link_auth_id(&self, user_id: ObjectId, auth_id: &str) -> DaoResult<bool> {
        self.base
            .update_by_id(user_id, doc! { "$set": { "auth_id": auth_id } })
            .await
    }

    pub async fn update_name(&self, user_id: ObjectId, name: String) -> DaoResult<bool> {
        self.base
            .update_by_id(user_id, doc! { "$set": { "name": name } })
            .await
    }
}
