use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use mongodb::Database;
use sitedesk_db::models::{Profile, Project, User};

use crate::dao::base::{BaseDao, DaoResult};

/// Read-only lookup sources used to resolve actors and projects.
/// A seam so the pipeline never assumes a storage engine and tests can
/// substitute in-memory fakes.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn user_by_auth_id(&self, auth_id: &str) -> DaoResult<Option<User>>;
    async fn user_by_id(&self, id: ObjectId) -> DaoResult<Option<User>>;
    async fn profile_by_auth_id(&self, auth_id: &str) -> DaoResult<Option<Profile>>;
    async fn project_by_id(&self, id: ObjectId) -> DaoResult<Option<Project>>;
}

pub struct MongoDirectory {
    users: BaseDao<User>,
    profiles: BaseDao<Profile>,
    projects: BaseDao<Project>,
}

impl MongoDirectory {
    pub fn new(db: &Database) -> Self {
        Self {
            users: BaseDao::new(db, User::COLLECTION),
            profiles: BaseDao::new(db, Profile::COLLECTION),
            projects: BaseDao::new(db, Project::COLLECTION),
        }
    }
}

#[async_trait]
impl Directory for MongoDirectory {
    async fn user_by_auth_id(&self, auth_id: &str) -> DaoResult<Option<User>> {
        self.users
            .find_one(doc! { "auth_id": auth_id, "deleted_at": null })
            .await
    }

    async fn user_by_id(&self, id: ObjectId) -> DaoResult<Option<User>> {
        self.users
            .find_one(doc! { "_id": id, "deleted_at": null })
            .await
    }

    async fn profile_by_auth_id(&self, auth_id: &str) -> DaoResult<Option<Profile>> {
        self.profiles.find_one(doc! { "_id": auth_id }).await
    }

    async fn project_by_id(&self, id: ObjectId) -> DaoResult<Option<Project>> {
        self.projects
            .find_one(doc! { "_id": id, "deleted_at": null })
            .await
    }
}
