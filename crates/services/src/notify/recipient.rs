use std::sync::Arc;

use bson::oid::ObjectId;

use super::directory::Directory;
use crate::dao::base::DaoResult;

/// Maps a project to the admin responsible for it, the sole addressee of
/// that project's notifications.
pub struct RecipientResolver {
    directory: Arc<dyn Directory>,
}

impl RecipientResolver {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    /// `None` means "cannot notify": a missing project and an ownerless
    /// project are treated alike. Store errors do surface.
    pub async fn resolve(&self, project_id: ObjectId) -> DaoResult<Option<ObjectId>> {
        Ok(self
            .directory
            .project_by_id(project_id)
            .await?
            .and_then(|project| project.admin_id))
    }
}
