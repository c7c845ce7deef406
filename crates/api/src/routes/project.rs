use axum::{
    Json,
    extract::{Path, State},
};
use bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use sitedesk_db::models::{Project, UserRole};
use sitedesk_services::notify::ProjectChange;
use tracing::warn;
use validator::Validate;

use crate::{error::ApiError, extractors::auth::AuthUser, state::AppState};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub address: Option<String>,
    /// Owning admin; defaults to the creating user when they are an admin.
    pub admin_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: String,
    pub name: String,
    pub admin_id: Option<String>,
    pub address: Option<String>,
    pub created_at: String,
}

pub fn to_response(project: Project) -> ProjectResponse {
    ProjectResponse {
        id: project.id.map(|id| id.to_hex()).unwrap_or_default(),
        name: project.name,
        admin_id: project.admin_id.map(|id| id.to_hex()),
        address: project.address,
        created_at: project
            .created_at
            .try_to_rfc3339_string()
            .unwrap_or_default(),
    }
}

pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let projects = state.projects.list().await?;
    Ok(Json(projects.into_iter().map(to_response).collect()))
}

pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(project_id): Path<String>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let pid = parse_project_id(&project_id)?;
    let project = state.projects.base.find_by_id(pid).await?;
    Ok(Json(to_response(project)))
}

pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    body.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let admin_id = match body.admin_id {
        Some(ref id) => Some(
            ObjectId::parse_str(id)
                .map_err(|_| ApiError::BadRequest("Invalid admin_id".to_string()))?,
        ),
        None if auth.role == UserRole::Admin => Some(auth.user_id),
        None => None,
    };

    let project = state
        .projects
        .create(body.name, admin_id, body.address)
        .await?;

    if let Some(pid) = project.id {
        let actor_id = auth.user_id.to_hex();
        if let Err(e) = state
            .dispatcher
            .dispatch_project_event(&actor_id, pid, ProjectChange::Created, &[])
            .await
        {
            warn!(%pid, %e, "project-created notification failed");
        }
    }

    Ok(Json(to_response(project)))
}

pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(project_id): Path<String>,
    Json(body): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let pid = parse_project_id(&project_id)?;

    let mut changed_fields = Vec::new();
    if body.name.is_some() {
        changed_fields.push("name".to_string());
    }
    if body.address.is_some() {
        changed_fields.push("address".to_string());
    }

    state
        .projects
        .update_fields(pid, body.name, body.address)
        .await?;
    let project = state.projects.base.find_by_id(pid).await?;

    let actor_id = auth.user_id.to_hex();
    if let Err(e) = state
        .dispatcher
        .dispatch_project_event(&actor_id, pid, ProjectChange::Updated, &changed_fields)
        .await
    {
        warn!(%pid, %e, "project-updated notification failed");
    }

    Ok(Json(to_response(project)))
}

pub fn parse_project_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid project_id".to_string()))
}
